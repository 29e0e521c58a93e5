//! Chat response stream implementation.
//!
//! This module provides [`ChatStream`], which implements [`futures::Stream`]
//! to yield [`ChatEvent`]s from a chat endpoint's SSE body.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::time::timeout as tokio_timeout;

use super::events::{ChatEvent, Completion};
use super::parser::{EventKind, FrameParser};
use crate::client::ensure_success;
use crate::config::ChatId;
use crate::{Error, Result};

const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// A stream of events from one chat response.
///
/// Yields `Ok(ChatEvent::Chunk)` items, then exactly one terminal item
/// (`Ok(ChatEvent::Complete)` or `Err(_)`), then ends. All network I/O and
/// parsing happen in a background task that owns the parser state.
///
/// # Cancellation
///
/// Dropping a `ChatStream` aborts the background task, which drops the
/// in-flight request, the response body and the startup timer.
///
/// # Example
///
/// ```ignore
/// use futures::StreamExt;
///
/// let mut stream = client.start_chat(&agent, "Hello").await?;
/// while let Some(event) = stream.next().await {
///     match event? {
///         ChatEvent::Chunk(text) => print!("{}", text),
///         ChatEvent::Complete(_) => break,
///     }
/// }
/// ```
pub struct ChatStream {
    rx: mpsc::Receiver<Result<ChatEvent>>,
    task_handle: Option<tokio::task::JoinHandle<()>>,
    chat_id: Option<ChatId>,
}

impl ChatStream {
    /// Start a stream from a pending HTTP request.
    ///
    /// `timeout` bounds the wait for the response headers and, for a failed
    /// status, the read of the error body.
    pub(crate) fn from_request<F>(request: F, timeout: Duration, capacity: usize) -> Self
    where
        F: Future<Output = reqwest::Result<reqwest::Response>> + Send + 'static,
    {
        Self::spawn(capacity, move |tx| async move {
            let response = with_timeout(timeout, async {
                ensure_success(request.await.map_err(Error::Network)?).await
            })
            .await?;
            tracing::debug!(status = %response.status(), "chat stream opened");
            Self::read_loop(response.bytes_stream(), &tx).await
        })
    }

    /// Create a stream from a raw SSE body.
    ///
    /// Useful for tests and for bodies obtained through another HTTP layer.
    /// Must be called within a tokio runtime.
    pub fn from_body<S, E>(body: S) -> Self
    where
        S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        Self::spawn(DEFAULT_CHANNEL_CAPACITY, move |tx| async move {
            Self::read_loop(body, &tx).await
        })
    }

    /// A stream that yields a single error. No task does any I/O.
    pub(crate) fn failed(error: Error) -> Self {
        Self::spawn(1, move |_tx| async move { Err(error) })
    }

    fn spawn<F, Fut>(capacity: usize, run: F) -> Self
    where
        F: FnOnce(mpsc::Sender<Result<ChatEvent>>) -> Fut,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(capacity);
        let work = run(tx.clone());

        let task_handle = tokio::spawn(async move {
            match work.await {
                Ok(()) => {}
                Err(Error::Cancelled) => {
                    tracing::trace!("chat stream receiver dropped");
                }
                Err(e) => {
                    tracing::debug!(error = %e, "chat stream failed");
                    // Receiver may be gone already
                    let _ = tx.send(Err(e)).await;
                }
            }
        });

        Self {
            rx,
            task_handle: Some(task_handle),
            chat_id: None,
        }
    }

    /// Background loop that pulls body chunks and sends events.
    ///
    /// Returns after the first terminal frame; frames after it are never
    /// looked at.
    async fn read_loop<S, E>(body: S, tx: &mpsc::Sender<Result<ChatEvent>>) -> Result<()>
    where
        S: Stream<Item = std::result::Result<Bytes, E>>,
        E: fmt::Display,
    {
        let mut body = std::pin::pin!(body);
        let mut parser = FrameParser::new();

        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| Error::StreamRead(e.to_string()))?;

            for frame in parser.feed(&chunk) {
                match frame.event {
                    EventKind::Message => {
                        if tx.send(Ok(ChatEvent::Chunk(frame.data))).await.is_err() {
                            return Err(Error::Cancelled);
                        }
                    }
                    EventKind::Done => {
                        let completion = Completion::parse(&frame.data);
                        if tx.send(Ok(ChatEvent::Complete(completion))).await.is_err() {
                            return Err(Error::Cancelled);
                        }
                        return Ok(());
                    }
                    EventKind::Error => {
                        return Err(Error::Server {
                            message: frame.data,
                        });
                    }
                    EventKind::Unset | EventKind::Other(_) => {
                        tracing::trace!(event = %frame.event, "ignoring data line");
                    }
                }
            }
        }

        let discarded = parser.finish();
        if discarded > 0 {
            tracing::debug!(bytes = discarded, "discarding unterminated trailing line");
        }
        Err(Error::StreamClosed)
    }

    /// The chat id from the completion payload, once it has been received.
    pub fn chat_id(&self) -> Option<&ChatId> {
        self.chat_id.as_ref()
    }

    /// Collect all text from the stream.
    ///
    /// Chunks are concatenated in order; the completion payload is dropped.
    pub async fn collect_text(self) -> Result<String> {
        Ok(self.collect_all().await?.text)
    }

    /// Collect the whole stream.
    ///
    /// Returns the concatenated text together with the completion.
    pub async fn collect_all(mut self) -> Result<CollectedResponse> {
        let mut text = String::new();
        let mut chunks = 0;

        while let Some(event) = self.next().await {
            match event? {
                ChatEvent::Chunk(t) => {
                    text.push_str(&t);
                    chunks += 1;
                }
                ChatEvent::Complete(completion) => {
                    return Ok(CollectedResponse {
                        text,
                        chunks,
                        chat_id: self.chat_id.take(),
                        completion,
                    });
                }
            }
        }

        Err(Error::StreamClosed)
    }
}

impl Stream for ChatStream {
    type Item = Result<ChatEvent>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        match this.rx.poll_recv(cx) {
            Poll::Ready(Some(Ok(event))) => {
                if let ChatEvent::Complete(ref completion) = event {
                    this.chat_id = completion.chat_id();
                }
                Poll::Ready(Some(Ok(event)))
            }
            Poll::Ready(Some(Err(e))) => Poll::Ready(Some(Err(e))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for ChatStream {
    fn drop(&mut self) {
        if let Some(handle) = self.task_handle.take() {
            handle.abort();
        }
    }
}

impl fmt::Debug for ChatStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatStream")
            .field("chat_id", &self.chat_id)
            .finish_non_exhaustive()
    }
}

/// A fully consumed chat response.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectedResponse {
    /// All chunk text concatenated.
    pub text: String,
    /// Number of chunks received.
    pub chunks: usize,
    /// Chat id from the completion payload, if it had one.
    pub chat_id: Option<ChatId>,
    /// The completion payload.
    pub completion: Completion,
}

/// Run a future with a timeout.
///
/// Returns [`Error::Timeout`] if the future doesn't complete within the
/// specified duration. The future is dropped on expiry.
pub async fn with_timeout<F, T>(duration: Duration, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio_timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => {
            tracing::debug!(?duration, "request deadline elapsed");
            Err(Error::Timeout(duration))
        }
    }
}
