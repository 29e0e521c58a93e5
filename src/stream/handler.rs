//! Callback-style consumption of chat streams.
//!
//! A [`ChatHandler`] receives the chunks and the single terminal outcome of
//! a chat response. [`ChatStream::dispatch`] drives a stream into a handler
//! on a background task and returns a [`StreamHandle`] for cancellation.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::watch;
use tokio::task::AbortHandle;

use super::events::{ChatEvent, Completion};
use super::response::ChatStream;
use crate::Error;

/// Receiver for the events of one chat response.
///
/// For every operation that reaches the network, exactly one of
/// [`on_complete`](Self::on_complete) and [`on_error`](Self::on_error) is
/// called, after all chunks, unless the operation is cancelled first. After
/// a cancel nothing is called.
///
/// Callbacks run on the stream's background task. Keep them short; a slow
/// callback delays reading the body.
///
/// # Example
///
/// ```ignore
/// use libaigents::{ChatHandler, Completion, Error};
///
/// struct Printer;
///
/// impl ChatHandler for Printer {
///     fn on_chunk(&mut self, text: &str) {
///         print!("{}", text);
///     }
///
///     fn on_error(&mut self, error: Error) {
///         eprintln!("chat failed: {}", error);
///     }
/// }
/// ```
pub trait ChatHandler: Send + 'static {
    /// Called once per `message` frame with the raw payload.
    fn on_chunk(&mut self, text: &str) {
        let _ = text;
    }

    /// Called when the `done` frame arrives.
    fn on_complete(&mut self, completion: Completion) {
        let _ = completion;
    }

    /// Called when the operation fails.
    fn on_error(&mut self, error: Error) {
        let _ = error;
    }
}

/// A [`ChatHandler`] built from three closures. See [`handler_fn`].
pub struct FnHandler<C, D, E> {
    on_chunk: C,
    on_complete: D,
    on_error: E,
}

/// Build a [`ChatHandler`] from closures.
///
/// ```ignore
/// let handle = client.start_chat_with(
///     &agent,
///     "Hello",
///     handler_fn(
///         |text| print!("{}", text),
///         |completion| println!("\n{:?}", completion.chat_id()),
///         |error| eprintln!("{}", error),
///     ),
/// );
/// ```
pub fn handler_fn<C, D, E>(on_chunk: C, on_complete: D, on_error: E) -> FnHandler<C, D, E>
where
    C: FnMut(&str) + Send + 'static,
    D: FnMut(Completion) + Send + 'static,
    E: FnMut(Error) + Send + 'static,
{
    FnHandler {
        on_chunk,
        on_complete,
        on_error,
    }
}

impl<C, D, E> ChatHandler for FnHandler<C, D, E>
where
    C: FnMut(&str) + Send + 'static,
    D: FnMut(Completion) + Send + 'static,
    E: FnMut(Error) + Send + 'static,
{
    fn on_chunk(&mut self, text: &str) {
        (self.on_chunk)(text)
    }

    fn on_complete(&mut self, completion: Completion) {
        (self.on_complete)(completion)
    }

    fn on_error(&mut self, error: Error) {
        (self.on_error)(error)
    }
}

impl<C, D, E> fmt::Debug for FnHandler<C, D, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}

/// Cancellation handle for a chat operation running in the background.
///
/// Cloning yields another handle to the same operation. Dropping every
/// handle does not cancel the operation.
#[derive(Clone)]
pub struct StreamHandle {
    cancelled: Arc<AtomicBool>,
    abort: AbortHandle,
    done: watch::Receiver<bool>,
}

impl StreamHandle {
    pub(crate) fn spawn<H: ChatHandler>(stream: ChatStream, handler: H) -> Self {
        let cancelled = Arc::new(AtomicBool::new(false));
        let (done_tx, done) = watch::channel(false);

        let flag = Arc::clone(&cancelled);
        let task = tokio::spawn(async move {
            drive(stream, handler, &flag).await;
            let _ = done_tx.send(true);
        });

        Self {
            cancelled,
            abort: task.abort_handle(),
            done,
        }
    }

    /// Cancel the operation.
    ///
    /// Drops the in-flight request, the response body and the startup
    /// timer. No callback starts after this returns; one already running
    /// is not interrupted. Safe to call any number of times, and after the
    /// operation has finished.
    ///
    /// Returns `true` if this call stopped an operation that was still
    /// running.
    pub fn cancel(&self) -> bool {
        let finished = *self.done.borrow();
        if self.cancelled.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.abort.abort();
        if !finished {
            tracing::debug!("chat stream cancelled");
        }
        !finished
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Whether the operation has ended, by completing, failing or being
    /// cancelled.
    pub fn is_finished(&self) -> bool {
        *self.done.borrow() || self.is_cancelled()
    }

    /// Wait until the operation has ended.
    ///
    /// Returns once the terminal callback has run, or immediately after a
    /// cancel.
    pub async fn finished(&self) {
        let mut done = self.done.clone();
        // Err means the task was aborted
        let _ = done.wait_for(|finished| *finished).await;
    }
}

impl fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamHandle")
            .field("cancelled", &self.is_cancelled())
            .field("finished", &self.is_finished())
            .finish()
    }
}

impl ChatStream {
    /// Drive this stream into `handler` on a background task.
    ///
    /// Must be called within a tokio runtime.
    pub fn dispatch<H: ChatHandler>(self, handler: H) -> StreamHandle {
        StreamHandle::spawn(self, handler)
    }
}

async fn drive<H: ChatHandler>(mut stream: ChatStream, mut handler: H, cancelled: &AtomicBool) {
    while let Some(item) = stream.next().await {
        if cancelled.load(Ordering::Acquire) {
            return;
        }
        match item {
            Ok(ChatEvent::Chunk(text)) => handler.on_chunk(&text),
            Ok(ChatEvent::Complete(completion)) => {
                handler.on_complete(completion);
                return;
            }
            Err(error) => {
                handler.on_error(error);
                return;
            }
        }
    }
}
