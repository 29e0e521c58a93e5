//! Test utilities for libaigents integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use libaigents::{ChatHandler, Client, Completion, Error};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::{MockServer, ResponseTemplate};

/// Builder for SSE response bodies as the chat endpoints send them.
pub struct SseBody {
    text: String,
}

impl SseBody {
    /// Start with the server's connection probe event.
    pub fn new() -> Self {
        Self {
            text: String::new(),
        }
        .event("test", "connection established")
    }

    /// Start with nothing.
    pub fn empty() -> Self {
        Self {
            text: String::new(),
        }
    }

    /// Append one `event:`/`data:` pair followed by a blank line.
    pub fn event(mut self, event: &str, data: &str) -> Self {
        self.text.push_str(&format!("event: {event}\ndata: {data}\n\n"));
        self
    }

    pub fn message(self, text: &str) -> Self {
        self.event("message", text)
    }

    pub fn done(self, payload: &str) -> Self {
        self.event("done", payload)
    }

    pub fn error(self, message: &str) -> Self {
        self.event("error", message)
    }

    /// Append raw text, e.g. an unterminated line.
    pub fn raw(mut self, text: &str) -> Self {
        self.text.push_str(text);
        self
    }

    pub fn build(self) -> String {
        self.text
    }

    /// A 200 response carrying this body.
    pub fn respond(self) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_raw(self.text, "text/event-stream")
    }
}

impl Default for SseBody {
    fn default() -> Self {
        Self::new()
    }
}

/// What a [`RecordingHandler`] saw.
#[derive(Debug)]
pub enum Callback {
    Chunk(String),
    Complete(Completion),
    Error(Error),
}

/// A handler that records every callback in order.
#[derive(Clone, Default)]
pub struct RecordingHandler {
    calls: Arc<Mutex<Vec<Callback>>>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of callbacks so far.
    pub fn len(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Chunk texts, in order.
    pub fn chunks(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| match c {
                Callback::Chunk(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of terminal callbacks (complete or error).
    pub fn terminal_count(&self) -> usize {
        terminal_count(&self.calls.lock().unwrap())
    }

    /// Whether exactly one terminal callback fired, and fired last.
    pub fn ends_with_single_terminal(&self) -> bool {
        let calls = self.calls.lock().unwrap();
        terminal_count(&calls) == 1
            && calls
                .last()
                .is_some_and(|c| !matches!(c, Callback::Chunk(_)))
    }

    /// The completion, if one was delivered.
    pub fn completion(&self) -> Option<Completion> {
        self.calls.lock().unwrap().iter().find_map(|c| match c {
            Callback::Complete(completion) => Some(completion.clone()),
            _ => None,
        })
    }

    /// Apply `f` to the error, if one was delivered.
    pub fn with_error<T>(&self, f: impl FnOnce(&Error) -> T) -> Option<T> {
        let calls = self.calls.lock().unwrap();
        calls.iter().find_map(|c| match c {
            Callback::Error(error) => Some(error),
            _ => None,
        })
        .map(f)
    }
}

impl ChatHandler for RecordingHandler {
    fn on_chunk(&mut self, text: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(Callback::Chunk(text.to_string()));
    }

    fn on_complete(&mut self, completion: Completion) {
        self.calls
            .lock()
            .unwrap()
            .push(Callback::Complete(completion));
    }

    fn on_error(&mut self, error: Error) {
        self.calls.lock().unwrap().push(Callback::Error(error));
    }
}

fn terminal_count(calls: &[Callback]) -> usize {
    calls
        .iter()
        .filter(|c| !matches!(c, Callback::Chunk(_)))
        .count()
}

/// A client pointed at `server`.
pub fn client_for(server: &MockServer) -> Client {
    client_with_timeout(server, Duration::from_secs(5))
}

/// A client pointed at `server` with the given chat startup deadline.
pub fn client_with_timeout(server: &MockServer, timeout: Duration) -> Client {
    client_at(server.uri(), timeout)
}

/// A client pointed at `base_url` with the given chat startup deadline.
pub fn client_at(base_url: String, timeout: Duration) -> Client {
    Client::builder()
        .base_url(base_url)
        .timeout(timeout)
        .build()
        .expect("client should build")
}

/// Serve one connection with a 500 whose body stops after a few bytes.
///
/// Returns the base URL. The connection stays open for `hold`.
pub async fn stalled_error_server(hold: Duration) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 4096];
        let _ = socket.read(&mut request).await;
        socket
            .write_all(
                b"HTTP/1.1 500 Internal Server Error\r\n\
                  Content-Type: application/json\r\n\
                  Content-Length: 100\r\n\r\n\
                  {\"error",
            )
            .await
            .unwrap();
        tokio::time::sleep(hold).await;
    });

    format!("http://{addr}")
}
