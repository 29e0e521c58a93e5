//! Streaming chat response handling.
//!
//! This module turns the SSE body of a chat request into typed events.
//!
//! # Overview
//!
//! The layers, bottom-up:
//!
//! - [`FrameParser`] - incremental UTF-8 decoding, line splitting and
//!   `event:` / `data:` framing; independent of the HTTP layer
//! - [`ChatEvent`] - text chunks and the [`Completion`] payload
//! - [`ChatStream`] - an async stream of events from one chat response
//! - [`ChatHandler`] / [`StreamHandle`] - callback-style consumption with a
//!   cancel handle
//!
//! # Example
//!
//! ```ignore
//! use futures::StreamExt;
//! use libaigents::stream::ChatEvent;
//!
//! let mut stream = client.start_chat(&agent, "Hello")?;
//!
//! while let Some(event) = stream.next().await {
//!     match event? {
//!         ChatEvent::Chunk(text) => print!("{}", text),
//!         ChatEvent::Complete(completion) => {
//!             println!("\nchat: {:?}", completion.chat_id());
//!         }
//!     }
//! }
//! ```
//!
//! # Cancellation
//!
//! Dropping a [`ChatStream`], or calling [`StreamHandle::cancel`], aborts the
//! background reader task. The HTTP request, the body and the startup timer
//! go with it.

pub mod events;
mod handler;
pub mod parser;
pub mod response;

pub use events::{ChatEvent, Completion};
pub use handler::{handler_fn, ChatHandler, FnHandler, StreamHandle};
pub use parser::{EventKind, Frame, FrameParser, Utf8Decoder};
pub use response::{with_timeout, ChatStream, CollectedResponse};
