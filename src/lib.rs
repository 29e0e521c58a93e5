//! # libaigents
//!
//! Async Rust client for the AIgents agent chat backend.
//!
//! This library provides a typed interface to AIgents, supporting:
//! - Streaming chat responses, as async streams or through callbacks
//! - Cancellation of in-flight chats
//! - Multi-turn sessions
//! - Cookie-based login with automatic session refresh
//! - The agent catalog and a local project store
//!
//! ## Quick Start
//!
//! ```ignore
//! use libaigents::{AgentId, Client, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = Client::new()?;
//!     client.login("me@example.com", "correct horse").await?;
//!
//!     let agent = AgentId::new("3f0c...");
//!     let reply = client.start_chat(&agent, "What is 2+2?")?.collect_text().await?;
//!     println!("{}", reply);
//!     Ok(())
//! }
//! ```
//!
//! ## Streaming
//!
//! ```ignore
//! use futures::StreamExt;
//! use libaigents::ChatEvent;
//!
//! let mut stream = client.start_chat(&agent, "Write a poem")?;
//! while let Some(event) = stream.next().await {
//!     if let ChatEvent::Chunk(text) = event? {
//!         print!("{}", text);
//!     }
//! }
//! ```
//!
//! ## Callbacks
//!
//! ```ignore
//! use libaigents::handler_fn;
//!
//! let handle = client.start_chat_with(
//!     &agent,
//!     "Write a poem",
//!     handler_fn(
//!         |text| print!("{}", text),
//!         |completion| println!("\nchat {:?}", completion.chat_id()),
//!         |error| eprintln!("failed: {}", error),
//!     ),
//! );
//!
//! // Changed our mind
//! handle.cancel();
//! ```
//!
//! ## Multi-turn Sessions
//!
//! ```ignore
//! let session = client.start_session(&agent, "My name is Alice").await?;
//! let reply = session.send("What's my name?").await?;
//! ```
//!
//! ## Configuration
//!
//! ```ignore
//! use std::time::Duration;
//! use libaigents::Client;
//!
//! let client = Client::builder()
//!     .base_url("https://aigents.example.com/api")
//!     .timeout(Duration::from_secs(60))
//!     .user_agent("my-app/1.0")
//!     .build()?;
//! ```

pub mod agents;
pub mod auth;
mod client;
pub mod config;
mod error;
pub mod projects;
pub mod protocol;
mod session;
pub mod stream;

pub use error::{Error, Result};

// Re-export the main client types at crate root
pub use client::{ChatRequest, Client, ClientBuilder};
pub use session::{ChatMessage, Sender, Session};

// Re-export commonly used types at crate root
pub use agents::{Agent, NewAgent};
pub use config::{AgentId, ChatId, ClientConfig, ClientConfigBuilder, Endpoints};
pub use projects::{NewProject, Project, ProjectStore, ProjectUpdate};
pub use stream::{
    handler_fn, ChatEvent, ChatHandler, ChatStream, CollectedResponse, Completion, StreamHandle,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_types_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Client>();
        assert_send_sync::<Session>();
        assert_send_sync::<StreamHandle>();
        assert_send_sync::<Error>();
        assert_send_sync::<ChatEvent>();
        assert_send_sync::<Agent>();
        assert_send_sync::<ProjectStore>();
    }

    #[test]
    fn chat_stream_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<ChatStream>();
    }
}
