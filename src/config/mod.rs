//! Configuration for the AIgents client.
//!
//! This module provides:
//!
//! - [`ClientConfig`] and [`ClientConfigBuilder`] for configuring the client
//! - Type-safe identifiers [`AgentId`] and [`ChatId`]
//! - [`Endpoints`], the request paths on the backend
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use libaigents::config::ClientConfig;
//!
//! let config = ClientConfig::builder()
//!     .base_url("https://aigents.example.com")
//!     .timeout(Duration::from_secs(60))
//!     .build()?;
//! ```
//!
//! # Base URL
//!
//! When no base URL is given, the builder reads `AIGENTS_API_URL` and falls
//! back to `http://localhost:8080`.

pub mod builder;
pub mod options;

pub use builder::{
    ClientConfig, ClientConfigBuilder, DEFAULT_BASE_URL, DEFAULT_CHECK_TIMEOUT, DEFAULT_TIMEOUT,
    ENV_API_URL,
};
pub use options::{AgentId, ChatId, Endpoints};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_exports_accessible() {
        let _: AgentId = AgentId::new("agent");
        let _: ChatId = ChatId::new("chat");
        let _: Endpoints = Endpoints::default();
        let _: &str = ENV_API_URL;
    }

    #[test]
    fn builder_accessible() {
        let _ = ClientConfig::builder();
    }
}
