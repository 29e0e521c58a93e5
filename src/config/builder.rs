//! Client configuration and builder.
//!
//! This module provides the builder pattern for configuring the AIgents client.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use libaigents::config::ClientConfig;
//!
//! let config = ClientConfig::builder()
//!     .base_url("http://localhost:8080")
//!     .timeout(Duration::from_secs(30))
//!     .build()?;
//! ```

use std::time::Duration;

use super::options::Endpoints;
use crate::{Error, Result};

/// Environment variable consulted for the base URL when none is set.
pub const ENV_API_URL: &str = "AIGENTS_API_URL";

/// Base URL used when neither the builder nor the environment provide one.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Default startup deadline for chat requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default deadline for the auth check call.
pub const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for the AIgents client.
///
/// Use [`ClientConfig::builder()`] to create a new configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub(crate) base_url: String,
    pub(crate) endpoints: Endpoints,
    pub(crate) timeout: Duration,
    pub(crate) check_timeout: Duration,
    pub(crate) user_agent: Option<String>,
    pub(crate) channel_capacity: usize,
}

impl ClientConfig {
    /// Create a new builder for ClientConfig.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Base URL of the backend, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Request paths.
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Startup deadline for chat requests.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Deadline for the auth check call.
    pub fn check_timeout(&self) -> Duration {
        self.check_timeout
    }

    /// Custom user agent, if set.
    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    /// Events buffered between a stream's reader task and its consumer.
    pub fn channel_capacity(&self) -> usize {
        self.channel_capacity
    }

    /// Join a path onto the base URL.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

/// Builder for [`ClientConfig`].
///
/// The configuration is validated when [`build()`](ClientConfigBuilder::build)
/// is called.
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    base_url: Option<String>,
    endpoints: Endpoints,
    timeout: Duration,
    check_timeout: Duration,
    user_agent: Option<String>,
    channel_capacity: usize,
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        Self {
            base_url: None,
            endpoints: Endpoints::default(),
            timeout: DEFAULT_TIMEOUT,
            check_timeout: DEFAULT_CHECK_TIMEOUT,
            user_agent: None,
            channel_capacity: 64,
        }
    }
}

impl ClientConfigBuilder {
    // -------------------------------------------------------------------------
    // Server
    // -------------------------------------------------------------------------

    /// Base URL of the backend (default: `AIGENTS_API_URL`, then
    /// `http://localhost:8080`).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Read the base URL from `AIGENTS_API_URL`, failing at build time if unset.
    pub fn base_url_from_env(mut self) -> Self {
        self.base_url = Some(std::env::var(ENV_API_URL).unwrap_or_default());
        self
    }

    /// Replace all request paths.
    pub fn endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Path for starting a chat.
    pub fn create_chat_path(mut self, path: impl Into<String>) -> Self {
        self.endpoints.create_chat = path.into();
        self
    }

    /// Path for sending a message to an existing chat.
    pub fn send_message_path(mut self, path: impl Into<String>) -> Self {
        self.endpoints.send_message = path.into();
        self
    }

    // -------------------------------------------------------------------------
    // Timing
    // -------------------------------------------------------------------------

    /// Startup deadline for chat requests (default: 30 seconds).
    ///
    /// The deadline covers the wait for the response headers. It is not
    /// applied to the body, which may stream for as long as the agent writes.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = duration;
        self
    }

    /// Deadline for the auth check call (default: 5 seconds).
    pub fn check_timeout(mut self, duration: Duration) -> Self {
        self.check_timeout = duration;
        self
    }

    // -------------------------------------------------------------------------
    // HTTP
    // -------------------------------------------------------------------------

    /// User agent sent with every request.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Number of stream events buffered between the reader task and the
    /// consumer (default: 64).
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    // -------------------------------------------------------------------------
    // Build
    // -------------------------------------------------------------------------

    /// Build the configuration.
    ///
    /// This validates:
    /// - The base URL parses as an absolute `http` or `https` URL
    /// - Timeouts are non-zero
    /// - The channel capacity is non-zero
    pub fn build(self) -> Result<ClientConfig> {
        let base_url = match self.base_url {
            Some(url) => url,
            None => std::env::var(ENV_API_URL).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        };
        let base_url = base_url.trim().trim_end_matches('/').to_string();

        let parsed = reqwest::Url::parse(&base_url)
            .map_err(|e| Error::InvalidConfig(format!("invalid base URL {base_url:?}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::InvalidConfig(format!(
                "base URL must use http or https, got {}",
                parsed.scheme()
            )));
        }

        if self.timeout.is_zero() {
            return Err(Error::InvalidConfig("timeout must be non-zero".into()));
        }
        if self.check_timeout.is_zero() {
            return Err(Error::InvalidConfig("check timeout must be non-zero".into()));
        }
        if self.channel_capacity == 0 {
            return Err(Error::InvalidConfig("channel capacity must be non-zero".into()));
        }

        Ok(ClientConfig {
            base_url,
            endpoints: self.endpoints,
            timeout: self.timeout,
            check_timeout: self.check_timeout,
            user_agent: self.user_agent,
            channel_capacity: self.channel_capacity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ClientConfig>();
        assert_send_sync::<ClientConfigBuilder>();
    }

    #[test]
    fn defaults() {
        let config = ClientConfig::builder()
            .base_url("http://localhost:8080")
            .build()
            .unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.check_timeout(), Duration::from_secs(5));
        assert!(config.user_agent().is_none());
        assert_eq!(config.endpoints(), &Endpoints::default());
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let config = ClientConfig::builder()
            .base_url("http://example.com/api/")
            .build()
            .unwrap();
        assert_eq!(config.base_url(), "http://example.com/api");
        assert_eq!(config.url("/chat/create"), "http://example.com/api/chat/create");
        assert_eq!(config.url("chat/create"), "http://example.com/api/chat/create");
    }

    #[test]
    fn invalid_url_rejected() {
        let result = ClientConfig::builder().base_url("not a url").build();
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn non_http_scheme_rejected() {
        let result = ClientConfig::builder().base_url("ftp://example.com").build();
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn zero_timeout_rejected() {
        let result = ClientConfig::builder()
            .base_url("http://localhost")
            .timeout(Duration::ZERO)
            .build();
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn zero_channel_capacity_rejected() {
        let result = ClientConfig::builder()
            .base_url("http://localhost")
            .channel_capacity(0)
            .build();
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn custom_paths() {
        let config = ClientConfig::builder()
            .base_url("http://localhost")
            .create_chat_path("/api/v1/chat/create")
            .send_message_path("/api/v1/chat/send-new-message")
            .build()
            .unwrap();
        assert_eq!(config.endpoints().create_chat, "/api/v1/chat/create");
        assert_eq!(
            config.endpoints().send_message,
            "/api/v1/chat/send-new-message"
        );
    }

    #[test]
    fn user_agent_is_stored() {
        let config = ClientConfig::builder()
            .base_url("http://localhost")
            .user_agent("aigents-test/1.0")
            .build()
            .unwrap();
        assert_eq!(config.user_agent(), Some("aigents-test/1.0"));
    }
}
