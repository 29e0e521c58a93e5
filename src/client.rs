//! High-level AIgents client for chatting with agents.
//!
//! This module provides [`Client`], the main entry point for talking to the
//! AIgents backend.
//!
//! # Example
//!
//! ```ignore
//! use libaigents::{AgentId, Client, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = Client::new()?;
//!     client.login("me@example.com", "correct horse").await?;
//!
//!     // Simple one-shot request
//!     let agent = AgentId::new("3f0c...");
//!     let response = client.start_chat(&agent, "Hello!")?.collect_all().await?;
//!     println!("{}", response.text);
//!
//!     // Follow-up in the same chat
//!     if let Some(chat) = response.chat_id {
//!         let reply = client.continue_chat(&chat, "Tell me more")?.collect_text().await?;
//!         println!("{}", reply);
//!     }
//!
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::auth::SingleFlight;
use crate::config::{AgentId, ChatId, ClientConfig, ClientConfigBuilder, Endpoints};
use crate::protocol::{error_text, ApiEnvelope, CreateChatRequest, SendMessageRequest};
use crate::session::Session;
use crate::stream::{ChatHandler, ChatStream, StreamHandle};
use crate::{Error, Result};

/// A chat operation: start a new chat or continue an existing one.
///
/// Both kinds share one streaming pipeline; they differ only in the request
/// path and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatRequest {
    /// Start a chat with an agent.
    Create { agent: AgentId, message: String },
    /// Send a follow-up message to an existing chat.
    Continue { chat: ChatId, message: String },
}

impl ChatRequest {
    /// Start a chat with `agent`.
    pub fn create(agent: impl Into<AgentId>, message: impl Into<String>) -> Self {
        ChatRequest::Create {
            agent: agent.into(),
            message: message.into(),
        }
    }

    /// Continue `chat`.
    pub fn follow_up(chat: impl Into<ChatId>, message: impl Into<String>) -> Self {
        ChatRequest::Continue {
            chat: chat.into(),
            message: message.into(),
        }
    }

    /// The user message.
    pub fn message(&self) -> &str {
        match self {
            ChatRequest::Create { message, .. } | ChatRequest::Continue { message, .. } => message,
        }
    }

    /// Check the request before anything is sent.
    pub fn validate(&self) -> Result<()> {
        match self {
            ChatRequest::Create { agent, .. } if agent.is_blank() => {
                return Err(Error::InvalidInput("agent id must not be empty".into()));
            }
            ChatRequest::Continue { chat, .. } if chat.is_blank() => {
                return Err(Error::InvalidInput("chat id must not be empty".into()));
            }
            _ => {}
        }
        if self.message().trim().is_empty() {
            return Err(Error::InvalidInput("message must not be empty".into()));
        }
        Ok(())
    }

    fn kind(&self) -> &'static str {
        match self {
            ChatRequest::Create { .. } => "create",
            ChatRequest::Continue { .. } => "continue",
        }
    }

    fn path<'a>(&self, endpoints: &'a Endpoints) -> &'a str {
        match self {
            ChatRequest::Create { .. } => &endpoints.create_chat,
            ChatRequest::Continue { .. } => &endpoints.send_message,
        }
    }

    fn body(&self) -> Result<serde_json::Value> {
        let body = match self {
            ChatRequest::Create { agent, message } => serde_json::to_value(CreateChatRequest {
                agent_uuid: agent.clone(),
                message_content: message.clone(),
            }),
            ChatRequest::Continue { chat, message } => serde_json::to_value(SendMessageRequest {
                chat_uuid: chat.clone(),
                message_content: message.clone(),
            }),
        };
        Ok(body?)
    }
}

/// A client for the AIgents backend.
///
/// `Client` is the main entry point. It holds the configuration and one
/// HTTP connection pool with a cookie store, so the session cookies set by
/// [`login`](Self::login) are sent with every later request.
///
/// # Thread Safety
///
/// `Client` is `Send + Sync` and cheap to clone; clones share the cookie
/// store and the session refresh coordinator. Each chat operation runs on
/// its own task, so concurrent chats are supported.
#[derive(Debug, Clone)]
pub struct Client {
    config: Arc<ClientConfig>,
    http: reqwest::Client,
    refresh: Arc<SingleFlight>,
}

impl Client {
    /// Create a new client with default configuration.
    ///
    /// The base URL comes from `AIGENTS_API_URL`, falling back to
    /// `http://localhost:8080`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be initialized.
    pub fn new() -> Result<Self> {
        let config = ClientConfig::builder().build()?;
        Self::with_config(config)
    }

    /// Create a new client with the given configuration.
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let mut http = reqwest::Client::builder().cookie_store(true);
        if let Some(agent) = config.user_agent() {
            http = http.user_agent(agent);
        }
        let http = http.build().map_err(Error::Network)?;

        Ok(Self {
            config: Arc::new(config),
            http,
            refresh: Arc::new(SingleFlight::new()),
        })
    }

    /// Create a builder for configuring a new client.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let client = Client::builder()
    ///     .base_url("https://aigents.example.com/api")
    ///     .timeout(Duration::from_secs(60))
    ///     .build()?;
    /// ```
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Get a reference to the client's configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // -------------------------------------------------------------------------
    // Chat, pull style
    // -------------------------------------------------------------------------

    /// Start a chat with `agent` and return the response as a stream.
    ///
    /// The request is sent on a background task as soon as this returns.
    /// Must be called within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] without sending anything if the agent
    /// id or the message is blank. Failures after that point are yielded by
    /// the stream.
    ///
    /// # Cancellation
    ///
    /// Dropping the returned [`ChatStream`] cancels the request.
    pub fn start_chat(&self, agent: &AgentId, message: &str) -> Result<ChatStream> {
        self.chat(ChatRequest::create(agent.clone(), message))
    }

    /// Send a follow-up message to `chat` and return the response as a
    /// stream.
    ///
    /// Same contract as [`start_chat`](Self::start_chat).
    pub fn continue_chat(&self, chat: &ChatId, message: &str) -> Result<ChatStream> {
        self.chat(ChatRequest::follow_up(chat.clone(), message))
    }

    /// Run any [`ChatRequest`] and return the response as a stream.
    pub fn chat(&self, request: ChatRequest) -> Result<ChatStream> {
        request.validate()?;
        let body = request.body()?;
        let url = self.config.url(request.path(self.config.endpoints()));

        tracing::debug!(kind = request.kind(), %url, "starting chat request");

        let pending = self.http.post(url).json(&body).send();
        Ok(ChatStream::from_request(
            pending,
            self.config.timeout(),
            self.config.channel_capacity(),
        ))
    }

    // -------------------------------------------------------------------------
    // Chat, callback style
    // -------------------------------------------------------------------------

    /// Start a chat with `agent`, delivering the response to `handler`.
    ///
    /// Returns immediately with a handle that cancels the operation.
    /// Invalid input is reported through [`ChatHandler::on_error`] without
    /// any network activity. Must be called within a tokio runtime.
    pub fn start_chat_with<H: ChatHandler>(
        &self,
        agent: &AgentId,
        message: &str,
        handler: H,
    ) -> StreamHandle {
        self.chat_with(ChatRequest::create(agent.clone(), message), handler)
    }

    /// Send a follow-up message to `chat`, delivering the response to
    /// `handler`.
    pub fn continue_chat_with<H: ChatHandler>(
        &self,
        chat: &ChatId,
        message: &str,
        handler: H,
    ) -> StreamHandle {
        self.chat_with(ChatRequest::follow_up(chat.clone(), message), handler)
    }

    /// Run any [`ChatRequest`], delivering the response to `handler`.
    pub fn chat_with<H: ChatHandler>(&self, request: ChatRequest, handler: H) -> StreamHandle {
        let stream = self.chat(request).unwrap_or_else(ChatStream::failed);
        stream.dispatch(handler)
    }

    // -------------------------------------------------------------------------
    // Sessions
    // -------------------------------------------------------------------------

    /// Start a chat and wrap it in a [`Session`] for follow-ups.
    ///
    /// Consumes the first response completely.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let session = client.start_session(&agent, "My name is Alice").await?;
    /// let reply = session.send("What's my name?").await?;
    /// ```
    pub async fn start_session(&self, agent: &AgentId, message: &str) -> Result<Session> {
        let stream = self.start_chat(agent, message)?;
        Session::from_initial_stream(self.clone(), agent.clone(), message, stream).await
    }

    /// Wrap an existing chat in a [`Session`] without sending anything.
    pub fn resume_session(&self, chat: ChatId) -> Session {
        Session::resume(self.clone(), chat)
    }

    // -------------------------------------------------------------------------
    // Plumbing shared with the auth and agent APIs
    // -------------------------------------------------------------------------

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn refresh_coordinator(&self) -> &SingleFlight {
        &self.refresh
    }

    /// Send a request, refreshing the session and retrying once on 401.
    ///
    /// `build` is called once per attempt. Paths that [`Endpoints`] marks
    /// as refresh-exempt return the 401 as-is.
    pub(crate) async fn send_authorized<F>(&self, path: &str, build: F) -> Result<reqwest::Response>
    where
        F: Fn(&reqwest::Client, String) -> reqwest::RequestBuilder,
    {
        let url = self.config.url(path);
        let response = build(&self.http, url.clone())
            .send()
            .await
            .map_err(Error::Network)?;

        if response.status() != StatusCode::UNAUTHORIZED
            || self.config.endpoints().skips_refresh(path)
        {
            return ensure_success(response).await;
        }

        tracing::debug!(path, "unauthorized, refreshing session");
        self.refresh().await?;

        let response = build(&self.http, url).send().await.map_err(Error::Network)?;
        ensure_success(response).await
    }

    /// Like `send`, but bounded by `deadline`.
    pub(crate) async fn send_with_deadline(
        &self,
        request: reqwest::RequestBuilder,
        deadline: Duration,
    ) -> Result<reqwest::Response> {
        crate::stream::with_timeout(deadline, async {
            request.send().await.map_err(Error::Network)
        })
        .await
    }
}

/// Pass a success response through; turn anything else into
/// [`Error::Http`].
pub(crate) async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(http_error(response).await)
    }
}

/// Build [`Error::Http`] from a failed response. The body is read only for
/// its message.
pub(crate) async fn http_error(response: reqwest::Response) -> Error {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    tracing::debug!(status, "request failed");
    Error::Http {
        status,
        message: error_text(&body),
    }
}

/// Decode a success response's JSON envelope.
pub(crate) async fn read_envelope<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<ApiEnvelope<T>> {
    let text = response.text().await.map_err(Error::Network)?;
    if text.trim().is_empty() {
        return Ok(ApiEnvelope {
            status: None,
            message: None,
            error: None,
            data: None,
        });
    }
    serde_json::from_str(&text).map_err(|e| Error::json_parse(e, &text))
}

/// Builder for [`Client`].
///
/// This wraps [`ClientConfigBuilder`] and builds directly into a [`Client`].
#[derive(Debug, Clone, Default)]
pub struct ClientBuilder {
    inner: ClientConfigBuilder,
}

impl ClientBuilder {
    /// Create a new client builder with default settings.
    pub fn new() -> Self {
        Self {
            inner: ClientConfigBuilder::default(),
        }
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The base URL is not an absolute http(s) URL
    /// - A timeout or the channel capacity is zero
    /// - The HTTP client cannot be initialized
    pub fn build(self) -> Result<Client> {
        let config = self.inner.build()?;
        Client::with_config(config)
    }

    // -------------------------------------------------------------------------
    // Server (delegated to ClientConfigBuilder)
    // -------------------------------------------------------------------------

    /// Base URL of the backend.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.inner = self.inner.base_url(url);
        self
    }

    /// Read the base URL from `AIGENTS_API_URL`.
    pub fn base_url_from_env(mut self) -> Self {
        self.inner = self.inner.base_url_from_env();
        self
    }

    /// Replace all request paths.
    pub fn endpoints(mut self, endpoints: Endpoints) -> Self {
        self.inner = self.inner.endpoints(endpoints);
        self
    }

    /// Path for starting a chat.
    pub fn create_chat_path(mut self, path: impl Into<String>) -> Self {
        self.inner = self.inner.create_chat_path(path);
        self
    }

    /// Path for sending a follow-up message.
    pub fn send_message_path(mut self, path: impl Into<String>) -> Self {
        self.inner = self.inner.send_message_path(path);
        self
    }

    // -------------------------------------------------------------------------
    // Timing and HTTP
    // -------------------------------------------------------------------------

    /// Startup deadline for chat requests.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.inner = self.inner.timeout(duration);
        self
    }

    /// Deadline for the auth check call.
    pub fn check_timeout(mut self, duration: Duration) -> Self {
        self.inner = self.inner.check_timeout(duration);
        self
    }

    /// User agent sent with every request.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.inner = self.inner.user_agent(agent);
        self
    }

    /// Events buffered per stream.
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.inner = self.inner.channel_capacity(capacity);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Client>();
        assert_send_sync::<ClientBuilder>();
        assert_send_sync::<ChatRequest>();
    }

    #[test]
    fn builder_configures_client() {
        let client = Client::builder()
            .base_url("http://127.0.0.1:9000/")
            .timeout(Duration::from_secs(3))
            .create_chat_path("/v2/chat/create")
            .build()
            .unwrap();
        assert_eq!(client.config().base_url(), "http://127.0.0.1:9000");
        assert_eq!(client.config().timeout(), Duration::from_secs(3));
        assert_eq!(client.config().endpoints().create_chat, "/v2/chat/create");
    }

    #[test]
    fn builder_rejects_bad_url() {
        let err = Client::builder().base_url("not a url").build().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn blank_inputs_are_rejected() {
        let cases = [
            ChatRequest::create("", "hi"),
            ChatRequest::create("  ", "hi"),
            ChatRequest::create("agent", ""),
            ChatRequest::follow_up("chat", " \n\t"),
            ChatRequest::follow_up("", "hi"),
        ];
        for request in cases {
            assert!(
                matches!(request.validate(), Err(Error::InvalidInput(_))),
                "{request:?} should be rejected"
            );
        }
    }

    #[test]
    fn valid_request_passes() {
        assert!(ChatRequest::create("agent", "hello").validate().is_ok());
        assert!(ChatRequest::follow_up("chat", " hi ").validate().is_ok());
    }

    #[test]
    fn request_paths_and_bodies() {
        let endpoints = Endpoints::default();

        let create = ChatRequest::create("a1", "hello");
        assert_eq!(create.path(&endpoints), "/chat/create");
        assert_eq!(
            create.body().unwrap(),
            serde_json::json!({"agent_uuid": "a1", "message_content": "hello"})
        );

        let follow_up = ChatRequest::follow_up("c1", "again");
        assert_eq!(follow_up.path(&endpoints), "/chat/send-new-message");
        assert_eq!(
            follow_up.body().unwrap(),
            serde_json::json!({"chat_uuid": "c1", "message_content": "again"})
        );
    }

    #[test]
    fn message_is_sent_untrimmed() {
        let request = ChatRequest::create("a1", "  spaced  ");
        assert_eq!(request.message(), "  spaced  ");
    }

    #[tokio::test]
    async fn start_chat_rejects_blank_message() {
        let client = Client::builder()
            .base_url("http://127.0.0.1:1")
            .build()
            .unwrap();
        let err = client
            .start_chat(&AgentId::new("agent"), "   ")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
