//! Multi-turn chat sessions.
//!
//! This module provides [`Session`] for holding a conversation with one
//! agent. A session remembers the chat id the backend assigned and keeps a
//! local transcript of every completed turn.
//!
//! # Example
//!
//! ```ignore
//! use libaigents::{AgentId, Client, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = Client::new()?;
//!     let agent = AgentId::new("3f0c...");
//!
//!     let session = client.start_session(&agent, "My name is Alice").await?;
//!     let reply = session.send("What's my name?").await?;
//!     println!("{}", reply);
//!
//!     for message in session.transcript().await {
//!         println!("{:?}: {}", message.sender, message.text);
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::client::Client;
use crate::config::{AgentId, ChatId};
use crate::stream::{ChatStream, CollectedResponse};
use crate::{Error, Result};

/// Who wrote a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Agent,
}

/// One entry of a session transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
        }
    }

    pub fn agent(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Agent,
            text: text.into(),
        }
    }
}

/// A conversation with an agent.
///
/// # Thread Safety
///
/// `Session` is `Send + Sync` and can be shared across tasks. Concurrent
/// calls to [`send`](Self::send) are serialized internally so turns reach
/// the backend, and the transcript, in order.
#[derive(Debug)]
pub struct Session {
    client: Client,
    agent_id: Option<AgentId>,
    chat_id: ChatId,
    transcript: Mutex<Vec<ChatMessage>>,
    /// Lock to serialize send operations.
    send_lock: Mutex<()>,
}

impl Session {
    /// Create a session from the stream of a create-chat request.
    ///
    /// Consumes the stream. The chat id comes from the completion's
    /// `chat_uuid`; when the completion was not JSON its raw text is taken
    /// as the id.
    pub(crate) async fn from_initial_stream(
        client: Client,
        agent_id: AgentId,
        message: &str,
        stream: ChatStream,
    ) -> Result<Self> {
        let response = stream.collect_all().await?;
        let chat_id = chat_id_of(&response).ok_or_else(|| {
            Error::UnexpectedResponse("chat completion carried no chat id".into())
        })?;

        tracing::debug!(chat = %chat_id, agent = %agent_id, "session started");

        Ok(Self {
            client,
            agent_id: Some(agent_id),
            chat_id,
            transcript: Mutex::new(vec![
                ChatMessage::user(message),
                ChatMessage::agent(response.text),
            ]),
            send_lock: Mutex::new(()),
        })
    }

    /// Attach to an existing chat. The transcript starts empty.
    pub(crate) fn resume(client: Client, chat_id: ChatId) -> Self {
        Self {
            client,
            agent_id: None,
            chat_id,
            transcript: Mutex::new(Vec::new()),
            send_lock: Mutex::new(()),
        }
    }

    /// Get the chat id.
    ///
    /// Pass it to [`Client::resume_session`] to pick the conversation up
    /// again later.
    pub fn chat_id(&self) -> &ChatId {
        &self.chat_id
    }

    /// The agent, if this session started the chat.
    pub fn agent_id(&self) -> Option<&AgentId> {
        self.agent_id.as_ref()
    }

    /// Send a message and wait for the full reply.
    ///
    /// Both the message and the reply are added to the transcript once the
    /// reply completes; a failed turn leaves the transcript unchanged.
    ///
    /// # Note
    ///
    /// Only one send operation can be in progress at a time.
    /// Concurrent calls will be serialized.
    pub async fn send(&self, message: &str) -> Result<String> {
        let _guard = self.send_lock.lock().await;

        let response = self
            .client
            .continue_chat(&self.chat_id, message)?
            .collect_all()
            .await?;

        let mut transcript = self.transcript.lock().await;
        transcript.push(ChatMessage::user(message));
        transcript.push(ChatMessage::agent(response.text.clone()));
        Ok(response.text)
    }

    /// A copy of the conversation so far.
    pub async fn transcript(&self) -> Vec<ChatMessage> {
        self.transcript.lock().await.clone()
    }
}

fn chat_id_of(response: &CollectedResponse) -> Option<ChatId> {
    response
        .chat_id
        .clone()
        .or_else(|| response.completion.chat_id())
}
