//! Request bodies sent to the AIgents backend.

use serde::{Deserialize, Serialize};

use crate::config::{AgentId, ChatId};

/// Body of the create-chat request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateChatRequest {
    /// Agent the conversation is held with.
    pub agent_uuid: AgentId,
    /// First user message.
    pub message_content: String,
}

/// Body of the send-message request for an existing chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessageRequest {
    /// Chat returned by the `done` event of the create-chat stream.
    pub chat_uuid: ChatId,
    /// Next user message.
    pub message_content: String,
}

/// Email and password, used for both signup and login.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Paging parameters for the agent listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentPage {
    pub page: u64,
    pub page_size: u64,
}

/// Lookup body for a single agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentLookup {
    pub agent_uuid: AgentId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_chat_wire_shape() {
        let body = CreateChatRequest {
            agent_uuid: AgentId::new("agent-1"),
            message_content: "hello".into(),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"agent_uuid": "agent-1", "message_content": "hello"})
        );
    }

    #[test]
    fn send_message_wire_shape() {
        let body = SendMessageRequest {
            chat_uuid: ChatId::new("chat-1"),
            message_content: "again".into(),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"chat_uuid": "chat-1", "message_content": "again"})
        );
    }

    #[test]
    fn credentials_debug_redacts_password() {
        let creds = Credentials {
            email: "a@b.c".into(),
            password: "hunter22".into(),
        };
        let debug = format!("{creds:?}");
        assert!(debug.contains("a@b.c"));
        assert!(!debug.contains("hunter22"));
    }
}
