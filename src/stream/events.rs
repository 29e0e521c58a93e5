//! High-level chat stream events for consumers.
//!
//! This module provides [`ChatEvent`], which represents the meaningful
//! moments of a chat response, and [`Completion`], the payload of the final
//! `done` frame.

use serde_json::Value;

use crate::config::ChatId;

/// The payload of a `done` frame.
///
/// The server sends the chat (for a new chat) or the stored user message
/// (for a follow-up) as JSON. A payload that is not valid JSON still
/// completes the stream; it is kept verbatim as [`Completion::Fallback`].
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// The payload parsed as JSON.
    Parsed(Value),
    /// The payload was not valid JSON.
    Fallback {
        /// The payload text, as received.
        raw: String,
    },
}

impl Completion {
    /// Parse a `done` payload. Never fails.
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => Completion::Parsed(value),
            Err(e) => {
                tracing::debug!(error = %e, "done payload is not JSON, using raw text");
                Completion::Fallback {
                    raw: raw.to_string(),
                }
            }
        }
    }

    /// Whether the payload could not be parsed.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Completion::Fallback { .. })
    }

    /// The parsed JSON, if any.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Completion::Parsed(value) => Some(value),
            Completion::Fallback { .. } => None,
        }
    }

    /// The payload as JSON; a fallback is wrapped as
    /// `{"chat_uuid": "<text>"}`.
    pub fn to_value(&self) -> Value {
        match self {
            Completion::Parsed(value) => value.clone(),
            Completion::Fallback { raw } => serde_json::json!({ "chat_uuid": raw }),
        }
    }

    /// The raw text of a fallback payload.
    pub fn fallback_text(&self) -> Option<&str> {
        match self {
            Completion::Fallback { raw } => Some(raw),
            Completion::Parsed(_) => None,
        }
    }

    /// The chat id: the `chat_uuid` field of a parsed payload, or the
    /// trimmed text of a fallback.
    pub fn chat_id(&self) -> Option<ChatId> {
        match self {
            Completion::Parsed(_) => self.str_field("chat_uuid").map(ChatId::new),
            Completion::Fallback { raw } => {
                Some(raw.trim()).filter(|s| !s.is_empty()).map(ChatId::new)
            }
        }
    }

    /// The `message_uuid` field of a parsed payload (follow-up messages).
    pub fn message_id(&self) -> Option<&str> {
        self.str_field("message_uuid")
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.value()?
            .get(key)?
            .as_str()
            .filter(|s| !s.is_empty())
    }
}

/// A high-level chat stream event.
///
/// # Event Order
///
/// 1. `Chunk` - zero or more, in the order the server sent them
/// 2. `Complete` - at most once, always last
///
/// A stream that fails yields an `Err` item instead of `Complete`.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// A partial text chunk (`event: message`), delivered as received.
    Chunk(String),
    /// The completion payload (`event: done`).
    Complete(Completion),
}

impl ChatEvent {
    /// Check if this is a text chunk.
    pub fn is_chunk(&self) -> bool {
        matches!(self, ChatEvent::Chunk(_))
    }

    /// Check if this is the completion event.
    pub fn is_complete(&self) -> bool {
        matches!(self, ChatEvent::Complete(_))
    }

    /// Get text from a Chunk event.
    pub fn text(&self) -> Option<&str> {
        match self {
            ChatEvent::Chunk(text) => Some(text),
            _ => None,
        }
    }

    /// Get the completion if this is a Complete event.
    pub fn as_complete(&self) -> Option<&Completion> {
        match self {
            ChatEvent::Complete(c) => Some(c),
            _ => None,
        }
    }
}
