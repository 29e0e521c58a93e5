//! Type-safe identifiers and endpoint paths for the AIgents backend.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of an agent in the catalog (`agent_uuid` on the wire).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub String);

/// Identifier of a chat conversation (`chat_uuid` on the wire).
///
/// Created server-side on the first message of a chat and passed through
/// unchanged on every later message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub String);

macro_rules! opaque_id {
    ($name:ident) => {
        impl $name {
            /// Create a new identifier from a string.
            pub fn new(id: impl Into<String>) -> Self {
                $name(id.into())
            }

            /// Get the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Whether the identifier is empty or whitespace.
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

opaque_id!(AgentId);
opaque_id!(ChatId);

/// Request paths on the backend, relative to the base URL.
///
/// Defaults match the AIgents server routes. Override them when the
/// backend is mounted under a prefix such as `/api/v1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Start a chat with an agent (SSE response).
    pub create_chat: String,
    /// Send a message to an existing chat (SSE response).
    pub send_message: String,
    /// Create an account.
    pub signup: String,
    /// Log in; the server sets the session cookies.
    pub login: String,
    /// Check whether the session cookies are still valid.
    pub check: String,
    /// Exchange the refresh cookie for a new access cookie.
    pub refresh: String,
    /// End the session.
    pub logout: String,
    /// List agents (paged).
    pub list_agents: String,
    /// Fetch one agent.
    pub get_agent: String,
    /// Create an agent.
    pub create_agent: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            create_chat: "/chat/create".into(),
            send_message: "/chat/send-new-message".into(),
            signup: "/auth/create".into(),
            login: "/auth/login".into(),
            check: "/auth/check".into(),
            refresh: "/auth/refresh".into(),
            logout: "/auth/logout".into(),
            list_agents: "/agents/all".into(),
            get_agent: "/agents/get".into(),
            create_agent: "/agents/create".into(),
        }
    }
}

impl Endpoints {
    /// Whether a 401 from `path` must be returned as-is instead of
    /// triggering a session refresh.
    pub(crate) fn skips_refresh(&self, path: &str) -> bool {
        path == self.check || path == self.refresh
    }
}
