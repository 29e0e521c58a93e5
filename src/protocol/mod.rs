//! JSON protocol types for the AIgents backend.
//!
//! This module defines the request bodies sent to the backend and the
//! envelope its non-streaming responses are wrapped in. The streaming chat
//! responses are SSE, handled by [`crate::stream`].
//!
//! # Example
//!
//! ```
//! use libaigents::protocol::ApiEnvelope;
//!
//! let json = r#"{"status": 200, "message": "(*) Login successful."}"#;
//! let envelope: ApiEnvelope<serde_json::Value> = serde_json::from_str(json).unwrap();
//! assert_eq!(envelope.text(), Some("(*) Login successful."));
//! ```

mod envelope;
mod messages;

pub use envelope::ApiEnvelope;
pub(crate) use envelope::error_text;
pub use messages::{AgentLookup, AgentPage, CreateChatRequest, Credentials, SendMessageRequest};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_types_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ApiEnvelope<serde_json::Value>>();
        assert_send_sync::<CreateChatRequest>();
        assert_send_sync::<SendMessageRequest>();
        assert_send_sync::<Credentials>();
    }
}
