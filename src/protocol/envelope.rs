//! The JSON envelope wrapping every non-streaming backend response.

use serde::{Deserialize, Serialize};

/// `{status, message?, error?, data?}` as produced by the backend.
///
/// Successful responses carry `message` and optionally `data`; failures
/// carry `error`. Missing fields decode as `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    /// The human-readable text of the envelope: `error` first, then `message`.
    pub fn text(&self) -> Option<&str> {
        self.error.as_deref().or(self.message.as_deref())
    }
}

/// Extract the error text from a failed response body.
///
/// Falls back to the trimmed raw body when it is not an envelope.
pub(crate) fn error_text(body: &str) -> String {
    match serde_json::from_str::<ApiEnvelope<serde_json::Value>>(body) {
        Ok(envelope) => envelope
            .text()
            .map(str::to_string)
            .unwrap_or_else(|| body.trim().to_string()),
        Err(_) => body.trim().to_string(),
    }
}
