use std::time::Duration;

/// Errors that can occur when using libaigents.
///
/// Errors are organized by category:
/// - Configuration and input errors: detected before any network activity
/// - Transport errors: the request or the response body failed
/// - Stream errors: the chat stream ended badly or the server reported an error frame
/// - Runtime errors: timeouts, authentication and local storage failures
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    // -------------------------------------------------------------------------
    // Configuration and input errors
    // -------------------------------------------------------------------------
    /// Invalid configuration provided to builder.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Caller-supplied input was rejected before sending anything.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    // -------------------------------------------------------------------------
    // Transport errors
    // -------------------------------------------------------------------------
    /// The HTTP request could not be sent or its response could not be read.
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The server answered with a non-success status.
    ///
    /// `message` holds the `error`/`message` field of the JSON envelope when
    /// present, otherwise the raw body text (possibly empty).
    #[error("HTTP error! status: {status}{}", fmt_detail(.message))]
    Http { status: u16, message: String },

    /// Reading the chat response body failed mid-stream.
    #[error("stream read error: {0}")]
    StreamRead(String),

    // -------------------------------------------------------------------------
    // Stream errors
    // -------------------------------------------------------------------------
    /// The chat stream ended without a `done` or `error` frame.
    #[error("stream closed before a done or error event was received")]
    StreamClosed,

    /// The server sent an `error` frame.
    #[error("server error: {message}")]
    Server { message: String },

    /// A response was well-formed but lacked data the operation requires.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    // -------------------------------------------------------------------------
    // Protocol errors
    // -------------------------------------------------------------------------
    /// Failed to parse JSON from a response or the project store.
    #[error("failed to parse JSON: {message}")]
    JsonParse {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    // -------------------------------------------------------------------------
    // Runtime errors
    // -------------------------------------------------------------------------
    /// No response arrived before the startup deadline.
    #[error("request timed out after {0:?} (AI service may not be ready yet)")]
    Timeout(Duration),

    /// Authentication failed or the session could not be refreshed.
    #[error("authentication failed: {message}")]
    Auth { message: String },

    /// No project with the given id exists in the store.
    #[error("project not found: {id}")]
    ProjectNotFound { id: String },

    /// IO error reading or writing the project store.
    #[error("IO error: {0}")]
    Io(#[source] std::io::Error),

    /// The operation was cancelled by the caller.
    #[error("request cancelled")]
    Cancelled,
}

/// A specialized Result type for libaigents operations.
pub type Result<T> = std::result::Result<T, Error>;

fn fmt_detail(message: &str) -> String {
    if message.is_empty() {
        String::new()
    } else {
        format!(" ({message})")
    }
}

impl Error {
    /// Create a JSON parse error with context.
    pub fn json_parse(source: serde_json::Error, raw: &str) -> Self {
        Self::JsonParse {
            message: format!(
                "at position {}: {}",
                source.column(),
                raw.chars().take(100).collect::<String>()
            ),
            source,
        }
    }

    /// Create an IO error.
    pub fn io(source: std::io::Error) -> Self {
        Self::Io(source)
    }

    /// The HTTP status attached to this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Http { status, .. } => Some(*status),
            Error::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if this error is related to authentication.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            Error::Auth { .. } | Error::Http { status: 401 | 403, .. }
        )
    }

    /// Check if this error was caused by the startup deadline.
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Timeout(_) => true,
            Error::Network(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Check if this error is retryable.
    ///
    /// Retry policy belongs to the caller; nothing in this crate retries on
    /// its own except the single session refresh after a 401.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Timeout(_) | Error::Network(_) | Error::StreamRead(_) | Error::StreamClosed => {
                true
            }
            Error::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::JsonParse {
            message: err.to_string(),
            source: err,
        }
    }
}
