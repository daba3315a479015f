use thiserror::Error;

/// Maximum number of error body characters surfaced to the user.
pub const MAX_ERROR_CHARS: usize = 200;

/// Errors raised by the client library. Payloads are short, user-facing strings
/// and never carry credential material.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Timeout: {0}")]
    Timeout(String),
    #[error("Not authorized: {0}")]
    Unauthorized(String),
    #[error("Request failed ({status}): {message}")]
    Http { status: u16, message: String },
    #[error("Response error: {0}")]
    Parse(String),
    #[error("Request error: {0}")]
    Serialization(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("{0}")]
    Denied(String),
    #[error("Session expired: {0}")]
    SessionStale(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Failure classes the UI reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network, timeout, malformed response or unexpected server status.
    Transport,
    /// 401-class response; always converted into a session teardown.
    Authorization,
    /// Request rejected before it left the client.
    Validation,
    /// The server explicitly refused a login.
    DecisionDenied,
    /// A restored credential no longer works.
    SessionStale,
}

impl AppError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Unauthorized(_) => ErrorKind::Authorization,
            AppError::Validation(_) | AppError::Serialization(_) => ErrorKind::Validation,
            AppError::Denied(_) => ErrorKind::DecisionDenied,
            AppError::SessionStale(_) => ErrorKind::SessionStale,
            AppError::Config(_)
            | AppError::Network(_)
            | AppError::Timeout(_)
            | AppError::Http { .. }
            | AppError::Parse(_)
            | AppError::Storage(_) => ErrorKind::Transport,
        }
    }

    /// Transport and validation failures can be retried by re-invoking the
    /// same operation. Authorization failures and denials cannot.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Transport | ErrorKind::Validation)
    }

    /// Short message suitable for display; denials are passed through verbatim.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            AppError::Denied(reason) => reason.clone(),
            AppError::Unauthorized(_) | AppError::SessionStale(_) => {
                "Your session has ended. Please sign in again.".to_string()
            }
            AppError::Network(_) | AppError::Timeout(_) => {
                "Unable to reach the server. Please try again.".to_string()
            }
            AppError::Http { message, .. } => message.clone(),
            AppError::Validation(message) => message.clone(),
            AppError::Parse(_) => "Unexpected response from the server. Please try again.".to_string(),
            AppError::Config(message) | AppError::Storage(message) => message.clone(),
            AppError::Serialization(_) => "Unable to prepare the request.".to_string(),
        }
    }
}

/// Fallback shown when an error body carries no usable message.
pub const GENERIC_FAILURE: &str = "Request failed.";

/// Sanitizes HTTP error bodies for user-facing messages. Only a JSON `message`
/// field is surfaced, trimmed and truncated; anything else (HTML error pages,
/// proxy text, stack traces) becomes [`GENERIC_FAILURE`].
#[must_use]
pub fn sanitize_body(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body.trim())
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .and_then(serde_json::Value::as_str)
                .map(str::trim)
                .filter(|message| !message.is_empty())
                .map(|message| message.chars().take(MAX_ERROR_CHARS).collect())
        })
        .unwrap_or_else(|| GENERIC_FAILURE.to_string())
}
