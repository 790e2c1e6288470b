//! API error taxonomy

use reqwest::StatusCode;
use serde::Deserialize;

/// Error types for calls against the platform API
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 401 from an authenticated call; the session was already logged out
    #[error("Authentication expired")]
    AuthExpired,

    /// 403 with reason `suspended`; the session was already logged out
    #[error("Account suspended")]
    AccountSuspended,

    /// Any other non-success status
    #[error("Request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    /// The request did not complete in time
    #[error("Request timed out")]
    Timeout,

    /// Connection, TLS or protocol failure
    #[error("Transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The body was not the JSON we expected
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Bad URL or form input, caught before sending
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// Failures the session layer already handled by logging out.
    ///
    /// Callers should not present these as errors.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ApiError::AuthExpired | ApiError::AccountSuspended)
    }

    /// HTTP status, when the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::AuthExpired => Some(StatusCode::UNAUTHORIZED.as_u16()),
            ApiError::AccountSuspended => Some(StatusCode::FORBIDDEN.as_u16()),
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Transport(e)
        }
    }
}

/// Error body shape used by the API: `{message}`, `{error}` and, for
/// suspensions, `{reason}`
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl ErrorBody {
    pub fn parse(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_default()
    }

    pub fn is_suspension(&self) -> bool {
        self.reason.as_deref() == Some("suspended")
    }

    pub fn into_message(self, status: StatusCode) -> String {
        self.message
            .or(self.error)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string())
    }
}
