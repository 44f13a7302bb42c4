//! Error types for calls to the warehouse and the Cortex agent.

use cortex_core::error::CortexError;

/// Errors from remote calls.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("not logged in")]
    NotAuthenticated,
    #[error("authentication failed: {0}")]
    Authentication(String),
    #[error("failed request with status {status}: {body}")]
    Http { status: u16, body: String },
    #[error("API returned an empty response")]
    EmptyBody,
    #[error("request timed out after {0} seconds")]
    Timeout(u64),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("statement failed: {0}")]
    Statement(String),
    #[error("no SQL statement to execute")]
    EmptyStatement,
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("result has no column named {0}")]
    MissingColumn(String),
}

impl RemoteError {
    /// Map a reqwest error, distinguishing timeouts.
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            RemoteError::Timeout(timeout_secs)
        } else if err.is_decode() {
            RemoteError::Decode(err.to_string())
        } else {
            RemoteError::Transport(err.to_string())
        }
    }
}

impl From<RemoteError> for CortexError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Authentication(msg) => CortexError::Authentication(msg),
            other => CortexError::Remote(other.to_string()),
        }
    }
}
