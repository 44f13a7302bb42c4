//! Error types for query dispatch.

use cortex_core::error::CortexError;

use crate::state::DispatchState;

/// Errors from the dispatcher.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("invalid dispatch transition: {0} -> {1}")]
    InvalidTransition(DispatchState, DispatchState),
}

impl From<ChatError> for CortexError {
    fn from(err: ChatError) -> Self {
        CortexError::Chat(err.to_string())
    }
}
