//! Dispatcher state machine.
//!
//! Idle -> Classifying -> AwaitingRemote -> Rendering -> Idle
//! Classifying -> Rendering (no remote call needed)
//! Any state -> Idle (abandon)

use serde::Serialize;

use crate::error::ChatError;

/// Where the dispatcher is in handling the current query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchState {
    Idle,
    Classifying,
    AwaitingRemote,
    Rendering,
}

impl DispatchState {
    pub fn is_busy(self) -> bool {
        self != DispatchState::Idle
    }
}

impl std::fmt::Display for DispatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DispatchState::Idle => "idle",
            DispatchState::Classifying => "classifying",
            DispatchState::AwaitingRemote => "awaiting-remote",
            DispatchState::Rendering => "rendering",
        };
        write!(f, "{}", s)
    }
}

/// Validate that a state transition is allowed.
pub fn validate_transition(from: DispatchState, to: DispatchState) -> Result<(), ChatError> {
    let valid = matches!(
        (from, to),
        (DispatchState::Idle, DispatchState::Classifying)
            | (DispatchState::Classifying, DispatchState::AwaitingRemote)
            | (DispatchState::Classifying, DispatchState::Rendering)
            | (DispatchState::AwaitingRemote, DispatchState::AwaitingRemote)
            | (DispatchState::AwaitingRemote, DispatchState::Rendering)
            | (DispatchState::Rendering, DispatchState::AwaitingRemote)
            | (_, DispatchState::Idle)
    );

    if valid {
        Ok(())
    } else {
        Err(ChatError::InvalidTransition(from, to))
    }
}
