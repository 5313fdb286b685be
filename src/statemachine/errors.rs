use thiserror::Error;

use super::guards::Guard;
use super::states::{MeldingState, MeldingTransition};

/// Reasons a transition is refused. A refused transition never touches the melding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Unknown transition: {name}")]
    UnknownTransition { name: String },

    #[error("Transition {transition} not allowed from state {state}")]
    TransitionNotAllowed {
        transition: MeldingTransition,
        state: MeldingState,
    },

    #[error("Token invalidated")]
    TokenInvalidated,

    #[error("Token expired")]
    TokenExpired,

    #[error("Guard {guard} failed for transition {transition}")]
    GuardFailed {
        transition: MeldingTransition,
        guard: Guard,
    },
}

impl TransitionError {
    /// Short machine-readable kind, used as a metrics label and in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            TransitionError::UnknownTransition { .. } => "unknown_transition",
            TransitionError::TransitionNotAllowed { .. } => "transition_not_allowed",
            TransitionError::TokenInvalidated => "token_invalidated",
            TransitionError::TokenExpired => "token_expired",
            TransitionError::GuardFailed { .. } => "guard_failed",
        }
    }
}
