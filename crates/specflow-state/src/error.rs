//! Error types for the state manager

use specflow_types::{Phase, WorkflowId};

/// Errors from state tracking operations
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("state not found for workflow: {0}")]
    NotFound(WorkflowId),

    #[error("invalid transition from {from} to {to}")]
    InvalidTransition { from: Phase, to: Phase },

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("lock poisoned")]
    Lock,
}
