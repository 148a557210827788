//! Error types for the workflow orchestrator

use specflow_context::ContextError;
use specflow_types::{Phase, WorkflowId};

/// Errors from workflow orchestration
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("workflow not found: {0}")]
    NotFound(WorkflowId),

    /// The requested phase is behind the current one; the workflow is
    /// left unchanged.
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition { from: Phase, to: Phase },

    #[error("context error: {0}")]
    Context(#[from] ContextError),

    #[error("lock poisoned")]
    Lock,
}
