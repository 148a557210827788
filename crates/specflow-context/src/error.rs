//! Error types for the context engine

use specflow_types::ContextId;

/// Errors from context engine operations
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("context not found: {0}")]
    NotFound(ContextId),

    /// The proposed batch would leave the context inconsistent; nothing
    /// was committed.
    #[error("context update rejected: {} violation(s)", violations.len())]
    Inconsistent { violations: Vec<String> },

    #[error("lock poisoned")]
    Lock,
}
