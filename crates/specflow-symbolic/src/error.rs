//! Error types for the symbolic engine

/// Errors from symbolic engine operations
#[derive(Debug, thiserror::Error)]
pub enum SymbolicError {
    #[error("unknown cognitive tool: {0}")]
    UnknownTool(String),

    #[error("reference resolution failed: {0}")]
    Resolution(String),

    #[error("lock poisoned")]
    Lock,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let e = SymbolicError::UnknownTool("summarize".into());
        assert!(format!("{}", e).contains("summarize"));
    }
}
