//! Reference resolution backends
//!
//! Resolution of a symbolic reference to a concrete value is pluggable.
//! The engine ships with a placeholder backend; deployments wire in a
//! resolver that reaches whatever store actually holds the targets.

use crate::SymbolicError;
use serde_json::{json, Value};
use specflow_types::SymbolicReference;

/// Resolves symbolic references to concrete values
pub trait ReferenceResolver: Send + Sync {
    fn resolve(&self, reference: &SymbolicReference) -> Result<Value, SymbolicError>;
}

/// Default resolver: echoes the reference coordinates back as the
/// resolved value.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlaceholderResolver;

impl ReferenceResolver for PlaceholderResolver {
    fn resolve(&self, reference: &SymbolicReference) -> Result<Value, SymbolicError> {
        Ok(json!({
            "resolved": true,
            "reference_id": reference.reference_id,
            "target_path": reference.target_path,
            "data": format!("Resolved data for {}", reference.symbolic_name),
        }))
    }
}
