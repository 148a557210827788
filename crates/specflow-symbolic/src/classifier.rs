//! Structural classification of concrete data
//!
//! Classification is keyed on the runtime shape of the value: objects
//! are inspected for well-known marker keys, arrays become collections,
//! strings become text, and everything else is primitive.

use sha2::{Digest, Sha256};
use specflow_types::SymbolicKind;
use serde_json::Value;

/// Classify a JSON value into the closed symbolic-kind union
pub fn classify(data: &Value) -> SymbolicKind {
    match data {
        Value::Object(map) => {
            if map.contains_key("openapi") || map.contains_key("endpoints") {
                SymbolicKind::ApiSpecification
            } else if map.contains_key("requirements") || map.contains_key("features") {
                SymbolicKind::Requirements
            } else if map.contains_key("architecture") || map.contains_key("components") {
                SymbolicKind::Architecture
            } else if map.contains_key("implementation") || map.contains_key("code") {
                SymbolicKind::Implementation
            } else {
                SymbolicKind::GenericData
            }
        }
        Value::Array(_) => SymbolicKind::Collection,
        Value::String(_) => SymbolicKind::Text,
        _ => SymbolicKind::Primitive,
    }
}

/// Derive a symbolic name for a value.
///
/// `name`/`title` fields are used verbatim; an `id` field yields
/// `{kind}_{id}`; anything else gets a synthetic name from the kind and
/// a content hash.
pub fn symbolic_name_for(data: &Value, kind: SymbolicKind) -> String {
    if let Value::Object(map) = data {
        if let Some(name) = map.get("name").and_then(Value::as_str) {
            return name.to_string();
        }
        if let Some(title) = map.get("title").and_then(Value::as_str) {
            return title.to_string();
        }
        if let Some(id) = map.get("id") {
            return format!("{}_{}", kind, render_scalar(id));
        }
    }
    format!("{}_{}", kind, content_digest(data))
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Short stable digest of a value's serialized form
fn content_digest(data: &Value) -> String {
    let serialized = data.to_string();
    let digest = Sha256::digest(serialized.as_bytes());
    let hex = format!("{:x}", digest);
    hex[..8].to_string()
}
