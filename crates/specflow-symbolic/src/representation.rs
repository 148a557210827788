//! Type-specific structural summaries
//!
//! The symbolic representation of a value is a compact summary shaped by
//! its kind: API specifications surface their paths and components,
//! requirements their features and constraints, and so on. Values of no
//! recognized kind get a generic structure analysis.

use specflow_types::SymbolicKind;
use serde_json::{json, Value};

/// Build the symbolic representation for a value of a known kind
pub fn representation_for(data: &Value, kind: SymbolicKind) -> Value {
    match kind {
        SymbolicKind::ApiSpecification => api_specification_summary(data),
        SymbolicKind::Requirements => requirements_summary(data),
        SymbolicKind::Architecture => architecture_summary(data),
        SymbolicKind::Implementation => implementation_summary(data),
        _ => generic_summary(data),
    }
}

fn api_specification_summary(data: &Value) -> Value {
    json!({
        "type": "api_specification",
        "version": data.get("openapi").cloned().unwrap_or_else(|| json!("unknown")),
        "info": data.get("info").cloned().unwrap_or_else(|| json!({})),
        "paths": object_keys(data.get("paths")),
        "components": object_keys(data.get("components")),
        "security": data.get("security").cloned().unwrap_or_else(|| json!([])),
        "tags": data.get("tags").cloned().unwrap_or_else(|| json!([])),
    })
}

fn requirements_summary(data: &Value) -> Value {
    json!({
        "type": "requirements",
        "features": field_or_empty_list(data, "features"),
        "constraints": field_or_empty_list(data, "constraints"),
        "stakeholders": field_or_empty_list(data, "stakeholders"),
        "priorities": field_or_empty_list(data, "priorities"),
    })
}

fn architecture_summary(data: &Value) -> Value {
    json!({
        "type": "architecture",
        "components": field_or_empty_list(data, "components"),
        "layers": field_or_empty_list(data, "layers"),
        "patterns": field_or_empty_list(data, "patterns"),
        "technologies": field_or_empty_list(data, "technologies"),
    })
}

fn implementation_summary(data: &Value) -> Value {
    json!({
        "type": "implementation",
        "modules": field_or_empty_list(data, "modules"),
        "files": field_or_empty_list(data, "files"),
        "dependencies": field_or_empty_list(data, "dependencies"),
        "tests": field_or_empty_list(data, "tests"),
    })
}

fn generic_summary(data: &Value) -> Value {
    json!({
        "type": "generic",
        "data_type": json_type_name(data),
        "size": data.to_string().len(),
        "structure": analyze_structure(data),
    })
}

/// Shallow structure analysis: key inventory and nesting depth for
/// objects, length and leading item types for arrays, a truncated
/// rendering for scalars.
fn analyze_structure(data: &Value) -> Value {
    match data {
        Value::Object(map) => json!({
            "type": "object",
            "keys": map.keys().collect::<Vec<_>>(),
            "depth": object_depth(data, 0),
        }),
        Value::Array(items) => json!({
            "type": "array",
            "length": items.len(),
            "item_types": items.iter().take(5).map(json_type_name).collect::<Vec<_>>(),
        }),
        other => {
            let rendered = other.to_string();
            let preview: String = rendered.chars().take(100).collect();
            json!({
                "type": json_type_name(other),
                "value": preview,
            })
        }
    }
}

fn object_depth(data: &Value, current: usize) -> usize {
    match data {
        Value::Object(map) if !map.is_empty() => map
            .values()
            .map(|v| match v {
                Value::Object(_) => object_depth(v, current + 1),
                _ => current,
            })
            .max()
            .unwrap_or(current),
        _ => current,
    }
}

fn object_keys(value: Option<&Value>) -> Value {
    match value {
        Some(Value::Object(map)) => json!(map.keys().collect::<Vec<_>>()),
        _ => json!([]),
    }
}

fn field_or_empty_list(data: &Value, field: &str) -> Value {
    data.get(field).cloned().unwrap_or_else(|| json!([]))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_specification_summary() {
        let spec = json!({
            "openapi": "3.1.0",
            "info": {"title": "Payments"},
            "paths": {"/charges": {}, "/refunds": {}},
            "components": {"schemas": {}, "securitySchemes": {}},
            "tags": [{"name": "billing"}],
        });
        let repr = representation_for(&spec, SymbolicKind::ApiSpecification);
        assert_eq!(repr["version"], "3.1.0");
        assert_eq!(repr["paths"], json!(["/charges", "/refunds"]));
        assert_eq!(repr["components"], json!(["schemas", "securitySchemes"]));
        assert_eq!(repr["security"], json!([]));
    }

    #[test]
    fn test_requirements_summary() {
        let data = json!({"features": ["login"], "stakeholders": ["Bob"]});
        let repr = representation_for(&data, SymbolicKind::Requirements);
        assert_eq!(repr["type"], "requirements");
        assert_eq!(repr["features"], json!(["login"]));
        assert_eq!(repr["constraints"], json!([]));
    }

    #[test]
    fn test_generic_summary_object() {
        let data = json!({"a": {"b": {"c": 1}}, "d": 2});
        let repr = representation_for(&data, SymbolicKind::GenericData);
        assert_eq!(repr["type"], "generic");
        assert_eq!(repr["structure"]["type"], "object");
        assert_eq!(repr["structure"]["depth"], 2);
    }

    #[test]
    fn test_generic_summary_array() {
        let repr = representation_for(&json!([1, "two", null]), SymbolicKind::Collection);
        assert_eq!(repr["structure"]["length"], 3);
        assert_eq!(
            repr["structure"]["item_types"],
            json!(["number", "string", "null"])
        );
    }

    #[test]
    fn test_generic_summary_scalar_truncates() {
        let long = "x".repeat(500);
        let repr = representation_for(&json!(long), SymbolicKind::Text);
        let preview = repr["structure"]["value"].as_str().unwrap();
        assert_eq!(preview.chars().count(), 100);
    }
}
