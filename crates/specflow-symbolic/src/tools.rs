//! Cognitive tools: named data transformations
//!
//! A cognitive tool takes a JSON value and produces a JSON value. Tools
//! are registered on an engine by name and can be applied singly or
//! folded over a chain, the output of each feeding the next.

use crate::SymbolicError;
use serde_json::Value;

/// A named transformation applied to symbolic input data
pub trait CognitiveTool: Send + Sync {
    fn name(&self) -> &str;

    fn apply(&self, input: Value) -> Result<Value, SymbolicError>;
}

/// Adapter turning a closure into a cognitive tool
pub struct FnTool<F> {
    name: String,
    func: F,
}

impl<F> FnTool<F>
where
    F: Fn(Value) -> Value + Send + Sync,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> CognitiveTool for FnTool<F>
where
    F: Fn(Value) -> Value + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, input: Value) -> Result<Value, SymbolicError> {
        Ok((self.func)(input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fn_tool() {
        let tool = FnTool::new("double", |input: Value| {
            json!(input.as_i64().unwrap_or(0) * 2)
        });
        assert_eq!(tool.name(), "double");
        assert_eq!(tool.apply(json!(21)).unwrap(), json!(42));
    }
}
