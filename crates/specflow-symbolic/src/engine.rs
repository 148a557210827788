//! The symbolic engine
//!
//! Owns a registry of symbolic data, a resolution cache, and a registry
//! of cognitive tools, all instance state behind reader/writer locks,
//! nothing process-wide. Lock poisoning surfaces as
//! [`SymbolicError::Lock`]; no operation awaits while holding a guard.

use crate::{
    classify, representation_for, symbolic_name_for, CognitiveTool, FnTool, PlaceholderResolver,
    ReferenceResolver, SymbolicError,
};
use chrono::Utc;
use serde_json::{json, Value};
use specflow_types::{SymbolicData, SymbolicReference};
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

/// Engine for symbolic representations, reference resolution, and
/// cognitive tools
pub struct SymbolicEngine {
    registry: RwLock<BTreeMap<String, SymbolicData>>,
    resolution_cache: RwLock<HashMap<String, Value>>,
    tools: RwLock<BTreeMap<String, Box<dyn CognitiveTool>>>,
    resolver: Box<dyn ReferenceResolver>,
}

impl SymbolicEngine {
    pub fn new() -> Self {
        Self::with_resolver(Box::new(PlaceholderResolver))
    }

    /// Create an engine with a custom resolution backend
    pub fn with_resolver(resolver: Box<dyn ReferenceResolver>) -> Self {
        Self {
            registry: RwLock::new(BTreeMap::new()),
            resolution_cache: RwLock::new(HashMap::new()),
            tools: RwLock::new(BTreeMap::new()),
            resolver,
        }
    }

    // ── Symbolic representations ─────────────────────────────────────

    /// Create the symbolic representation of a value.
    ///
    /// Classifies the value, derives a symbolic name, builds the
    /// kind-specific structural summary, and registers the result under
    /// a fresh symbolic id.
    pub fn create_symbolic_representation(
        &self,
        data: Value,
    ) -> Result<SymbolicData, SymbolicError> {
        let kind = classify(&data);
        let name = symbolic_name_for(&data, kind);
        let representation = representation_for(&data, kind);
        let creation_context = json!({
            "timestamp": Utc::now().to_rfc3339(),
            "data_type": kind.as_str(),
            "data_size": data.to_string().len(),
        });

        let symbolic = SymbolicData::new(kind, name, data, representation)
            .with_creation_context(creation_context);

        let mut registry = self.registry.write().map_err(|_| SymbolicError::Lock)?;
        registry.insert(symbolic.symbolic_id.clone(), symbolic.clone());

        tracing::debug!(
            symbolic_id = %symbolic.symbolic_id,
            kind = %symbolic.symbolic_kind,
            "symbolic representation created"
        );

        Ok(symbolic)
    }

    /// Look up a registered entry by symbolic id
    pub fn registered(&self, symbolic_id: &str) -> Result<Option<SymbolicData>, SymbolicError> {
        let registry = self.registry.read().map_err(|_| SymbolicError::Lock)?;
        Ok(registry.get(symbolic_id).cloned())
    }

    /// Number of registered entries
    pub fn registry_len(&self) -> Result<usize, SymbolicError> {
        let registry = self.registry.read().map_err(|_| SymbolicError::Lock)?;
        Ok(registry.len())
    }

    // ── Reference resolution ─────────────────────────────────────────

    /// Resolve a reference to its concrete value.
    ///
    /// Cache-first by reference id. On a miss the configured resolver
    /// runs, the result is cached, and the reference is marked resolved
    /// with a timestamp. A second call for the same id returns the
    /// cached value without touching the reference again.
    pub fn resolve_symbolic_reference(
        &self,
        reference: &mut SymbolicReference,
    ) -> Result<Value, SymbolicError> {
        {
            let cache = self
                .resolution_cache
                .read()
                .map_err(|_| SymbolicError::Lock)?;
            if let Some(cached) = cache.get(&reference.reference_id) {
                return Ok(cached.clone());
            }
        }

        let resolved = self.resolver.resolve(reference)?;

        let mut cache = self
            .resolution_cache
            .write()
            .map_err(|_| SymbolicError::Lock)?;
        cache.insert(reference.reference_id.clone(), resolved.clone());

        reference.resolved = true;
        reference.resolved_at = Some(Utc::now());
        reference.resolution_data = Some(json!({"cached": true}));

        Ok(resolved)
    }

    // ── Cognitive tools ──────────────────────────────────────────────

    /// Register a cognitive tool under its own name
    pub fn register_tool(&self, tool: Box<dyn CognitiveTool>) -> Result<(), SymbolicError> {
        let mut tools = self.tools.write().map_err(|_| SymbolicError::Lock)?;
        tools.insert(tool.name().to_string(), tool);
        Ok(())
    }

    /// Register a closure as a cognitive tool
    pub fn register_fn<F>(&self, name: impl Into<String>, func: F) -> Result<(), SymbolicError>
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.register_tool(Box::new(FnTool::new(name, func)))
    }

    /// Apply a named tool to input data
    pub fn apply_cognitive_tool(&self, name: &str, input: Value) -> Result<Value, SymbolicError> {
        let tools = self.tools.read().map_err(|_| SymbolicError::Lock)?;
        let tool = tools
            .get(name)
            .ok_or_else(|| SymbolicError::UnknownTool(name.to_string()))?;
        tool.apply(input)
    }

    /// Fold input through a sequence of tools, left to right
    pub fn chain_cognitive_tools(
        &self,
        names: &[&str],
        input: Value,
    ) -> Result<Value, SymbolicError> {
        let mut current = input;
        for name in names {
            current = self.apply_cognitive_tool(name, current)?;
        }
        Ok(current)
    }
}

impl Default for SymbolicEngine {
    fn default() -> Self {
        Self::new()
    }
}
