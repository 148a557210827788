//! The context engine
//!
//! Update commits follow a strict sequence: fetch, deep-copy, apply,
//! validate, swap. There is no await between validation and the swap, so
//! a cancelled task can never leave a half-committed context behind.

use crate::{ContextError, ContextEvent};
use chrono::Utc;
use serde_json::{json, Value};
use specflow_consistency::{apply_updates, ConsistencyValidator};
use specflow_symbolic::{SymbolicEngine, SymbolicError};
use specflow_types::{
    ConsistencyStatus, ContextId, ContextUpdate, Project, ProjectContext, SymbolicReference,
};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::{broadcast, Mutex};
use tracing::{info, instrument, warn};

/// Map key of the symbolic entry seeded for every new context
pub const PROJECT_REQUIREMENTS_KEY: &str = "project_requirements";
/// Map key of the reference seeded alongside it
pub const REQUIREMENTS_REF_KEY: &str = "requirements_ref";

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Engine owning all project contexts and their update logs
pub struct ContextEngine {
    contexts: RwLock<HashMap<ContextId, ProjectContext>>,
    update_log: RwLock<HashMap<ContextId, Vec<ContextUpdate>>>,
    /// Serializes every mutation across every context
    mutation_lock: Mutex<()>,
    symbolic: Arc<SymbolicEngine>,
    validator: ConsistencyValidator,
    events: broadcast::Sender<ContextEvent>,
}

impl ContextEngine {
    pub fn new() -> Self {
        Self::with_symbolic_engine(Arc::new(SymbolicEngine::new()))
    }

    /// Create an engine around an existing symbolic engine
    pub fn with_symbolic_engine(symbolic: Arc<SymbolicEngine>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            contexts: RwLock::new(HashMap::new()),
            update_log: RwLock::new(HashMap::new()),
            mutation_lock: Mutex::new(()),
            symbolic,
            validator: ConsistencyValidator::new(),
            events,
        }
    }

    /// Subscribe to commit notifications
    pub fn subscribe(&self) -> broadcast::Receiver<ContextEvent> {
        self.events.subscribe()
    }

    // ── Context lifecycle ────────────────────────────────────────────

    /// Create the context for a project, seeded with a symbolic entry
    /// for the project requirements and a reference pointing at it.
    #[instrument(skip(self, project), fields(project_id = %project.id))]
    pub async fn create_context(&self, project: &Project) -> Result<ProjectContext, ContextError> {
        let _guard = self.mutation_lock.lock().await;

        let mut context = ProjectContext::new(
            project.id.clone(),
            format!("Context for {}", project.name),
        )
        .with_description(format!("Spec-driven context for project {}", project.name));
        context.read_access = vec![project.id.clone()];
        context.write_access = vec![project.id.clone()];

        let seed = json!({
            "name": project.name,
            "description": project.description,
            "stakeholders": project.stakeholders,
            "requirements": project.technical_constraints,
        });
        let requirements_symbolic = self
            .symbolic
            .create_symbolic_representation(seed)
            .map_err(|_| ContextError::Lock)?;

        context.symbolic_data.insert(
            PROJECT_REQUIREMENTS_KEY.to_string(),
            requirements_symbolic,
        );
        context.symbolic_references.insert(
            REQUIREMENTS_REF_KEY.to_string(),
            SymbolicReference::new(
                REQUIREMENTS_REF_KEY,
                PROJECT_REQUIREMENTS_KEY,
                PROJECT_REQUIREMENTS_KEY,
            )
            .with_target_id(project.id.clone()),
        );

        let context_id = context.id.clone();
        {
            let mut contexts = self.contexts.write().map_err(|_| ContextError::Lock)?;
            contexts.insert(context_id.clone(), context.clone());
        }
        {
            let mut log = self.update_log.write().map_err(|_| ContextError::Lock)?;
            log.insert(context_id.clone(), Vec::new());
        }

        info!(context_id = %context_id, "context created");
        let _ = self.events.send(ContextEvent::Created {
            context_id: context_id.clone(),
        });

        Ok(context)
    }

    /// Apply a batch of updates atomically.
    ///
    /// Either every update commits and the context's version advances
    /// once per update, or the batch is rejected with the full violation
    /// list and the stored context is byte-for-byte unchanged.
    #[instrument(skip(self, updates), fields(context_id = %context_id, batch = updates.len()))]
    pub async fn update_context(
        &self,
        context_id: &ContextId,
        mut updates: Vec<ContextUpdate>,
    ) -> Result<(), ContextError> {
        let _guard = self.mutation_lock.lock().await;

        let mut candidate = {
            let contexts = self.contexts.read().map_err(|_| ContextError::Lock)?;
            contexts
                .get(context_id)
                .cloned()
                .ok_or_else(|| ContextError::NotFound(context_id.clone()))?
        };

        apply_updates(&mut candidate, &updates);

        let violations = self.validator.find_inconsistencies(&candidate);
        if !violations.is_empty() {
            warn!(
                context_id = %context_id,
                violations = violations.len(),
                "update batch rejected"
            );
            return Err(ContextError::Inconsistent { violations });
        }

        candidate.consistency_status = ConsistencyStatus::Consistent;

        // Commit point: no await between validation and the swap.
        {
            let mut contexts = self.contexts.write().map_err(|_| ContextError::Lock)?;
            contexts.insert(context_id.clone(), candidate);
        }

        let update_ids: Vec<_> = updates.iter().map(|u| u.id.clone()).collect();
        let kinds: Vec<_> = updates.iter().map(|u| u.kind()).collect();
        {
            let mut log = self.update_log.write().map_err(|_| ContextError::Lock)?;
            let entries = log.entry(context_id.clone()).or_default();
            for update in &mut updates {
                update.mark_processed();
                entries.push(update.clone());
            }
        }

        info!(context_id = %context_id, applied = update_ids.len(), "update batch committed");
        let _ = self.events.send(ContextEvent::Updated {
            context_id: context_id.clone(),
            update_ids,
            kinds,
        });

        Ok(())
    }

    /// Current committed value; `None` for an unknown id
    pub fn get_context(&self, context_id: &ContextId) -> Option<ProjectContext> {
        self.contexts
            .read()
            .ok()
            .and_then(|contexts| contexts.get(context_id).cloned())
    }

    /// Alias of [`ContextEngine::get_context`]
    pub fn retrieve_context(&self, context_id: &ContextId) -> Option<ProjectContext> {
        self.get_context(context_id)
    }

    /// Processed updates applied to a context, oldest first
    pub fn update_log(&self, context_id: &ContextId) -> Vec<ContextUpdate> {
        self.update_log
            .read()
            .ok()
            .and_then(|log| log.get(context_id).cloned())
            .unwrap_or_default()
    }

    /// Re-validate a stored context and flag it when violations exist.
    ///
    /// Flags only; the graph is never repaired here. Returns the
    /// violation list so callers can react.
    #[instrument(skip(self), fields(context_id = %context_id))]
    pub async fn maintain_symbolic_consistency(
        &self,
        context_id: &ContextId,
    ) -> Result<Vec<String>, ContextError> {
        let _guard = self.mutation_lock.lock().await;

        let mut context = {
            let contexts = self.contexts.read().map_err(|_| ContextError::Lock)?;
            contexts
                .get(context_id)
                .cloned()
                .ok_or_else(|| ContextError::NotFound(context_id.clone()))?
        };

        let violations = self.validator.find_inconsistencies(&context);
        context.last_consistency_check = Some(Utc::now());
        if violations.is_empty() {
            context.consistency_status = ConsistencyStatus::Consistent;
            context.consistency_errors.clear();
        } else {
            warn!(
                context_id = %context_id,
                violations = violations.len(),
                "context flagged for resolution"
            );
            context.consistency_status = ConsistencyStatus::Resolving;
            context.consistency_errors = violations.clone();
            let _ = self.events.send(ContextEvent::InconsistencyFlagged {
                context_id: context_id.clone(),
                violation_count: violations.len(),
            });
        }

        let mut contexts = self.contexts.write().map_err(|_| ContextError::Lock)?;
        contexts.insert(context_id.clone(), context);

        Ok(violations)
    }

    // ── Symbolic passthroughs ────────────────────────────────────────

    pub fn create_symbolic_representation(
        &self,
        data: Value,
    ) -> Result<specflow_types::SymbolicData, SymbolicError> {
        self.symbolic.create_symbolic_representation(data)
    }

    pub fn resolve_symbolic_reference(
        &self,
        reference: &mut SymbolicReference,
    ) -> Result<Value, SymbolicError> {
        self.symbolic.resolve_symbolic_reference(reference)
    }

    pub fn apply_cognitive_tool(&self, name: &str, input: Value) -> Result<Value, SymbolicError> {
        self.symbolic.apply_cognitive_tool(name, input)
    }

    pub fn chain_cognitive_tools(
        &self,
        names: &[&str],
        input: Value,
    ) -> Result<Value, SymbolicError> {
        self.symbolic.chain_cognitive_tools(names, input)
    }
}

impl Default for ContextEngine {
    fn default() -> Self {
        Self::new()
    }
}
