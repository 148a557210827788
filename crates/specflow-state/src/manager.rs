//! The state manager
//!
//! Keeps the current state per workflow plus an append-only history of
//! every state it has seen. Updates validate on a copy before they
//! commit; a failed validation leaves the stored state untouched.

use crate::{default_validators, PhaseValidation, PhaseValidator, StateError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use specflow_types::{AgentId, Phase, WorkflowId, WorkflowState};
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;
use tokio::sync::Mutex;
use tracing::{info, instrument};

/// Typed patch applied to a workflow state.
///
/// Only the populated fields change; everything else keeps its value.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StateUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase_data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_agents: Option<Vec<AgentId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_agents: Option<Vec<AgentId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_tasks: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_tasks: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_tasks: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub satisfied_dependencies: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_dependencies: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_approvals: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_decisions: Option<Vec<String>>,
}

impl StateUpdate {
    pub fn with_pending_tasks(mut self, tasks: Vec<String>) -> Self {
        self.pending_tasks = Some(tasks);
        self
    }

    pub fn with_active_tasks(mut self, tasks: Vec<String>) -> Self {
        self.active_tasks = Some(tasks);
        self
    }

    pub fn with_completed_tasks(mut self, tasks: Vec<String>) -> Self {
        self.completed_tasks = Some(tasks);
        self
    }

    pub fn with_phase_data(mut self, phase_data: Value) -> Self {
        self.phase_data = Some(phase_data);
        self
    }

    fn apply(&self, state: &mut WorkflowState) {
        if let Some(phase_data) = &self.phase_data {
            state.phase_data = phase_data.clone();
        }
        if let Some(agents) = &self.active_agents {
            state.active_agents = agents.clone();
        }
        if let Some(agents) = &self.completed_agents {
            state.completed_agents = agents.clone();
        }
        if let Some(tasks) = &self.pending_tasks {
            state.pending_tasks = tasks.clone();
        }
        if let Some(tasks) = &self.active_tasks {
            state.active_tasks = tasks.clone();
        }
        if let Some(tasks) = &self.completed_tasks {
            state.completed_tasks = tasks.clone();
        }
        if let Some(deps) = &self.satisfied_dependencies {
            state.satisfied_dependencies = deps.clone();
        }
        if let Some(deps) = &self.pending_dependencies {
            state.pending_dependencies = deps.clone();
        }
        if let Some(approvals) = &self.user_approvals {
            state.user_approvals = approvals.clone();
        }
        if let Some(decisions) = &self.pending_decisions {
            state.pending_decisions = decisions.clone();
        }
        state.updated_at = Utc::now();
    }
}

/// Read-only dashboard summary of one workflow's tracked state
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StateSummary {
    pub workflow_id: WorkflowId,
    pub current_phase: Phase,
    pub phase_started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase_completed_at: Option<DateTime<Utc>>,
    pub active_agents: Vec<AgentId>,
    pub completed_agents: Vec<AgentId>,
    pub pending_tasks: usize,
    pub active_tasks: usize,
    pub completed_tasks: usize,
    pub satisfied_dependencies: usize,
    pub pending_dependencies: usize,
    pub user_approvals: usize,
    pub pending_decisions: usize,
    pub total_states: usize,
}

/// Outcome of running every registered validator against a state
#[derive(Clone, Debug)]
pub struct StateValidation {
    pub valid: bool,
    pub results: BTreeMap<String, PhaseValidation>,
}

/// Independent workflow state tracker
pub struct StateManager {
    states: RwLock<HashMap<WorkflowId, WorkflowState>>,
    history: RwLock<HashMap<WorkflowId, Vec<WorkflowState>>>,
    /// Serializes state mutations
    mutation_lock: Mutex<()>,
    validators: BTreeMap<String, Box<dyn PhaseValidator>>,
}

impl StateManager {
    pub fn new() -> Self {
        Self::with_validators(default_validators())
    }

    /// Create a manager with a custom validator registry
    pub fn with_validators(validators: BTreeMap<String, Box<dyn PhaseValidator>>) -> Self {
        Self {
            states: RwLock::new(HashMap::new()),
            history: RwLock::new(HashMap::new()),
            mutation_lock: Mutex::new(()),
            validators,
        }
    }

    // ── State lifecycle ──────────────────────────────────────────────

    /// Create and track a new state for a workflow phase
    #[instrument(skip(self), fields(workflow_id = %workflow_id, phase = %phase))]
    pub async fn create_state(
        &self,
        workflow_id: &WorkflowId,
        phase: Phase,
    ) -> Result<WorkflowState, StateError> {
        let _guard = self.mutation_lock.lock().await;
        let state = WorkflowState::new(workflow_id.clone(), phase);
        self.commit(workflow_id, state.clone())?;
        info!(state_id = %state.id, "state created");
        Ok(state)
    }

    /// Current tracked state; `None` for an unknown workflow
    pub fn get_state(&self, workflow_id: &WorkflowId) -> Option<WorkflowState> {
        self.states
            .read()
            .ok()
            .and_then(|states| states.get(workflow_id).cloned())
    }

    /// Every state this manager has tracked for a workflow, oldest first
    pub fn state_history(&self, workflow_id: &WorkflowId) -> Vec<WorkflowState> {
        self.history
            .read()
            .ok()
            .and_then(|history| history.get(workflow_id).cloned())
            .unwrap_or_default()
    }

    /// Apply a patch to the current state.
    ///
    /// The patch is validated on a copy; a failed validation leaves the
    /// stored state untouched.
    #[instrument(skip(self, update), fields(workflow_id = %workflow_id))]
    pub async fn update_state(
        &self,
        workflow_id: &WorkflowId,
        update: StateUpdate,
    ) -> Result<WorkflowState, StateError> {
        let _guard = self.mutation_lock.lock().await;

        let mut candidate = self
            .get_state(workflow_id)
            .ok_or_else(|| StateError::NotFound(workflow_id.clone()))?;
        update.apply(&mut candidate);

        self.check_state(&candidate)?;
        self.commit(workflow_id, candidate.clone())?;
        Ok(candidate)
    }

    /// Transition the tracked state to a new phase.
    ///
    /// Legality follows the canonical phase order: forward or in place,
    /// never backward. The outgoing state is stamped complete and a
    /// fresh state is created for the new phase.
    #[instrument(skip(self, transition_data), fields(workflow_id = %workflow_id, to = %new_phase))]
    pub async fn transition_state(
        &self,
        workflow_id: &WorkflowId,
        new_phase: Phase,
        transition_data: Option<Value>,
    ) -> Result<WorkflowState, StateError> {
        let _guard = self.mutation_lock.lock().await;

        let current = self
            .get_state(workflow_id)
            .ok_or_else(|| StateError::NotFound(workflow_id.clone()))?;

        if !current.current_phase.can_transition_to(new_phase) {
            return Err(StateError::InvalidTransition {
                from: current.current_phase,
                to: new_phase,
            });
        }

        // Stamp the outgoing state in place and keep it in history.
        let mut outgoing = current;
        outgoing.complete_phase();
        {
            let mut history = self.history.write().map_err(|_| StateError::Lock)?;
            history
                .entry(workflow_id.clone())
                .or_default()
                .push(outgoing);
        }

        let new_state = WorkflowState::new(workflow_id.clone(), new_phase)
            .with_phase_data(transition_data.unwrap_or(Value::Null));
        self.commit(workflow_id, new_state.clone())?;

        info!(state_id = %new_state.id, "state transitioned");
        Ok(new_state)
    }

    // ── Validation and reporting ─────────────────────────────────────

    /// Run every registered validator against the current state
    pub fn validate_state(&self, workflow_id: &WorkflowId) -> Result<StateValidation, StateError> {
        let state = self
            .get_state(workflow_id)
            .ok_or_else(|| StateError::NotFound(workflow_id.clone()))?;

        let mut results = BTreeMap::new();
        for (name, validator) in &self.validators {
            results.insert(name.clone(), validator.validate(&state));
        }
        let valid = results.values().all(|r| r.valid);
        Ok(StateValidation { valid, results })
    }

    /// Dashboard summary derived read-only from the tracked state
    pub fn get_state_summary(&self, workflow_id: &WorkflowId) -> Option<StateSummary> {
        let state = self.get_state(workflow_id)?;
        let total_states = self.state_history(workflow_id).len();

        Some(StateSummary {
            workflow_id: state.workflow_id.clone(),
            current_phase: state.current_phase,
            phase_started_at: state.phase_started_at,
            phase_completed_at: state.phase_completed_at,
            active_agents: state.active_agents.clone(),
            completed_agents: state.completed_agents.clone(),
            pending_tasks: state.pending_tasks.len(),
            active_tasks: state.active_tasks.len(),
            completed_tasks: state.completed_tasks.len(),
            satisfied_dependencies: state.satisfied_dependencies.len(),
            pending_dependencies: state.pending_dependencies.len(),
            user_approvals: state.user_approvals.len(),
            pending_decisions: state.pending_decisions.len(),
            total_states,
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Basic structural checks plus the phase-specific validator
    fn check_state(&self, state: &WorkflowState) -> Result<(), StateError> {
        if state.workflow_id.as_str().is_empty() {
            return Err(StateError::InvalidState("missing workflow id".into()));
        }
        if state.phase_started_at > Utc::now() {
            return Err(StateError::InvalidState(
                "phase start timestamp is in the future".into(),
            ));
        }

        let key = format!("phase_{}", state.current_phase);
        if let Some(validator) = self.validators.get(&key) {
            let result = validator.validate(state);
            if !result.valid {
                return Err(StateError::InvalidState(result.errors.join("; ")));
            }
        }
        Ok(())
    }

    fn commit(&self, workflow_id: &WorkflowId, state: WorkflowState) -> Result<(), StateError> {
        {
            let mut states = self.states.write().map_err(|_| StateError::Lock)?;
            states.insert(workflow_id.clone(), state.clone());
        }
        let mut history = self.history.write().map_err(|_| StateError::Lock)?;
        history.entry(workflow_id.clone()).or_default().push(state);
        Ok(())
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}
