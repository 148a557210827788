//! Workflow instances, per-phase state snapshots, and transition records
//!
//! A `WorkflowInstance` tracks one project's progress through the phase
//! order. Every phase change produces an immutable `WorkflowTransition`
//! audit record and a fresh `WorkflowState`; superseded states are
//! retained in history and never mutated again.

use crate::{AgentId, ArtifactId, ContextId, Phase, ProjectId, StateId, TransitionId, WorkflowId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

// ── Workflow status ──────────────────────────────────────────────────

/// The lifecycle state of a workflow instance
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    #[default]
    Pending,
    Active,
    Paused,
    Completed,
    Failed,
    Cancelled,
}

impl WorkflowStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkflowStatus::Completed | WorkflowStatus::Failed | WorkflowStatus::Cancelled
        )
    }
}

// ── Workflow instance ────────────────────────────────────────────────

/// One entry of a workflow's phase audit log
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PhaseChange {
    pub from: Phase,
    pub to: Phase,
    pub at: DateTime<Utc>,
    pub reason: String,
}

/// The live, phase-tracking execution object for one project
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkflowInstance {
    pub id: WorkflowId,
    pub name: String,
    pub project_id: ProjectId,
    pub workflow_kind: String,
    pub status: WorkflowStatus,
    /// Only ever moves forward or stays equal
    pub current_phase: Phase,
    /// Append-only, in transition order
    pub completed_phases: Vec<Phase>,
    pub phase_history: Vec<PhaseChange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_id: Option<StateId>,
    pub state_history: Vec<StateId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_id: Option<ContextId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assigned_agents: Vec<AgentId>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub agent_roles: HashMap<AgentId, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifact_ids: Vec<ArtifactId>,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_completion: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl WorkflowInstance {
    pub fn new(project_id: ProjectId, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: WorkflowId::generate(),
            name: name.into(),
            project_id,
            workflow_kind: "spec_driven".to_string(),
            status: WorkflowStatus::Pending,
            current_phase: Phase::Discovery,
            completed_phases: Vec::new(),
            phase_history: Vec::new(),
            state_id: None,
            state_history: Vec::new(),
            context_id: None,
            assigned_agents: Vec::new(),
            agent_roles: HashMap::new(),
            artifact_ids: Vec::new(),
            started_at: now,
            actual_completion: None,
            updated_at: now,
        }
    }

    /// Mark the workflow active
    pub fn start(&mut self) {
        self.status = WorkflowStatus::Active;
        self.started_at = Utc::now();
        self.updated_at = self.started_at;
    }

    /// Apply a validated transition: the previous phase moves into
    /// `completed_phases` and the audit log gains an entry.
    pub fn record_transition(&mut self, transition: &WorkflowTransition) {
        let previous = self.current_phase;
        self.completed_phases.push(previous);
        self.phase_history.push(PhaseChange {
            from: transition.from_phase,
            to: transition.to_phase,
            at: transition.started_at,
            reason: transition.trigger_reason.clone(),
        });
        self.current_phase = transition.to_phase;
        self.updated_at = Utc::now();
    }

    /// Rebind the current state snapshot
    pub fn bind_state(&mut self, state_id: StateId) {
        self.state_history.push(state_id.clone());
        self.state_id = Some(state_id);
        self.updated_at = Utc::now();
    }

    pub fn assign_agent(&mut self, agent_id: AgentId, role: impl Into<String>) {
        if !self.assigned_agents.contains(&agent_id) {
            self.assigned_agents.push(agent_id.clone());
        }
        self.agent_roles.insert(agent_id, role.into());
        self.updated_at = Utc::now();
    }

    /// Mark the workflow completed
    pub fn complete(&mut self) {
        self.status = WorkflowStatus::Completed;
        self.actual_completion = Some(Utc::now());
        self.updated_at = Utc::now();
    }

    pub fn is_active(&self) -> bool {
        self.status == WorkflowStatus::Active
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Completed phases as a fraction of the full phase order
    pub fn progress_percentage(&self) -> f64 {
        self.completed_phases.len() as f64 / Phase::COUNT as f64 * 100.0
    }
}

// ── Workflow state ───────────────────────────────────────────────────

/// Per-phase snapshot of task, agent, and dependency bookkeeping.
///
/// A new state is created on every phase transition; the superseded one
/// keeps its final values forever.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkflowState {
    pub id: StateId,
    pub workflow_id: WorkflowId,
    pub current_phase: Phase,
    pub phase_started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase_completed_at: Option<DateTime<Utc>>,
    pub phase_data: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub active_agents: Vec<AgentId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub completed_agents: Vec<AgentId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pending_tasks: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub active_tasks: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub completed_tasks: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub satisfied_dependencies: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pending_dependencies: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub user_approvals: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pending_decisions: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

impl WorkflowState {
    pub fn new(workflow_id: WorkflowId, phase: Phase) -> Self {
        let now = Utc::now();
        Self {
            id: StateId::generate(),
            workflow_id,
            current_phase: phase,
            phase_started_at: now,
            phase_completed_at: None,
            phase_data: Value::Null,
            active_agents: Vec::new(),
            completed_agents: Vec::new(),
            pending_tasks: Vec::new(),
            active_tasks: Vec::new(),
            completed_tasks: Vec::new(),
            satisfied_dependencies: Vec::new(),
            pending_dependencies: Vec::new(),
            user_approvals: Vec::new(),
            pending_decisions: Vec::new(),
            updated_at: now,
        }
    }

    pub fn with_phase_data(mut self, phase_data: Value) -> Self {
        self.phase_data = phase_data;
        self
    }

    /// Stamp the outgoing state when its phase is left
    pub fn complete_phase(&mut self) {
        self.phase_completed_at = Some(Utc::now());
        self.updated_at = Utc::now();
    }
}

// ── Workflow transition ──────────────────────────────────────────────

/// Immutable audit record of one phase change
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkflowTransition {
    pub id: TransitionId,
    pub workflow_id: WorkflowId,
    pub from_phase: Phase,
    pub to_phase: Phase,
    pub triggered_by: String,
    pub trigger_reason: String,
    pub dependencies_satisfied: bool,
    pub validation_passed: bool,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl WorkflowTransition {
    pub fn new(
        workflow_id: WorkflowId,
        from_phase: Phase,
        to_phase: Phase,
        triggered_by: impl Into<String>,
        trigger_reason: impl Into<String>,
    ) -> Self {
        Self {
            id: TransitionId::generate(),
            workflow_id,
            from_phase,
            to_phase,
            triggered_by: triggered_by.into(),
            trigger_reason: trigger_reason.into(),
            dependencies_satisfied: false,
            validation_passed: false,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn complete(&mut self) {
        self.completed_at = Some(Utc::now());
    }
}
