//! The workflow orchestrator
//!
//! Mutations serialize on a single orchestrator-wide mutex; reads go to
//! the current committed value without taking it. A rejected transition
//! leaves every store untouched.

use crate::{phase_dependency_names, WorkflowError, WorkflowEvent};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use specflow_context::ContextEngine;
use specflow_types::{
    AgentId, Phase, Project, ProjectId, WorkflowId, WorkflowInstance, WorkflowState,
    WorkflowStatus, WorkflowTransition,
};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::{broadcast, Mutex};
use tracing::{info, instrument, warn};

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Default)]
struct WorkflowStore {
    workflows: HashMap<WorkflowId, WorkflowInstance>,
    /// Current state per workflow
    states: HashMap<WorkflowId, WorkflowState>,
    /// Superseded states, oldest first; never mutated again
    state_archive: HashMap<WorkflowId, Vec<WorkflowState>>,
    transitions: HashMap<WorkflowId, Vec<WorkflowTransition>>,
}

/// Computed status report for one workflow
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkflowStatusSummary {
    pub workflow_id: WorkflowId,
    pub project_id: ProjectId,
    pub current_phase: Phase,
    pub status: WorkflowStatus,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase_started_at: Option<DateTime<Utc>>,
    pub completed_phases: Vec<Phase>,
    pub total_phases: usize,
    pub progress_percentage: f64,
}

/// Orchestrates workflows through the fixed phase order
pub struct WorkflowOrchestrator {
    store: RwLock<WorkflowStore>,
    /// Serializes every workflow mutation process-wide
    mutation_lock: Mutex<()>,
    context_engine: Arc<ContextEngine>,
    events: broadcast::Sender<WorkflowEvent>,
}

impl WorkflowOrchestrator {
    pub fn new(context_engine: Arc<ContextEngine>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            store: RwLock::new(WorkflowStore::default()),
            mutation_lock: Mutex::new(()),
            context_engine,
            events,
        }
    }

    /// Subscribe to phase-change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.events.subscribe()
    }

    /// Engine backing this orchestrator's contexts
    pub fn context_engine(&self) -> &Arc<ContextEngine> {
        &self.context_engine
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Start a workflow for a project.
    ///
    /// The instance begins in the discovery phase with an initial state
    /// snapshot. When the project has no context yet, one is created and
    /// its id bound to both the workflow and the project; persisting the
    /// project's new `context_id` is the caller's responsibility.
    #[instrument(skip(self, project), fields(project_id = %project.id))]
    pub async fn start_workflow(
        &self,
        project: &mut Project,
    ) -> Result<WorkflowInstance, WorkflowError> {
        let _guard = self.mutation_lock.lock().await;

        let mut workflow =
            WorkflowInstance::new(project.id.clone(), format!("Workflow for {}", project.name));
        workflow.start();

        let state = WorkflowState::new(workflow.id.clone(), Phase::Discovery);
        workflow.bind_state(state.id.clone());

        match &project.context_id {
            Some(existing) => workflow.context_id = Some(existing.clone()),
            None => {
                let context = self.context_engine.create_context(project).await?;
                workflow.context_id = Some(context.id.clone());
                project.context_id = Some(context.id);
            }
        }

        let workflow_id = workflow.id.clone();
        {
            let mut store = self.store.write().map_err(|_| WorkflowError::Lock)?;
            store.workflows.insert(workflow_id.clone(), workflow.clone());
            store.states.insert(workflow_id.clone(), state);
            store.state_archive.insert(workflow_id.clone(), Vec::new());
            store.transitions.insert(workflow_id.clone(), Vec::new());
        }

        info!(workflow_id = %workflow_id, "workflow started");
        let _ = self.events.send(WorkflowEvent::Started {
            workflow_id: workflow_id.clone(),
        });

        Ok(workflow)
    }

    /// Move a workflow to a target phase.
    ///
    /// Valid iff the target is at or ahead of the current phase in the
    /// canonical order. On success the outgoing state is stamped
    /// complete, a fresh state is created for the target phase, and an
    /// immutable transition record is appended. On rejection every store
    /// is left unchanged.
    #[instrument(skip(self), fields(workflow_id = %workflow_id, target = %target_phase))]
    pub async fn transition_to_phase(
        &self,
        workflow_id: &WorkflowId,
        target_phase: Phase,
        trigger_reason: &str,
    ) -> Result<WorkflowInstance, WorkflowError> {
        let _guard = self.mutation_lock.lock().await;

        let mut workflow = {
            let store = self.store.read().map_err(|_| WorkflowError::Lock)?;
            store
                .workflows
                .get(workflow_id)
                .cloned()
                .ok_or_else(|| WorkflowError::NotFound(workflow_id.clone()))?
        };

        let from_phase = workflow.current_phase;
        if !from_phase.can_transition_to(target_phase) {
            warn!(
                workflow_id = %workflow_id,
                from = %from_phase,
                to = %target_phase,
                "transition rejected"
            );
            return Err(WorkflowError::InvalidTransition {
                from: from_phase,
                to: target_phase,
            });
        }

        let mut transition = WorkflowTransition::new(
            workflow_id.clone(),
            from_phase,
            target_phase,
            "system",
            trigger_reason,
        );
        // Dependency gating is declared but not evaluated; transitions
        // record both flags as satisfied.
        transition.dependencies_satisfied = true;
        transition.validation_passed = true;

        let new_state = WorkflowState::new(workflow_id.clone(), target_phase);

        workflow.record_transition(&transition);
        workflow.bind_state(new_state.id.clone());
        if target_phase == Phase::Completed {
            workflow.complete();
        }
        transition.complete();

        {
            let mut store = self.store.write().map_err(|_| WorkflowError::Lock)?;
            if let Some(mut outgoing) = store.states.remove(workflow_id) {
                outgoing.complete_phase();
                store
                    .state_archive
                    .entry(workflow_id.clone())
                    .or_default()
                    .push(outgoing);
            }
            store.states.insert(workflow_id.clone(), new_state);
            store
                .transitions
                .entry(workflow_id.clone())
                .or_default()
                .push(transition);
            store.workflows.insert(workflow_id.clone(), workflow.clone());
        }

        info!(
            workflow_id = %workflow_id,
            from = %from_phase,
            to = %target_phase,
            "phase transition committed"
        );
        let _ = self.events.send(WorkflowEvent::PhaseChanged {
            workflow_id: workflow_id.clone(),
            from: from_phase,
            to: target_phase,
        });

        Ok(workflow)
    }

    /// Assign an agent to a workflow with a role
    pub async fn assign_agent_to_workflow(
        &self,
        workflow_id: &WorkflowId,
        agent_id: AgentId,
        role: &str,
    ) -> Result<(), WorkflowError> {
        let _guard = self.mutation_lock.lock().await;

        let mut store = self.store.write().map_err(|_| WorkflowError::Lock)?;
        let workflow = store
            .workflows
            .get_mut(workflow_id)
            .ok_or_else(|| WorkflowError::NotFound(workflow_id.clone()))?;
        workflow.assign_agent(agent_id, role);
        Ok(())
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Current committed instance; `None` for an unknown id
    pub fn get_workflow(&self, workflow_id: &WorkflowId) -> Option<WorkflowInstance> {
        self.store
            .read()
            .ok()
            .and_then(|store| store.workflows.get(workflow_id).cloned())
    }

    /// Current state snapshot of a workflow
    pub fn current_state(&self, workflow_id: &WorkflowId) -> Option<WorkflowState> {
        self.store
            .read()
            .ok()
            .and_then(|store| store.states.get(workflow_id).cloned())
    }

    /// Superseded state snapshots, oldest first
    pub fn state_archive(&self, workflow_id: &WorkflowId) -> Vec<WorkflowState> {
        self.store
            .read()
            .ok()
            .and_then(|store| store.state_archive.get(workflow_id).cloned())
            .unwrap_or_default()
    }

    /// Transition audit records, oldest first
    pub fn transition_history(&self, workflow_id: &WorkflowId) -> Vec<WorkflowTransition> {
        self.store
            .read()
            .ok()
            .and_then(|store| store.transitions.get(workflow_id).cloned())
            .unwrap_or_default()
    }

    /// Computed status report, including progress as a share of the full
    /// phase order
    pub fn get_workflow_status(&self, workflow_id: &WorkflowId) -> Option<WorkflowStatusSummary> {
        let store = self.store.read().ok()?;
        let workflow = store.workflows.get(workflow_id)?;
        let state = store.states.get(workflow_id);

        Some(WorkflowStatusSummary {
            workflow_id: workflow.id.clone(),
            project_id: workflow.project_id.clone(),
            current_phase: workflow.current_phase,
            status: workflow.status,
            started_at: workflow.started_at,
            phase_started_at: state.map(|s| s.phase_started_at),
            completed_phases: workflow.completed_phases.clone(),
            total_phases: Phase::COUNT,
            progress_percentage: workflow.progress_percentage(),
        })
    }

    /// Declared (never evaluated) dependencies for a workflow's current
    /// phase
    pub fn workflow_dependencies(
        &self,
        workflow_id: &WorkflowId,
    ) -> Result<&'static [&'static str], WorkflowError> {
        let workflow = self
            .get_workflow(workflow_id)
            .ok_or_else(|| WorkflowError::NotFound(workflow_id.clone()))?;
        Ok(phase_dependency_names(workflow.current_phase))
    }

    /// Number of known workflows
    pub fn workflow_count(&self) -> usize {
        self.store
            .read()
            .map(|store| store.workflows.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn make_orchestrator() -> WorkflowOrchestrator {
        WorkflowOrchestrator::new(Arc::new(ContextEngine::new()))
    }

    fn make_project() -> Project {
        Project::new("Acme", "Customer portal").unwrap()
    }

    #[tokio::test]
    async fn test_start_workflow_binds_context() {
        let orchestrator = make_orchestrator();
        let mut project = make_project();
        assert!(project.context_id.is_none());

        let workflow = orchestrator.start_workflow(&mut project).await.unwrap();

        assert_eq!(workflow.current_phase, Phase::Discovery);
        assert_eq!(workflow.status, WorkflowStatus::Active);
        assert!(workflow.state_id.is_some());
        assert_eq!(workflow.state_history.len(), 1);

        // The context was created and bound to both sides.
        let context_id = project.context_id.clone().expect("context bound to project");
        assert_eq!(workflow.context_id, Some(context_id.clone()));
        assert!(orchestrator
            .context_engine()
            .get_context(&context_id)
            .is_some());
    }

    #[tokio::test]
    async fn test_start_workflow_reuses_existing_context() {
        let orchestrator = make_orchestrator();
        let mut project = make_project();
        let existing = orchestrator
            .context_engine()
            .create_context(&project)
            .await
            .unwrap();
        project.context_id = Some(existing.id.clone());

        let workflow = orchestrator.start_workflow(&mut project).await.unwrap();
        assert_eq!(workflow.context_id, Some(existing.id));
    }

    #[tokio::test]
    async fn test_transition_forward() {
        let orchestrator = make_orchestrator();
        let mut project = make_project();
        let workflow = orchestrator.start_workflow(&mut project).await.unwrap();

        let updated = orchestrator
            .transition_to_phase(&workflow.id, Phase::Planning, "user")
            .await
            .unwrap();

        assert_eq!(updated.current_phase, Phase::Planning);
        assert!(updated.completed_phases.contains(&Phase::Discovery));
        assert_eq!(updated.phase_history.len(), 1);
        assert_eq!(updated.phase_history[0].reason, "user");
        assert_eq!(updated.state_history.len(), 2);

        // Outgoing state archived with a completion stamp.
        let archive = orchestrator.state_archive(&workflow.id);
        assert_eq!(archive.len(), 1);
        assert_eq!(archive[0].current_phase, Phase::Discovery);
        assert!(archive[0].phase_completed_at.is_some());

        // Fresh state for the new phase.
        let current = orchestrator.current_state(&workflow.id).unwrap();
        assert_eq!(current.current_phase, Phase::Planning);
        assert!(current.phase_completed_at.is_none());

        // Transition audit record.
        let transitions = orchestrator.transition_history(&workflow.id);
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0].from_phase, Phase::Discovery);
        assert_eq!(transitions[0].to_phase, Phase::Planning);
        assert!(transitions[0].dependencies_satisfied);
        assert!(transitions[0].validation_passed);
        assert!(transitions[0].completed_at.is_some());
    }

    #[tokio::test]
    async fn test_forward_skip_allowed() {
        let orchestrator = make_orchestrator();
        let mut project = make_project();
        let workflow = orchestrator.start_workflow(&mut project).await.unwrap();

        let updated = orchestrator
            .transition_to_phase(&workflow.id, Phase::Testing, "fast-track")
            .await
            .unwrap();
        assert_eq!(updated.current_phase, Phase::Testing);
    }

    #[tokio::test]
    async fn test_backward_transition_rejected() {
        let orchestrator = make_orchestrator();
        let mut project = make_project();
        let workflow = orchestrator.start_workflow(&mut project).await.unwrap();
        orchestrator
            .transition_to_phase(&workflow.id, Phase::Testing, "fast-track")
            .await
            .unwrap();

        let err = orchestrator
            .transition_to_phase(&workflow.id, Phase::Planning, "rollback")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::InvalidTransition {
                from: Phase::Testing,
                to: Phase::Planning
            }
        ));

        // Nothing changed.
        let unchanged = orchestrator.get_workflow(&workflow.id).unwrap();
        assert_eq!(unchanged.current_phase, Phase::Testing);
        assert_eq!(orchestrator.transition_history(&workflow.id).len(), 1);
    }

    #[tokio::test]
    async fn test_transition_unknown_workflow() {
        let orchestrator = make_orchestrator();
        let missing = WorkflowId::generate();

        let err = orchestrator
            .transition_to_phase(&missing, Phase::Planning, "user")
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::NotFound(id) if id == missing));
        assert!(orchestrator.get_workflow(&missing).is_none());
    }

    #[tokio::test]
    async fn test_status_summary_progress() {
        let orchestrator = make_orchestrator();
        let mut project = make_project();
        let workflow = orchestrator.start_workflow(&mut project).await.unwrap();

        let status = orchestrator.get_workflow_status(&workflow.id).unwrap();
        assert_eq!(status.total_phases, 8);
        assert_eq!(status.progress_percentage, 0.0);

        orchestrator
            .transition_to_phase(&workflow.id, Phase::Planning, "user")
            .await
            .unwrap();
        orchestrator
            .transition_to_phase(&workflow.id, Phase::Architecture, "user")
            .await
            .unwrap();

        let status = orchestrator.get_workflow_status(&workflow.id).unwrap();
        assert_eq!(status.completed_phases.len(), 2);
        assert_eq!(status.progress_percentage, 25.0);
        assert_eq!(status.current_phase, Phase::Architecture);
    }

    #[tokio::test]
    async fn test_transition_to_completed_finishes_workflow() {
        let orchestrator = make_orchestrator();
        let mut project = make_project();
        let workflow = orchestrator.start_workflow(&mut project).await.unwrap();

        let updated = orchestrator
            .transition_to_phase(&workflow.id, Phase::Completed, "done")
            .await
            .unwrap();
        assert_eq!(updated.status, WorkflowStatus::Completed);
        assert!(updated.actual_completion.is_some());
    }

    #[tokio::test]
    async fn test_assign_agent() {
        let orchestrator = make_orchestrator();
        let mut project = make_project();
        let workflow = orchestrator.start_workflow(&mut project).await.unwrap();

        orchestrator
            .assign_agent_to_workflow(&workflow.id, AgentId::new("qa-1"), "qa")
            .await
            .unwrap();

        let stored = orchestrator.get_workflow(&workflow.id).unwrap();
        assert_eq!(stored.assigned_agents, vec![AgentId::new("qa-1")]);
        assert_eq!(stored.agent_roles.get(&AgentId::new("qa-1")).unwrap(), "qa");
    }

    #[tokio::test]
    async fn test_workflow_dependencies_declared_only() {
        let orchestrator = make_orchestrator();
        let mut project = make_project();
        let workflow = orchestrator.start_workflow(&mut project).await.unwrap();

        assert!(orchestrator
            .workflow_dependencies(&workflow.id)
            .unwrap()
            .is_empty());

        orchestrator
            .transition_to_phase(&workflow.id, Phase::Planning, "user")
            .await
            .unwrap();
        assert_eq!(
            orchestrator.workflow_dependencies(&workflow.id).unwrap(),
            &["discovery_complete"]
        );
    }

    #[tokio::test]
    async fn test_phase_change_event() {
        let orchestrator = make_orchestrator();
        let mut project = make_project();
        let workflow = orchestrator.start_workflow(&mut project).await.unwrap();
        let mut rx = orchestrator.subscribe();

        orchestrator
            .transition_to_phase(&workflow.id, Phase::Planning, "user")
            .await
            .unwrap();

        match rx.recv().await.unwrap() {
            WorkflowEvent::PhaseChanged { workflow_id, from, to } => {
                assert_eq!(workflow_id, workflow.id);
                assert_eq!(from, Phase::Discovery);
                assert_eq!(to, Phase::Planning);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    fn arb_phase() -> impl Strategy<Value = Phase> {
        (0..Phase::COUNT).prop_map(|i| Phase::ORDER[i])
    }

    proptest! {
        #[test]
        fn property_transition_legality_matches_order(from in arb_phase(), to in arb_phase()) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            rt.block_on(async {
                let orchestrator = make_orchestrator();
                let mut project = make_project();
                let workflow = orchestrator.start_workflow(&mut project).await.unwrap();

                // Walk to `from` first (always legal from discovery).
                orchestrator
                    .transition_to_phase(&workflow.id, from, "setup")
                    .await
                    .unwrap();

                let result = orchestrator
                    .transition_to_phase(&workflow.id, to, "probe")
                    .await;
                let stored = orchestrator.get_workflow(&workflow.id).unwrap();

                if to.index() >= from.index() {
                    prop_assert!(result.is_ok());
                    prop_assert_eq!(stored.current_phase, to);
                } else {
                    prop_assert!(
                        matches!(result, Err(WorkflowError::InvalidTransition { .. })),
                        "expected InvalidTransition error"
                    );
                    prop_assert_eq!(stored.current_phase, from);
                }
                Ok(())
            })?;
        }
    }
}
