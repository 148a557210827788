//! Events emitted by the orchestrator
//!
//! Agent notification is fire-and-forget: a committed transition stays
//! committed whether or not anyone is listening.

use specflow_types::{Phase, WorkflowId};

/// Events broadcast after workflow mutations commit
#[derive(Debug, Clone)]
pub enum WorkflowEvent {
    /// A workflow was started
    Started { workflow_id: WorkflowId },

    /// A workflow moved to a new phase
    PhaseChanged {
        workflow_id: WorkflowId,
        from: Phase,
        to: Phase,
    },
}
