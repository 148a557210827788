//! Workflow Orchestrator for Specflow
//!
//! Advances projects through the fixed phase order. Transitions are
//! validated against the canonical [`specflow_types::Phase::ORDER`]
//! (forward or in place, never backward), stamped into immutable
//! [`specflow_types::WorkflowTransition`] records, and produce a fresh
//! [`specflow_types::WorkflowState`] per phase.
//!
//! Starting a project's first workflow creates its backing context
//! through the context engine and binds the context id to both the
//! workflow and the project.

#![deny(unsafe_code)]

mod dependencies;
mod error;
mod events;
mod orchestrator;

pub use dependencies::phase_dependency_names;
pub use error::WorkflowError;
pub use events::WorkflowEvent;
pub use orchestrator::{WorkflowOrchestrator, WorkflowStatusSummary};
