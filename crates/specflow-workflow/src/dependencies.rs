//! Declared phase dependencies
//!
//! Each phase names the milestone expected before entering it. These
//! are declared but not evaluated: transitions record
//! `dependencies_satisfied = true` unconditionally, and callers that
//! want real gating must check the named milestones themselves.

use specflow_types::Phase;

/// Dependency names declared for entering a phase
pub fn phase_dependency_names(phase: Phase) -> &'static [&'static str] {
    match phase {
        Phase::Discovery => &[],
        Phase::Planning => &["discovery_complete"],
        Phase::Architecture => &["planning_complete"],
        Phase::Design => &["architecture_complete"],
        Phase::Development => &["design_complete"],
        Phase::Testing => &["development_complete"],
        Phase::Deployment => &["testing_complete"],
        Phase::Completed => &["deployment_complete"],
    }
}
