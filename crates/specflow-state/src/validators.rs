//! Per-phase state validators
//!
//! One validator per phase, registered by name. The shipped validators
//! always pass and only name the checks a real implementation would
//! perform; each slot can be replaced independently without touching
//! the others.

use specflow_types::{Phase, WorkflowState};
use std::collections::BTreeMap;

/// Result of running one phase validator
#[derive(Clone, Debug, PartialEq)]
pub struct PhaseValidation {
    pub valid: bool,
    /// Names of the checks this validator performs
    pub checks: Vec<String>,
    pub errors: Vec<String>,
}

impl PhaseValidation {
    pub fn ok(checks: &[&str]) -> Self {
        Self {
            valid: true,
            checks: checks.iter().map(|c| c.to_string()).collect(),
            errors: Vec::new(),
        }
    }

    pub fn failed(checks: &[&str], errors: Vec<String>) -> Self {
        Self {
            valid: false,
            checks: checks.iter().map(|c| c.to_string()).collect(),
            errors,
        }
    }
}

/// A named validator for one phase's state
pub trait PhaseValidator: Send + Sync {
    fn name(&self) -> &str;

    fn validate(&self, state: &WorkflowState) -> PhaseValidation;
}

/// Always-valid validator naming the checks its phase will eventually
/// perform
pub struct StubPhaseValidator {
    name: String,
    checks: Vec<&'static str>,
}

impl StubPhaseValidator {
    pub fn new(phase: Phase, checks: Vec<&'static str>) -> Self {
        Self {
            name: format!("phase_{}", phase),
            checks,
        }
    }
}

impl PhaseValidator for StubPhaseValidator {
    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self, _state: &WorkflowState) -> PhaseValidation {
        PhaseValidation::ok(&self.checks)
    }
}

/// The default registry: one stub per phase, keyed by validator name
pub fn default_validators() -> BTreeMap<String, Box<dyn PhaseValidator>> {
    let stubs: Vec<StubPhaseValidator> = vec![
        StubPhaseValidator::new(Phase::Discovery, vec!["basic_structure", "project_context"]),
        StubPhaseValidator::new(
            Phase::Planning,
            vec!["requirements_defined", "stakeholders_identified"],
        ),
        StubPhaseValidator::new(
            Phase::Architecture,
            vec!["architecture_designed", "components_defined"],
        ),
        StubPhaseValidator::new(Phase::Design, vec!["api_specs_created", "interfaces_defined"]),
        StubPhaseValidator::new(
            Phase::Development,
            vec!["code_implemented", "tests_written"],
        ),
        StubPhaseValidator::new(Phase::Testing, vec!["tests_passed", "quality_validated"]),
        StubPhaseValidator::new(
            Phase::Deployment,
            vec!["deployment_ready", "monitoring_configured"],
        ),
        StubPhaseValidator::new(
            Phase::Completed,
            vec!["all_phases_completed", "deliverables_ready"],
        ),
    ];

    stubs
        .into_iter()
        .map(|v| (v.name().to_string(), Box::new(v) as Box<dyn PhaseValidator>))
        .collect()
}
