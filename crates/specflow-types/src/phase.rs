//! Project lifecycle phases
//!
//! The phase order is defined exactly once, here. Both the workflow
//! orchestrator and the state manager validate transitions against this
//! single definition; transitions may move forward or stay in place,
//! never backward.

use serde::{Deserialize, Serialize};

/// One ordered stage of the fixed project lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Discovery,
    Planning,
    Architecture,
    Design,
    Development,
    Testing,
    Deployment,
    Completed,
}

impl Phase {
    /// The canonical phase order, first to last
    pub const ORDER: [Phase; 8] = [
        Phase::Discovery,
        Phase::Planning,
        Phase::Architecture,
        Phase::Design,
        Phase::Development,
        Phase::Testing,
        Phase::Deployment,
        Phase::Completed,
    ];

    /// Total number of phases
    pub const COUNT: usize = Self::ORDER.len();

    /// Position of this phase in the canonical order
    pub fn index(&self) -> usize {
        match self {
            Phase::Discovery => 0,
            Phase::Planning => 1,
            Phase::Architecture => 2,
            Phase::Design => 3,
            Phase::Development => 4,
            Phase::Testing => 5,
            Phase::Deployment => 6,
            Phase::Completed => 7,
        }
    }

    /// Whether a transition from this phase to `target` is allowed.
    ///
    /// Forward moves (including skips) and staying in place are valid;
    /// backward moves are not.
    pub fn can_transition_to(&self, target: Phase) -> bool {
        target.index() >= self.index()
    }

    /// The phase after this one, if any
    pub fn next(&self) -> Option<Phase> {
        Self::ORDER.get(self.index() + 1).copied()
    }

    /// Whether this is the final phase
    pub fn is_final(&self) -> bool {
        matches!(self, Phase::Completed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Discovery => "discovery",
            Phase::Planning => "planning",
            Phase::Architecture => "architecture",
            Phase::Design => "design",
            Phase::Development => "development",
            Phase::Testing => "testing",
            Phase::Deployment => "deployment",
            Phase::Completed => "completed",
        }
    }

    /// Parse a lowercase phase name. Returns `None` for unrecognized
    /// names; callers at external boundaries map that to their own
    /// invalid-transition errors.
    pub fn parse(s: &str) -> Option<Phase> {
        Self::ORDER.iter().copied().find(|p| p.as_str() == s)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
