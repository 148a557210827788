//! Typed identifiers
//!
//! Every entity is addressed by a string-backed newtype. Fresh ids are
//! UUID v4; deterministic ids can be constructed from plain strings in
//! tests and at external boundaries.

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn short(&self) -> &str {
                &self.0[..8.min(self.0.len())]
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id!(
    /// Unique identifier for a project
    ProjectId
);
string_id!(
    /// Unique identifier for a project context
    ContextId
);
string_id!(
    /// Unique identifier for a workflow instance
    WorkflowId
);
string_id!(
    /// Unique identifier for a workflow state snapshot
    StateId
);
string_id!(
    /// Unique identifier for a context update
    UpdateId
);
string_id!(
    /// Unique identifier for a phase transition record
    TransitionId
);
string_id!(
    /// Unique identifier for an agent
    AgentId
);
string_id!(
    /// Unique identifier for an artifact
    ArtifactId
);
