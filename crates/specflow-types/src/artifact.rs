//! Artifacts: content-addressed, versioned deliverables
//!
//! An artifact is addressed by the SHA-256 checksum of its content and
//! carries a `major.minor.patch` version string with an append-only
//! revision history. Relationships (dependencies, related artifacts,
//! supersedes/superseded-by) form a graph maintained by the artifact
//! store.

use crate::{AgentId, ArtifactId, Phase, ProjectId, WorkflowId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Closed classification of artifacts
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Document,
    Code,
    Specification,
    Diagram,
    Test,
    Configuration,
    Data,
    Report,
    Template,
    Other,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Document => "document",
            ArtifactKind::Code => "code",
            ArtifactKind::Specification => "specification",
            ArtifactKind::Diagram => "diagram",
            ArtifactKind::Test => "test",
            ArtifactKind::Configuration => "configuration",
            ArtifactKind::Data => "data",
            ArtifactKind::Report => "report",
            ArtifactKind::Template => "template",
            ArtifactKind::Other => "other",
        }
    }

    /// Best-effort MIME type for this kind of artifact
    pub fn content_type(&self) -> &'static str {
        match self {
            ArtifactKind::Document | ArtifactKind::Report => "text/markdown",
            ArtifactKind::Specification
            | ArtifactKind::Configuration
            | ArtifactKind::Data => "application/json",
            ArtifactKind::Diagram => "image/svg+xml",
            ArtifactKind::Code
            | ArtifactKind::Test
            | ArtifactKind::Template
            | ArtifactKind::Other => "text/plain",
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One superseded version of an artifact
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArtifactRevision {
    /// The version that was replaced
    pub version: String,
    pub recorded_at: DateTime<Utc>,
    pub changes: String,
}

/// A content-addressed, versioned deliverable
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Artifact {
    pub id: ArtifactId,
    pub kind: ArtifactKind,
    pub name: String,
    pub description: String,
    pub content: String,
    /// SHA-256 hex digest of the UTF-8 content bytes
    pub checksum: String,
    pub size_bytes: u64,
    pub content_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
    /// `major.minor.patch` version string
    pub version: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub version_history: Vec<ArtifactRevision>,
    pub project_id: ProjectId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<WorkflowId>,
    pub phase: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_by: Option<AgentId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<ArtifactId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_artifacts: Vec<ArtifactId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supersedes: Vec<ArtifactId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub superseded_by: Option<ArtifactId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
