//! Context data model
//!
//! A `ProjectContext` is the shared, versioned knowledge object for one
//! project. It holds four free-form maps (requirements, specifications,
//! architecture, implementation) plus a symbolic graph: typed
//! `SymbolicData` entries and `SymbolicReference` pointers into them.
//!
//! Invariants enforced by the consistency validator:
//! - every parent/child/related symbolic id resolves within the same
//!   context's `symbolic_data` map;
//! - every reference's `symbolic_name` is a key of `symbolic_data`;
//! - `version_history.len() == version - 1` and
//!   `update_history.len() == version_history.len()`;
//! - `created_at <= updated_at`.
//!
//! All maps are `BTreeMap` so validator diagnostics come out in a stable
//! order.

use crate::{AgentId, ContextId, ProjectId, UpdateId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// ── Classification enums ─────────────────────────────────────────────

/// Closed classification of symbolic data
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolicKind {
    ApiSpecification,
    Requirements,
    Architecture,
    Implementation,
    Collection,
    Text,
    Primitive,
    GenericData,
}

impl SymbolicKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolicKind::ApiSpecification => "api_specification",
            SymbolicKind::Requirements => "requirements",
            SymbolicKind::Architecture => "architecture",
            SymbolicKind::Implementation => "implementation",
            SymbolicKind::Collection => "collection",
            SymbolicKind::Text => "text",
            SymbolicKind::Primitive => "primitive",
            SymbolicKind::GenericData => "generic_data",
        }
    }
}

impl std::fmt::Display for SymbolicKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a context came to exist
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContextKind {
    #[default]
    SpecDriven,
    Legacy,
    Migrated,
}

/// Consistency lifecycle of a context
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyStatus {
    #[default]
    Pending,
    Consistent,
    Resolving,
    Inconsistent,
}

// ── Symbolic graph ───────────────────────────────────────────────────

/// A typed, named wrapper around concrete data
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SymbolicData {
    /// Unique symbolic identifier (fresh UUID)
    pub symbolic_id: String,
    pub symbolic_kind: SymbolicKind,
    pub symbolic_name: String,
    /// The opaque concrete payload
    pub concrete_data: Value,
    /// Derived structural summary, shape depends on the kind
    pub symbolic_representation: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_symbolic_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub child_symbolic_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_symbolic_ids: Vec<String>,
    /// Snapshot of how/when this entry was created
    pub creation_context: Value,
    pub created_at: DateTime<Utc>,
}

impl SymbolicData {
    pub fn new(
        kind: SymbolicKind,
        name: impl Into<String>,
        concrete_data: Value,
        representation: Value,
    ) -> Self {
        Self {
            symbolic_id: uuid::Uuid::new_v4().to_string(),
            symbolic_kind: kind,
            symbolic_name: name.into(),
            concrete_data,
            symbolic_representation: representation,
            parent_symbolic_id: None,
            child_symbolic_ids: Vec::new(),
            related_symbolic_ids: Vec::new(),
            creation_context: Value::Null,
            created_at: Utc::now(),
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_symbolic_id = Some(parent_id.into());
        self
    }

    pub fn with_child(mut self, child_id: impl Into<String>) -> Self {
        self.child_symbolic_ids.push(child_id.into());
        self
    }

    pub fn with_related(mut self, related_id: impl Into<String>) -> Self {
        self.related_symbolic_ids.push(related_id.into());
        self
    }

    pub fn with_creation_context(mut self, creation_context: Value) -> Self {
        self.creation_context = creation_context;
        self
    }
}

/// A pointer to symbolic data, resolvable to a concrete value
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SymbolicReference {
    /// Unique reference identifier
    pub reference_id: String,
    pub reference_type: String,
    /// Must match a key of the owning context's `symbolic_data` map
    pub symbolic_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_id: Option<ProjectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_path: Option<String>,
    pub resolved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution_data: Option<Value>,
    pub created_at: DateTime<Utc>,
}

impl SymbolicReference {
    pub fn new(
        reference_id: impl Into<String>,
        reference_type: impl Into<String>,
        symbolic_name: impl Into<String>,
    ) -> Self {
        Self {
            reference_id: reference_id.into(),
            reference_type: reference_type.into(),
            symbolic_name: symbolic_name.into(),
            target_id: None,
            target_path: None,
            resolved: false,
            resolved_at: None,
            resolution_data: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_target_id(mut self, target_id: ProjectId) -> Self {
        self.target_id = Some(target_id);
        self
    }

    pub fn with_target_path(mut self, target_path: impl Into<String>) -> Self {
        self.target_path = Some(target_path.into());
        self
    }
}

// ── Context updates ──────────────────────────────────────────────────

/// Which part of a context an update targets
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateKind {
    Requirements,
    Specifications,
    Architecture,
    Implementation,
    SymbolicData,
    SymbolicReferences,
}

impl UpdateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateKind::Requirements => "requirements",
            UpdateKind::Specifications => "specifications",
            UpdateKind::Architecture => "architecture",
            UpdateKind::Implementation => "implementation",
            UpdateKind::SymbolicData => "symbolic_data",
            UpdateKind::SymbolicReferences => "symbolic_references",
        }
    }
}

impl std::fmt::Display for UpdateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The data carried by an update, routed by target map.
///
/// Later updates in a batch overwrite earlier ones on key collision;
/// merges are shallow by key.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum UpdatePayload {
    Requirements(BTreeMap<String, Value>),
    Specifications(BTreeMap<String, Value>),
    Architecture(BTreeMap<String, Value>),
    Implementation(BTreeMap<String, Value>),
    SymbolicData(BTreeMap<String, SymbolicData>),
    SymbolicReferences(BTreeMap<String, SymbolicReference>),
}

impl UpdatePayload {
    pub fn kind(&self) -> UpdateKind {
        match self {
            UpdatePayload::Requirements(_) => UpdateKind::Requirements,
            UpdatePayload::Specifications(_) => UpdateKind::Specifications,
            UpdatePayload::Architecture(_) => UpdateKind::Architecture,
            UpdatePayload::Implementation(_) => UpdateKind::Implementation,
            UpdatePayload::SymbolicData(_) => UpdateKind::SymbolicData,
            UpdatePayload::SymbolicReferences(_) => UpdateKind::SymbolicReferences,
        }
    }
}

/// Who proposed an update
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", content = "id", rename_all = "snake_case")]
pub enum UpdateSource {
    Agent(AgentId),
    User(String),
    System,
}

/// One proposed change to a context.
///
/// Updates are applied in batches; a batch either commits in full or is
/// rejected in full.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContextUpdate {
    pub id: UpdateId,
    pub context_id: ContextId,
    pub payload: UpdatePayload,
    pub source: UpdateSource,
    pub processed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ContextUpdate {
    pub fn new(context_id: ContextId, payload: UpdatePayload, source: UpdateSource) -> Self {
        Self {
            id: UpdateId::generate(),
            context_id,
            payload,
            source,
            processed: false,
            processed_at: None,
            created_at: Utc::now(),
        }
    }

    /// Shorthand for a requirements merge from the system
    pub fn requirements(context_id: ContextId, data: BTreeMap<String, Value>) -> Self {
        Self::new(
            context_id,
            UpdatePayload::Requirements(data),
            UpdateSource::System,
        )
    }

    pub fn kind(&self) -> UpdateKind {
        self.payload.kind()
    }

    /// Stamp this update as applied
    pub fn mark_processed(&mut self) {
        self.processed = true;
        self.processed_at = Some(Utc::now());
    }
}

// ── Version history ──────────────────────────────────────────────────

/// One entry per version bump; the histories always track the version
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VersionRecord {
    /// The version the context reached with this bump
    pub version: u64,
    pub update_id: UpdateId,
    pub recorded_at: DateTime<Utc>,
}

// ── Project context ──────────────────────────────────────────────────

/// The shared, versioned knowledge object for one project
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProjectContext {
    pub id: ContextId,
    pub name: String,
    pub description: String,
    pub project_id: ProjectId,
    pub context_kind: ContextKind,

    pub requirements: BTreeMap<String, Value>,
    pub specifications: BTreeMap<String, Value>,
    pub architecture: BTreeMap<String, Value>,
    pub implementation: BTreeMap<String, Value>,

    pub symbolic_data: BTreeMap<String, SymbolicData>,
    pub symbolic_references: BTreeMap<String, SymbolicReference>,

    /// Monotonically increasing, starts at 1
    pub version: u64,
    /// One record per version bump; length is always `version - 1`
    pub version_history: Vec<VersionRecord>,
    /// Ids of applied updates; tracks `version_history` one to one
    pub update_history: Vec<UpdateId>,

    pub consistency_status: ConsistencyStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub consistency_errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_consistency_check: Option<DateTime<Utc>>,

    pub read_access: Vec<ProjectId>,
    pub write_access: Vec<ProjectId>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectContext {
    pub fn new(project_id: ProjectId, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ContextId::generate(),
            name: name.into(),
            description: String::new(),
            project_id,
            context_kind: ContextKind::default(),
            requirements: BTreeMap::new(),
            specifications: BTreeMap::new(),
            architecture: BTreeMap::new(),
            implementation: BTreeMap::new(),
            symbolic_data: BTreeMap::new(),
            symbolic_references: BTreeMap::new(),
            version: 1,
            version_history: Vec::new(),
            update_history: Vec::new(),
            consistency_status: ConsistencyStatus::default(),
            consistency_errors: Vec::new(),
            last_consistency_check: None,
            read_access: Vec::new(),
            write_access: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Look up a symbolic entry by its map key
    pub fn symbolic_entry(&self, key: &str) -> Option<&SymbolicData> {
        self.symbolic_data.get(key)
    }

    /// Look up a symbolic reference by its map key
    pub fn reference(&self, key: &str) -> Option<&SymbolicReference> {
        self.symbolic_references.get(key)
    }
}
