//! The artifact store
//!
//! In-memory map of artifacts plus JSON snapshots on disk. Updating an
//! artifact never mutates the prior version object: a fresh version is
//! built, the old version's coordinates go into the revision history,
//! and the store swaps to the new one.

use crate::{detect_framework, detect_language, ArtifactError, FsSnapshotStorage, SnapshotStorage};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use specflow_types::{
    AgentId, Artifact, ArtifactId, ArtifactKind, ArtifactRevision, Phase, ProjectId, WorkflowId,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;
use tokio::sync::Mutex;
use tracing::{info, instrument};

/// Storage configuration for the artifact store
#[derive(Clone, Debug)]
pub struct ArtifactStoreConfig {
    /// Directory JSON snapshots are written under
    pub storage_root: PathBuf,
}

impl Default for ArtifactStoreConfig {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from("./artifacts"),
        }
    }
}

/// Request to create an artifact
#[derive(Clone, Debug)]
pub struct NewArtifact {
    pub kind: ArtifactKind,
    pub name: String,
    pub description: String,
    pub content: String,
    pub project_id: ProjectId,
    pub workflow_id: Option<WorkflowId>,
    pub phase: Phase,
    pub generated_by: Option<AgentId>,
    pub tags: Vec<String>,
}

impl NewArtifact {
    pub fn new(
        kind: ArtifactKind,
        name: impl Into<String>,
        content: impl Into<String>,
        project_id: ProjectId,
        phase: Phase,
    ) -> Self {
        let name = name.into();
        Self {
            kind,
            description: format!("{} artifact", kind),
            name,
            content: content.into(),
            project_id,
            workflow_id: None,
            phase,
            generated_by: None,
            tags: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_workflow(mut self, workflow_id: WorkflowId) -> Self {
        self.workflow_id = Some(workflow_id);
        self
    }

    pub fn with_generator(mut self, agent_id: AgentId) -> Self {
        self.generated_by = Some(agent_id);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

/// Filter for artifact listings; unset fields match everything
#[derive(Clone, Debug, Default)]
pub struct ArtifactFilter {
    pub project_id: Option<ProjectId>,
    pub kind: Option<ArtifactKind>,
    pub phase: Option<Phase>,
}

/// Relationship kinds between artifacts
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactRelation {
    /// The source depends on the target; idempotent
    Dependency,
    /// The artifacts are related; idempotent
    Related,
    /// The source replaces the target; sets `superseded_by` on the
    /// target
    Supersedes,
}

/// Relationship summary for one artifact
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArtifactRelationships {
    pub dependencies: Vec<ArtifactId>,
    pub related: Vec<ArtifactId>,
    pub supersedes: Vec<ArtifactId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub superseded_by: Option<ArtifactId>,
}

/// Aggregate counts over the store
#[derive(Clone, Debug)]
pub struct ArtifactStoreStats {
    pub total: usize,
    pub by_kind: HashMap<String, usize>,
    pub by_phase: HashMap<String, usize>,
}

/// Content-addressed artifact store
pub struct ArtifactStore {
    artifacts: RwLock<HashMap<ArtifactId, Artifact>>,
    /// Serializes artifact mutations
    mutation_lock: Mutex<()>,
    storage: Box<dyn SnapshotStorage>,
}

impl ArtifactStore {
    pub fn new(config: ArtifactStoreConfig) -> Self {
        Self::with_storage(Box::new(FsSnapshotStorage::new(config.storage_root)))
    }

    /// Create a store over a custom snapshot backend
    pub fn with_storage(storage: Box<dyn SnapshotStorage>) -> Self {
        Self {
            artifacts: RwLock::new(HashMap::new()),
            mutation_lock: Mutex::new(()),
            storage,
        }
    }

    // ── Creation and versioning ──────────────────────────────────────

    /// Create an artifact: checksum the content, sniff its shape, store
    /// it at version 1.0.0, and persist a JSON snapshot.
    #[instrument(skip(self, request), fields(name = %request.name, kind = %request.kind))]
    pub async fn create_artifact(&self, request: NewArtifact) -> Result<Artifact, ArtifactError> {
        let _guard = self.mutation_lock.lock().await;

        let now = Utc::now();
        let checksum = content_checksum(&request.content);
        let size_bytes = request.content.len() as u64;
        let (language, framework) = match request.kind {
            ArtifactKind::Code => (
                detect_language(&request.content).map(str::to_string),
                detect_framework(&request.content).map(str::to_string),
            ),
            _ => (None, None),
        };

        let artifact = Artifact {
            id: ArtifactId::generate(),
            kind: request.kind,
            name: request.name,
            description: request.description,
            content: request.content,
            checksum,
            size_bytes,
            content_type: request.kind.content_type().to_string(),
            language,
            framework,
            version: "1.0.0".to_string(),
            version_history: Vec::new(),
            project_id: request.project_id,
            workflow_id: request.workflow_id,
            phase: request.phase,
            generated_by: request.generated_by,
            dependencies: Vec::new(),
            related_artifacts: Vec::new(),
            supersedes: Vec::new(),
            superseded_by: None,
            tags: request.tags,
            created_at: now,
            updated_at: now,
        };

        {
            let mut artifacts = self.artifacts.write().map_err(|_| ArtifactError::Lock)?;
            artifacts.insert(artifact.id.clone(), artifact.clone());
        }
        self.persist(&artifact).await?;

        info!(artifact_id = %artifact.id, "artifact created");
        Ok(artifact)
    }

    /// Create a new version of an artifact.
    ///
    /// The prior version object is never mutated; its coordinates are
    /// recorded in the revision history of the replacement. The patch
    /// component of the version increments, with an append-`.1`
    /// fallback for versions that are not `major.minor.patch` shaped.
    #[instrument(skip(self, content, changes), fields(artifact_id = %artifact_id))]
    pub async fn update_artifact(
        &self,
        artifact_id: &ArtifactId,
        content: String,
        changes: &str,
    ) -> Result<Artifact, ArtifactError> {
        let _guard = self.mutation_lock.lock().await;

        let previous = {
            let artifacts = self.artifacts.read().map_err(|_| ArtifactError::Lock)?;
            artifacts
                .get(artifact_id)
                .cloned()
                .ok_or_else(|| ArtifactError::NotFound(artifact_id.clone()))?
        };

        let mut next = previous.clone();
        next.checksum = content_checksum(&content);
        next.size_bytes = content.len() as u64;
        next.content = content;
        next.version = increment_version(&previous.version);
        next.updated_at = Utc::now();
        next.version_history.push(ArtifactRevision {
            version: previous.version.clone(),
            recorded_at: previous.updated_at,
            changes: changes.to_string(),
        });

        {
            let mut artifacts = self.artifacts.write().map_err(|_| ArtifactError::Lock)?;
            artifacts.insert(artifact_id.clone(), next.clone());
        }
        self.persist(&next).await?;

        info!(artifact_id = %artifact_id, version = %next.version, "artifact updated");
        Ok(next)
    }

    // ── Relationships ────────────────────────────────────────────────

    /// Relate two stored artifacts.
    ///
    /// `Dependency` and `Related` are idempotent. `Supersedes` is
    /// asymmetric: the target gains a `superseded_by` back-pointer.
    pub async fn add_artifact_relationship(
        &self,
        artifact_id: &ArtifactId,
        related_id: &ArtifactId,
        relation: ArtifactRelation,
    ) -> Result<(), ArtifactError> {
        let _guard = self.mutation_lock.lock().await;

        let mut artifacts = self.artifacts.write().map_err(|_| ArtifactError::Lock)?;
        if !artifacts.contains_key(artifact_id) {
            return Err(ArtifactError::NotFound(artifact_id.clone()));
        }
        if !artifacts.contains_key(related_id) {
            return Err(ArtifactError::NotFound(related_id.clone()));
        }

        match relation {
            ArtifactRelation::Dependency => {
                if let Some(source) = artifacts.get_mut(artifact_id) {
                    if !source.dependencies.contains(related_id) {
                        source.dependencies.push(related_id.clone());
                        source.updated_at = Utc::now();
                    }
                }
            }
            ArtifactRelation::Related => {
                if let Some(source) = artifacts.get_mut(artifact_id) {
                    if !source.related_artifacts.contains(related_id) {
                        source.related_artifacts.push(related_id.clone());
                        source.updated_at = Utc::now();
                    }
                }
            }
            ArtifactRelation::Supersedes => {
                if let Some(source) = artifacts.get_mut(artifact_id) {
                    source.supersedes.push(related_id.clone());
                    source.updated_at = Utc::now();
                }
                if let Some(target) = artifacts.get_mut(related_id) {
                    target.superseded_by = Some(artifact_id.clone());
                    target.updated_at = Utc::now();
                }
            }
        }

        Ok(())
    }

    /// Relationship summary for an artifact
    pub fn relationships(&self, artifact_id: &ArtifactId) -> Option<ArtifactRelationships> {
        let artifacts = self.artifacts.read().ok()?;
        let artifact = artifacts.get(artifact_id)?;
        Some(ArtifactRelationships {
            dependencies: artifact.dependencies.clone(),
            related: artifact.related_artifacts.clone(),
            supersedes: artifact.supersedes.clone(),
            superseded_by: artifact.superseded_by.clone(),
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Current version of an artifact; `None` for an unknown id
    pub fn get_artifact(&self, artifact_id: &ArtifactId) -> Option<Artifact> {
        self.artifacts
            .read()
            .ok()
            .and_then(|artifacts| artifacts.get(artifact_id).cloned())
    }

    /// Artifacts matching a filter, newest first
    pub fn list_artifacts(&self, filter: &ArtifactFilter) -> Vec<Artifact> {
        let artifacts = match self.artifacts.read() {
            Ok(artifacts) => artifacts,
            Err(_) => return Vec::new(),
        };

        let mut results: Vec<_> = artifacts
            .values()
            .filter(|a| {
                if let Some(project_id) = &filter.project_id {
                    if &a.project_id != project_id {
                        return false;
                    }
                }
                if let Some(kind) = filter.kind {
                    if a.kind != kind {
                        return false;
                    }
                }
                if let Some(phase) = filter.phase {
                    if a.phase != phase {
                        return false;
                    }
                }
                true
            })
            .cloned()
            .collect();

        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        results
    }

    /// Aggregate counts over everything stored
    pub fn statistics(&self) -> Result<ArtifactStoreStats, ArtifactError> {
        let artifacts = self.artifacts.read().map_err(|_| ArtifactError::Lock)?;

        let total = artifacts.len();
        let mut by_kind: HashMap<String, usize> = HashMap::new();
        let mut by_phase: HashMap<String, usize> = HashMap::new();
        for artifact in artifacts.values() {
            *by_kind.entry(artifact.kind.to_string()).or_insert(0) += 1;
            *by_phase.entry(artifact.phase.to_string()).or_insert(0) += 1;
        }

        Ok(ArtifactStoreStats {
            total,
            by_kind,
            by_phase,
        })
    }

    /// Remove an artifact and its snapshot file. Returns whether it
    /// existed.
    pub async fn delete_artifact(&self, artifact_id: &ArtifactId) -> Result<bool, ArtifactError> {
        let _guard = self.mutation_lock.lock().await;

        let removed = {
            let mut artifacts = self.artifacts.write().map_err(|_| ArtifactError::Lock)?;
            artifacts.remove(artifact_id).is_some()
        };
        if removed {
            self.storage.remove(artifact_id).await?;
        }
        Ok(removed)
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Write the JSON snapshot for an artifact
    async fn persist(&self, artifact: &Artifact) -> Result<(), ArtifactError> {
        self.storage.store(artifact).await
    }
}

/// SHA-256 hex digest of the UTF-8 content bytes
fn content_checksum(content: &str) -> String {
    format!("{:x}", Sha256::digest(content.as_bytes()))
}

/// Increment the patch component of a `major.minor.patch` version.
///
/// Falls back to appending `.1` when the version does not have three
/// dot-separated numeric components.
fn increment_version(version: &str) -> String {
    let parts: Vec<&str> = version.split('.').collect();
    if parts.len() >= 3 {
        if let Ok(patch) = parts[2].parse::<u64>() {
            return format!("{}.{}.{}", parts[0], parts[1], patch + 1);
        }
    }
    format!("{}.1", version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_store() -> (ArtifactStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(ArtifactStoreConfig {
            storage_root: dir.path().to_path_buf(),
        });
        (store, dir)
    }

    fn make_request(name: &str, content: &str) -> NewArtifact {
        NewArtifact::new(
            ArtifactKind::Document,
            name,
            content,
            ProjectId::new("p1"),
            Phase::Design,
        )
    }

    #[tokio::test]
    async fn test_checksum_is_sha256_hex() {
        let (store, _dir) = make_store();
        let artifact = store
            .create_artifact(make_request("greeting", "hello"))
            .await
            .unwrap();

        assert_eq!(
            artifact.checksum,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(artifact.size_bytes, 5);
        assert_eq!(artifact.version, "1.0.0");
    }

    #[tokio::test]
    async fn test_update_increments_patch_twice() {
        let (store, _dir) = make_store();
        let artifact = store
            .create_artifact(make_request("doc", "v1"))
            .await
            .unwrap();

        let second = store
            .update_artifact(&artifact.id, "v2".to_string(), "second draft")
            .await
            .unwrap();
        assert_eq!(second.version, "1.0.1");

        let third = store
            .update_artifact(&artifact.id, "v3".to_string(), "third draft")
            .await
            .unwrap();
        assert_eq!(third.version, "1.0.2");

        assert_eq!(third.version_history.len(), 2);
        assert_eq!(third.version_history[0].version, "1.0.0");
        assert_eq!(third.version_history[1].version, "1.0.1");
        assert_eq!(third.version_history[1].changes, "third draft");
        assert_eq!(third.content, "v3");
    }

    #[test]
    fn test_increment_version_fallbacks() {
        assert_eq!(increment_version("1.0.0"), "1.0.1");
        assert_eq!(increment_version("2.3.9"), "2.3.10");
        assert_eq!(increment_version("2.1"), "2.1.1");
        assert_eq!(increment_version("abc"), "abc.1");
        assert_eq!(increment_version("1.0.x"), "1.0.x.1");
    }

    #[tokio::test]
    async fn test_supersedes_is_asymmetric() {
        let (store, _dir) = make_store();
        let a = store
            .create_artifact(make_request("a", "new spec"))
            .await
            .unwrap();
        let b = store
            .create_artifact(make_request("b", "old spec"))
            .await
            .unwrap();

        store
            .add_artifact_relationship(&a.id, &b.id, ArtifactRelation::Supersedes)
            .await
            .unwrap();

        let a_stored = store.get_artifact(&a.id).unwrap();
        let b_stored = store.get_artifact(&b.id).unwrap();
        assert_eq!(a_stored.supersedes, vec![b.id.clone()]);
        assert_eq!(b_stored.superseded_by, Some(a.id.clone()));
    }

    #[tokio::test]
    async fn test_dependency_and_related_idempotent() {
        let (store, _dir) = make_store();
        let a = store.create_artifact(make_request("a", "x")).await.unwrap();
        let b = store.create_artifact(make_request("b", "y")).await.unwrap();

        for _ in 0..2 {
            store
                .add_artifact_relationship(&a.id, &b.id, ArtifactRelation::Dependency)
                .await
                .unwrap();
            store
                .add_artifact_relationship(&a.id, &b.id, ArtifactRelation::Related)
                .await
                .unwrap();
        }

        let relationships = store.relationships(&a.id).unwrap();
        assert_eq!(relationships.dependencies, vec![b.id.clone()]);
        assert_eq!(relationships.related, vec![b.id.clone()]);
    }

    #[tokio::test]
    async fn test_relationship_requires_both_artifacts() {
        let (store, _dir) = make_store();
        let a = store.create_artifact(make_request("a", "x")).await.unwrap();
        let ghost = ArtifactId::generate();

        let err = store
            .add_artifact_relationship(&a.id, &ghost, ArtifactRelation::Dependency)
            .await
            .unwrap_err();
        assert!(matches!(err, ArtifactError::NotFound(id) if id == ghost));
    }

    #[tokio::test]
    async fn test_code_sniffing() {
        let (store, _dir) = make_store();
        let artifact = store
            .create_artifact(NewArtifact::new(
                ArtifactKind::Code,
                "service",
                "from fastapi import FastAPI\nimport os\n\ndef main():\n    pass\n",
                ProjectId::new("p1"),
                Phase::Development,
            ))
            .await
            .unwrap();

        assert_eq!(artifact.language.as_deref(), Some("python"));
        assert_eq!(artifact.framework.as_deref(), Some("fastapi"));
        assert_eq!(artifact.content_type, "text/plain");
    }

    #[tokio::test]
    async fn test_snapshot_roundtrip() {
        let (store, dir) = make_store();
        let artifact = store
            .create_artifact(make_request("doc", "content"))
            .await
            .unwrap();

        let path = dir.path().join(format!("{}.json", artifact.id));
        assert!(path.exists());

        let raw = std::fs::read(&path).unwrap();
        let parsed: Artifact = serde_json::from_slice(&raw).unwrap();
        assert_eq!(parsed.id, artifact.id);
        assert_eq!(parsed.checksum, artifact.checksum);
    }

    #[tokio::test]
    async fn test_list_with_filters() {
        let (store, _dir) = make_store();
        store.create_artifact(make_request("a", "1")).await.unwrap();
        store
            .create_artifact(NewArtifact::new(
                ArtifactKind::Code,
                "b",
                "2",
                ProjectId::new("p2"),
                Phase::Development,
            ))
            .await
            .unwrap();

        let all = store.list_artifacts(&ArtifactFilter::default());
        assert_eq!(all.len(), 2);

        let code_only = store.list_artifacts(&ArtifactFilter {
            kind: Some(ArtifactKind::Code),
            ..Default::default()
        });
        assert_eq!(code_only.len(), 1);
        assert_eq!(code_only[0].name, "b");

        let p1_design = store.list_artifacts(&ArtifactFilter {
            project_id: Some(ProjectId::new("p1")),
            phase: Some(Phase::Design),
            ..Default::default()
        });
        assert_eq!(p1_design.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_removes_snapshot() {
        let (store, dir) = make_store();
        let artifact = store.create_artifact(make_request("a", "x")).await.unwrap();
        let path = dir.path().join(format!("{}.json", artifact.id));
        assert!(path.exists());

        assert!(store.delete_artifact(&artifact.id).await.unwrap());
        assert!(!path.exists());
        assert!(store.get_artifact(&artifact.id).is_none());

        // Deleting again reports absence, not an error.
        assert!(!store.delete_artifact(&artifact.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_statistics() {
        let (store, _dir) = make_store();
        store.create_artifact(make_request("a", "1")).await.unwrap();
        store.create_artifact(make_request("b", "2")).await.unwrap();

        let stats = store.statistics().unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.by_kind.get("document"), Some(&2));
        assert_eq!(stats.by_phase.get("design"), Some(&2));
    }
}
