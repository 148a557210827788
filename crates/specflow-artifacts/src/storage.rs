//! Snapshot storage backends
//!
//! Defines the interface for artifact snapshot persistence. The store
//! keeps its in-memory map as the source of truth during a process
//! lifetime; the backend only round-trips JSON snapshots.

use crate::ArtifactError;
use async_trait::async_trait;
use specflow_types::{Artifact, ArtifactId};
use std::path::PathBuf;

/// Trait for artifact snapshot storage backends
#[async_trait]
pub trait SnapshotStorage: Send + Sync {
    /// Write (or overwrite) the snapshot for an artifact
    async fn store(&self, artifact: &Artifact) -> Result<(), ArtifactError>;

    /// Read a snapshot back, if present
    async fn load(&self, artifact_id: &ArtifactId) -> Result<Option<Artifact>, ArtifactError>;

    /// Remove a snapshot; removing a missing snapshot is not an error
    async fn remove(&self, artifact_id: &ArtifactId) -> Result<(), ArtifactError>;
}

/// Flat-file backend: one pretty-printed JSON file per artifact under a
/// root directory
pub struct FsSnapshotStorage {
    root: PathBuf,
}

impl FsSnapshotStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn snapshot_path(&self, artifact_id: &ArtifactId) -> PathBuf {
        self.root.join(format!("{}.json", artifact_id))
    }
}

#[async_trait]
impl SnapshotStorage for FsSnapshotStorage {
    async fn store(&self, artifact: &Artifact) -> Result<(), ArtifactError> {
        tokio::fs::create_dir_all(&self.root).await?;
        let serialized = serde_json::to_vec_pretty(artifact)?;
        tokio::fs::write(self.snapshot_path(&artifact.id), serialized).await?;
        Ok(())
    }

    async fn load(&self, artifact_id: &ArtifactId) -> Result<Option<Artifact>, ArtifactError> {
        match tokio::fs::read(self.snapshot_path(artifact_id)).await {
            Ok(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&self, artifact_id: &ArtifactId) -> Result<(), ArtifactError> {
        match tokio::fs::remove_file(self.snapshot_path(artifact_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
