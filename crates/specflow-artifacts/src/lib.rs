//! Artifact Store for Specflow
//!
//! Content-addressed storage for artifacts generated during workflow
//! phases. Every artifact is checksummed (SHA-256 of its content),
//! versioned with an append-only revision history, classified by
//! best-effort content sniffing, and persisted as a JSON snapshot under
//! a configured storage directory.
//!
//! The store is independent of the orchestration core: callers must not
//! assume it stays transactionally consistent with the context engine
//! or orchestrator.

#![deny(unsafe_code)]

mod error;
mod sniff;
mod storage;
mod store;

pub use error::ArtifactError;
pub use sniff::{detect_framework, detect_language};
pub use storage::{FsSnapshotStorage, SnapshotStorage};
pub use store::{
    ArtifactFilter, ArtifactRelation, ArtifactRelationships, ArtifactStore, ArtifactStoreConfig,
    ArtifactStoreStats, NewArtifact,
};
