use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure to load a [`SimConfig`](crate::SimConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Failure to save or restore a persisted snapshot.
///
/// Always fatal to the load itself, never to a running simulation.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("snapshot is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("snapshot version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
    #[error("snapshot references are inconsistent: {0}")]
    Invalid(String),
}

/// Failure of an external narrative collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NarrativeError {
    #[error("narrator unavailable: {0}")]
    Unavailable(String),
    #[error("narrator failed: {0}")]
    Failed(String),
}
