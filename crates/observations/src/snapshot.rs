//! Precomputed last-known-positions snapshot.
//!
//! The snapshot is a GeoJSON file written by an external job. It is read fresh
//! on every request.

use crate::error::{ObservationError, ObservationResult};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Location of the snapshot file on disk.
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    path: PathBuf,
}

impl SnapshotSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Snapshot file `file_name` inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>, file_name: &str) -> Self {
        Self::new(dir.as_ref().join(file_name))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw file bytes, unmodified.
    pub async fn read_raw(&self) -> ObservationResult<Vec<u8>> {
        debug!(path = %self.path.display(), "Reading snapshot");
        tokio::fs::read(&self.path).await.map_err(|e| {
            ObservationError::SnapshotError(format!(
                "Failed to read {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    /// File contents parsed as JSON.
    pub async fn read_json(&self) -> ObservationResult<serde_json::Value> {
        let bytes = self.read_raw().await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            ObservationError::SnapshotError(format!(
                "Invalid JSON in {}: {}",
                self.path.display(),
                e
            ))
        })
    }
}
