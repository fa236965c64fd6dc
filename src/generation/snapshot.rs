//! Snapshot seam: the host renders a canvas region to PNG bytes.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use canvas::geometry::Rect;

use super::protocol::ViewportSize;

const PNG_SIGNATURE: &[u8; 8] = b"\x89PNG\r\n\x1a\n";

/// The region to capture: a canvas rectangle and the pixel size to render it at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapshotRegion {
    pub rect: Rect,
    pub size: ViewportSize,
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot capture failed: {0}")]
    Capture(String),

    #[error("snapshot read failed for {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },

    #[error("snapshot is not a PNG image")]
    NotPng,
}

/// Renders a region of the canvas (ink and cards) to PNG bytes.
#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    async fn capture(&self, region: &SnapshotRegion) -> Result<Vec<u8>, SnapshotError>;
}

/// Serves a pre-rendered PNG from disk regardless of region. Used by the replay CLI.
#[derive(Debug, Clone)]
pub struct FileSnapshot {
    path: PathBuf,
}

impl FileSnapshot {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SnapshotProvider for FileSnapshot {
    async fn capture(&self, _region: &SnapshotRegion) -> Result<Vec<u8>, SnapshotError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| SnapshotError::Io { path: self.path.clone(), source })?;
        if !is_png(&bytes) {
            return Err(SnapshotError::NotPng);
        }
        Ok(bytes)
    }
}

#[must_use]
pub fn is_png(bytes: &[u8]) -> bool {
    bytes.starts_with(PNG_SIGNATURE)
}

#[cfg(test)]
#[path = "snapshot_test.rs"]
mod tests;
