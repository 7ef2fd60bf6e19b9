//! Best-effort persistence of per-cycle debug images.
//!
//! Every intermediate raster of a cycle can be written as
//! `<timestamp>-<kind>.jpg`. Failures are reported to the caller, which
//! logs and ignores them; they never influence detection.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::DynamicImage;
use snowcheck_core::codec;

use crate::error::ArtifactError;

/// Which stage of the cycle an artifact came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Snapshot,
    Greyscale,
    Mask,
    Bright,
}

impl ArtifactKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Snapshot => "snapshot",
            Self::Greyscale => "greyscale",
            Self::Mask => "mask",
            Self::Bright => "bright",
        }
    }
}

/// Sink for debug artifacts.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn save(
        &self,
        timestamp: &str,
        kind: ArtifactKind,
        image: &DynamicImage,
    ) -> Result<(), ArtifactError>;
}

/// Discards everything. Used when snapshot logging is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopStore;

#[async_trait]
impl ArtifactStore for NoopStore {
    async fn save(
        &self,
        _timestamp: &str,
        _kind: ArtifactKind,
        _image: &DynamicImage,
    ) -> Result<(), ArtifactError> {
        Ok(())
    }
}

/// Writes JPEG artifacts into a single directory.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    dir: PathBuf,
}

impl DirectoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the artifact directory (and parents) if missing.
    pub async fn ensure_directory(&self) -> Result<(), ArtifactError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| ArtifactError::CreateDir {
                path: self.dir.clone(),
                source,
            })
    }

    /// Destination path for an artifact.
    pub fn path_for(&self, timestamp: &str, kind: ArtifactKind) -> PathBuf {
        self.dir.join(format!("{timestamp}-{}.jpg", kind.label()))
    }
}

#[async_trait]
impl ArtifactStore for DirectoryStore {
    async fn save(
        &self,
        timestamp: &str,
        kind: ArtifactKind,
        image: &DynamicImage,
    ) -> Result<(), ArtifactError> {
        let path = self.path_for(timestamp, kind);
        tracing::info!(kind = kind.label(), path = %path.display(), "Saving debug image");

        let jpeg = codec::encode_jpeg(image)?;
        tokio::fs::write(&path, jpeg)
            .await
            .map_err(|source| ArtifactError::Write { path, source })
    }
}
