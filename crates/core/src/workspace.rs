//! Per-job workspace management.
//!
//! Each job owns exactly two directories on durable storage: an input
//! directory holding the uploaded images and an output directory the
//! external generator writes into. Both are named by the job id, so
//! concurrent jobs never touch each other's storage.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::JobError;
use crate::job::JobId;

/// Creates and destroys the input/output directory pair for jobs.
#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    upload_root: PathBuf,
    output_root: PathBuf,
}

impl WorkspaceManager {
    pub fn new(upload_root: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            upload_root: upload_root.into(),
            output_root: output_root.into(),
        }
    }

    /// Root directory holding all per-job input directories.
    pub fn upload_root(&self) -> &Path {
        &self.upload_root
    }

    /// Root directory holding all per-job output directories.
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// The input directory owned by `id`.
    pub fn input_dir(&self, id: JobId) -> PathBuf {
        self.upload_root.join(id.to_string())
    }

    /// The output directory owned by `id`.
    pub fn output_dir(&self, id: JobId) -> PathBuf {
        self.output_root.join(id.to_string())
    }

    /// Create both directories for `id`, including missing parents.
    ///
    /// Idempotent: calling twice for the same id succeeds and leaves
    /// existing files in place.
    pub async fn create(&self, id: JobId) -> Result<(PathBuf, PathBuf), JobError> {
        let input_dir = self.input_dir(id);
        let output_dir = self.output_dir(id);
        tokio::fs::create_dir_all(&input_dir)
            .await
            .map_err(|source| JobError::Workspace { id, source })?;
        tokio::fs::create_dir_all(&output_dir)
            .await
            .map_err(|source| JobError::Workspace { id, source })?;
        Ok((input_dir, output_dir))
    }

    /// Recursively remove both directories for `id`.
    ///
    /// Absence is success: cleanup runs unconditionally on every failure
    /// path, including failures that happened before the directories
    /// were created.
    pub async fn destroy(&self, id: JobId) -> Result<(), JobError> {
        remove_dir_if_present(&self.input_dir(id), id).await?;
        remove_dir_if_present(&self.output_dir(id), id).await?;
        Ok(())
    }
}

async fn remove_dir_if_present(dir: &Path, id: JobId) -> Result<(), JobError> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(JobError::Workspace { id, source }),
    }
}
