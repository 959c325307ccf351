//! Per-job metadata persisted alongside the artifact.
//!
//! A small `job.json` in the output directory records when the job was
//! created and when it last changed state. Because failed workspaces
//! are removed in full, the file's main value is letting an external
//! retention process tell a live `processing` job from one orphaned by
//! a crash mid-generation.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::JobError;
use crate::job::JobId;

/// Name of the metadata file inside a job's output directory.
pub const METADATA_FILE: &str = "job.json";

/// Recorded lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Processing,
    Completed,
}

/// Persisted job record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobMetadata {
    pub id: JobId,
    pub state: JobState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobMetadata {
    /// Fresh record for a job entering `processing`.
    pub fn processing(id: JobId) -> Self {
        let now = Utc::now();
        Self {
            id,
            state: JobState::Processing,
            created_at: now,
            updated_at: now,
        }
    }

    /// Transition this record to `completed`.
    pub fn complete(&mut self) {
        self.state = JobState::Completed;
        self.updated_at = Utc::now();
    }
}

fn metadata_path(output_dir: &Path) -> PathBuf {
    output_dir.join(METADATA_FILE)
}

/// Write `metadata` atomically into `output_dir`.
///
/// Writes to a temp file first and renames over the target, so readers
/// never observe a half-written record.
pub async fn store(output_dir: &Path, metadata: &JobMetadata) -> Result<(), JobError> {
    let json = serde_json::to_vec_pretty(metadata).map_err(|e| {
        JobError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Metadata serialization failed: {e}"),
        ))
    })?;

    let target = metadata_path(output_dir);
    let tmp = output_dir.join(format!("{METADATA_FILE}.tmp"));
    tokio::fs::write(&tmp, &json).await?;
    tokio::fs::rename(&tmp, &target).await?;
    Ok(())
}

/// Load the metadata record from `output_dir`, if present.
pub async fn load(output_dir: &Path) -> Result<Option<JobMetadata>, JobError> {
    let target = metadata_path(output_dir);
    let bytes = match tokio::fs::read(&target).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(JobError::Io(e)),
    };

    let metadata = serde_json::from_slice(&bytes).map_err(|e| {
        JobError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Corrupt job metadata at {}: {e}", target.display()),
        ))
    })?;
    Ok(Some(metadata))
}
