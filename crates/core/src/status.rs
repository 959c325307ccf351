//! Filesystem-derived job status.
//!
//! There is no in-memory registry: a job's status is re-derived on
//! every query from what its workspace looks like on durable storage.
//! The query itself performs no transitions; those happen as side
//! effects of the workspace lifecycle (creation, generation, cleanup).

use std::io::ErrorKind;

use serde::Serialize;

use crate::artifact;
use crate::job::JobId;
use crate::workspace::WorkspaceManager;

/// Derived status of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobStatus {
    /// The output directory does not exist: unknown id, or a failed job
    /// whose workspace was already cleaned up.
    NotFound,
    /// The output directory exists but holds no artifact yet.
    Processing,
    /// An artifact is present.
    Completed { file_name: String },
    /// Inspecting the output directory failed with an I/O error.
    ///
    /// Deliberately distinct from `NotFound`: a transient listing
    /// failure must not read as a missing job.
    Error,
}

/// Derive the status of `id` from its workspace.
pub async fn query(workspaces: &WorkspaceManager, id: JobId) -> JobStatus {
    let output_dir = workspaces.output_dir(id);

    match artifact::resolve(&output_dir).await {
        Ok(Some(file_name)) => JobStatus::Completed { file_name },
        Ok(None) => JobStatus::Processing,
        Err(crate::error::JobError::Io(e)) if e.kind() == ErrorKind::NotFound => {
            JobStatus::NotFound
        }
        Err(e) => {
            tracing::error!(job_id = %id, error = %e, "Failed to inspect output directory");
            JobStatus::Error
        }
    }
}
