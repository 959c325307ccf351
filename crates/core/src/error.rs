use crate::job::JobId;

/// Domain-level error for the job lifecycle.
///
/// Variants map one-to-one onto the failure taxonomy the HTTP layer
/// exposes; see `plyforge-api`'s `AppError` for the status mapping.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    /// The client supplied an invalid request (no images, bad filename).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A workspace directory could not be created or removed.
    #[error("Workspace error for job {id}: {source}")]
    Workspace {
        id: JobId,
        #[source]
        source: std::io::Error,
    },

    /// The external generator exited with a non-zero status.
    #[error("Generation failed (exit code {exit_code}): {stderr}")]
    GenerationFailed { exit_code: i32, stderr: String },

    /// The external generator exceeded the configured timeout or was
    /// cancelled; the child process has been killed.
    #[error("Generation timed out after {elapsed_ms} ms")]
    GenerationTimedOut { elapsed_ms: u64 },

    /// The generator exited 0 but produced no recognizable artifact.
    #[error("Generator produced no artifact for job {id}")]
    MissingArtifact { id: JobId },

    /// The job (or its artifact) does not exist.
    ///
    /// Carries the raw id text so malformed ids report the same way as
    /// well-formed but unknown ones.
    #[error("Job {id} not found")]
    NotFound { id: String },

    /// An underlying I/O failure outside the workspace operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
