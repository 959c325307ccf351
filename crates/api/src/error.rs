use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use plyforge_core::error::JobError;

/// Maximum stderr length quoted in an error response.
const MAX_STDERR_IN_RESPONSE: usize = 4096;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`JobError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `plyforge_core`.
    #[error(transparent)]
    Job(#[from] JobError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Job(job) => match job {
                JobError::InvalidRequest(msg) => {
                    (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg.clone())
                }
                JobError::Workspace { id, source } => {
                    tracing::error!(job_id = %id, error = %source, "Workspace operation failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "WORKSPACE_ERROR",
                        format!("Workspace operation failed for job {id}"),
                    )
                }
                JobError::GenerationFailed { exit_code, stderr } => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "GENERATION_FAILED",
                    format!(
                        "Generation failed (exit code {exit_code}): {}",
                        excerpt(stderr)
                    ),
                ),
                JobError::GenerationTimedOut { elapsed_ms } => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "GENERATION_TIMED_OUT",
                    format!("Generation timed out after {elapsed_ms} ms"),
                ),
                JobError::MissingArtifact { id } => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "MISSING_ARTIFACT",
                    format!("Generator produced no artifact for job {id}"),
                ),
                JobError::NotFound { id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("Job {id} not found"),
                ),
                JobError::Io(err) => {
                    tracing::error!(error = %err, "I/O error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Truncate captured generator stderr to a response-sized excerpt.
fn excerpt(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.len() <= MAX_STDERR_IN_RESPONSE {
        return trimmed.to_string();
    }
    let mut end = MAX_STDERR_IN_RESPONSE;
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated)", &trimmed[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excerpt_passes_short_text_through() {
        assert_eq!(excerpt("  boom  "), "boom");
    }

    #[test]
    fn excerpt_truncates_long_text_on_char_boundary() {
        let long = "é".repeat(MAX_STDERR_IN_RESPONSE);
        let out = excerpt(&long);
        assert!(out.ends_with("... (truncated)"));
        assert!(out.len() <= MAX_STDERR_IN_RESPONSE + 16);
    }

    #[test]
    fn invalid_request_maps_to_400() {
        let resp = AppError::Job(JobError::InvalidRequest("no images".into())).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_found_maps_to_404() {
        let resp = AppError::Job(JobError::NotFound { id: "x".into() }).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn generation_failed_maps_to_500() {
        let resp = AppError::Job(JobError::GenerationFailed {
            exit_code: 2,
            stderr: "boom".into(),
        })
        .into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
