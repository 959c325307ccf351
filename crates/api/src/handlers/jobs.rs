//! Handlers for the generation job lifecycle.
//!
//! Submission runs the whole pipeline for one job: mint an id, create
//! the workspace, ingest the uploaded images, invoke the external
//! generator, resolve the artifact. Status and artifact fetch are
//! idempotent read paths keyed by job id, derived entirely from
//! filesystem state.

use axum::body::Body;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use plyforge_core::artifact::{self, ARTIFACT_CONTENT_TYPE};
use plyforge_core::error::JobError;
use plyforge_core::ingest::{self, UploadItem};
use plyforge_core::job::JobId;
use plyforge_core::metadata::{self, JobMetadata};
use plyforge_core::status::{self, JobStatus};
use plyforge_core::generator;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request/response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SubmitParams {
    /// When `false`, return 202 immediately and finish generation in a
    /// background task; the client polls the status endpoint. Defaults
    /// to the synchronous contract.
    pub wait: Option<bool>,
}

/// Response for a completed synchronous submission.
#[derive(Debug, Serialize)]
pub struct SubmissionResult {
    pub job_id: JobId,
    pub file_name: String,
    pub artifact_url: String,
}

/// Response for an accepted asynchronous submission.
#[derive(Debug, Serialize)]
pub struct AcceptedResult {
    pub job_id: JobId,
}

// ---------------------------------------------------------------------------
// POST /jobs
// ---------------------------------------------------------------------------

/// Accept a multipart image upload and produce a 3D artifact.
pub async fn submit_job(
    State(state): State<AppState>,
    Query(params): Query<SubmitParams>,
    multipart: Multipart,
) -> AppResult<Response> {
    // Collect and validate the payload before any workspace exists, so
    // client errors leave no directories behind.
    let items = collect_uploads(multipart).await?;
    if items.is_empty() {
        return Err(JobError::InvalidRequest(
            "At least one image must be uploaded".to_string(),
        )
        .into());
    }
    for item in &items {
        ingest::sanitize_filename(&item.filename)?;
    }

    let id = JobId::new();
    tracing::info!(job_id = %id, images = items.len(), "Job submitted");

    // The pipeline always runs in its own task: if the client
    // disconnects (or the request timeout fires) the HTTP future is
    // dropped, and cleanup must still run to completion.
    if params.wait.unwrap_or(true) {
        let task = tokio::spawn(run_job(state.clone(), id, items));
        let file_name = task
            .await
            .map_err(|e| AppError::InternalError(format!("Generation task panicked: {e}")))??;
        let result = SubmissionResult {
            job_id: id,
            artifact_url: artifact_url(id, &file_name),
            file_name,
        };
        Ok((StatusCode::CREATED, Json(DataResponse { data: result })).into_response())
    } else {
        tokio::spawn(async move {
            if let Err(e) = run_job(state, id, items).await {
                tracing::error!(job_id = %id, error = %e, "Background generation failed");
            }
        });
        Ok((
            StatusCode::ACCEPTED,
            Json(DataResponse {
                data: AcceptedResult { job_id: id },
            }),
        )
            .into_response())
    }
}

/// Drain the multipart stream into memory.
async fn collect_uploads(mut multipart: Multipart) -> AppResult<Vec<UploadItem>> {
    let mut items = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        // Only file parts count as images; bare form values are skipped.
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        items.push(UploadItem {
            filename,
            bytes: bytes.to_vec(),
        });
    }

    Ok(items)
}

/// Execute the full pipeline for one job, with guaranteed cleanup.
///
/// The workspace is removed on every failure path after creation;
/// cleanup failures are logged and never replace the original error.
/// Callers must run this in a spawned task, not inline in a request
/// future: a cancelled request would otherwise drop the pipeline
/// between generation and the cleanup arm, orphaning the workspace.
async fn run_job(state: AppState, id: JobId, items: Vec<UploadItem>) -> AppResult<String> {
    let (input_dir, output_dir) = state.workspaces.create(id).await?;

    let result = async {
        ingest::ingest(&input_dir, &items).await?;

        let mut meta = JobMetadata::processing(id);
        metadata::store(&output_dir, &meta).await?;

        // Bound concurrent external processes; waiters queue FIFO.
        let _permit = state
            .generation_slots
            .acquire()
            .await
            .map_err(|_| AppError::InternalError("Generation pool is closed".to_string()))?;

        let output =
            generator::invoke(&state.generator, &input_dir, &output_dir, &state.shutdown).await?;
        tracing::info!(
            job_id = %id,
            duration_ms = output.duration_ms,
            "Generator finished",
        );

        let file_name = artifact::resolve(&output_dir)
            .await?
            .ok_or(JobError::MissingArtifact { id })?;

        meta.complete();
        metadata::store(&output_dir, &meta).await?;

        Ok::<String, AppError>(file_name)
    }
    .await;

    match result {
        Ok(file_name) => {
            tracing::info!(job_id = %id, file_name = %file_name, "Job completed");
            Ok(file_name)
        }
        Err(e) => {
            if let Err(cleanup) = state.workspaces.destroy(id).await {
                tracing::warn!(job_id = %id, error = %cleanup, "Workspace cleanup failed");
            }
            Err(e)
        }
    }
}

fn artifact_url(id: JobId, file_name: &str) -> String {
    format!("/api/v1/jobs/{id}/artifact/{file_name}")
}

// ---------------------------------------------------------------------------
// GET /jobs/{id}
// ---------------------------------------------------------------------------

/// Report a job's status, derived from its workspace state.
pub async fn job_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    // A malformed id can never name a workspace, so it reads the same
    // as an unknown job.
    let Ok(id) = id.parse::<JobId>() else {
        return Ok(status_response(JobStatus::NotFound));
    };

    let status = status::query(&state.workspaces, id).await;
    Ok(status_response(status))
}

fn status_response(status: JobStatus) -> Response {
    let code = match status {
        JobStatus::NotFound => StatusCode::NOT_FOUND,
        JobStatus::Processing | JobStatus::Completed { .. } => StatusCode::OK,
        JobStatus::Error => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (code, Json(DataResponse { data: status })).into_response()
}

// ---------------------------------------------------------------------------
// GET /jobs/{id}/artifact[/{file_name}]
// ---------------------------------------------------------------------------

/// Stream a completed job's artifact.
pub async fn fetch_artifact(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    serve_artifact(&state, &id).await
}

/// Same as [`fetch_artifact`]; the trailing file name lets viewers
/// infer the format from the URL. It is advisory only -- the resolver
/// decides which file is served, so the client-supplied name is never
/// used to build a filesystem path.
pub async fn fetch_artifact_named(
    State(state): State<AppState>,
    Path((id, _file_name)): Path<(String, String)>,
) -> AppResult<Response> {
    serve_artifact(&state, &id).await
}

async fn serve_artifact(state: &AppState, raw_id: &str) -> AppResult<Response> {
    let not_found = || JobError::NotFound {
        id: raw_id.to_string(),
    };

    let id: JobId = raw_id.parse().map_err(|_| not_found())?;
    let output_dir = state.workspaces.output_dir(id);

    let file_name = match artifact::resolve(&output_dir).await {
        Ok(Some(name)) => name,
        Ok(None) => return Err(not_found().into()),
        Err(JobError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(not_found().into());
        }
        Err(e) => return Err(e.into()),
    };

    let data = tokio::fs::read(output_dir.join(&file_name))
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to read artifact: {e}")))?;

    let disposition = format!("inline; filename=\"{file_name}\"");
    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, ARTIFACT_CONTENT_TYPE)
        .header(header::CONTENT_LENGTH, data.len().to_string())
        .header(
            header::CACHE_CONTROL,
            HeaderValue::from_static("public, max-age=3600"),
        )
        .header(header::CONTENT_DISPOSITION, disposition)
        .header(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        )
        .body(Body::from(data))
        .unwrap())
}
