//! Route definitions for the generation job lifecycle.
//!
//! All routes are mounted under `/jobs`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::jobs;
use crate::state::AppState;

/// Job lifecycle routes mounted at `/jobs`.
///
/// ```text
/// POST   /                       -> submit_job
/// GET    /{id}                   -> job_status
/// GET    /{id}/artifact          -> fetch_artifact
/// GET    /{id}/artifact/{name}   -> fetch_artifact_named
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(jobs::submit_job))
        .route("/{id}", get(jobs::job_status))
        .route("/{id}/artifact", get(jobs::fetch_artifact))
        .route("/{id}/artifact/{file_name}", get(jobs::fetch_artifact_named))
}
