pub mod health;
pub mod jobs;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /jobs                          POST submit (multipart, ?wait=false for 202)
/// /jobs/{id}                     GET  status
/// /jobs/{id}/artifact            GET  artifact bytes
/// /jobs/{id}/artifact/{name}     GET  artifact bytes (named)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/jobs", jobs::router())
}
