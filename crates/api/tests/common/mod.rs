// Not every helper is used by every test binary.
#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use plyforge_api::config::ServerConfig;
use plyforge_api::routes;
use plyforge_api::state::AppState;

/// Multipart boundary used by [`submit_request`].
pub const BOUNDARY: &str = "plyforge-test-boundary";

/// A fully wired application backed by temp storage roots and a stub
/// generator script.
pub struct TestApp {
    pub router: Router,
    pub upload_root: PathBuf,
    pub output_root: PathBuf,
    // Held so the temp directory outlives the test.
    _tmp: tempfile::TempDir,
}

/// Build a test application whose "generator" is a shell script.
///
/// The script body receives the job's input directory as `$1` and the
/// output directory as `$2`, matching the production invocation
/// contract.
pub fn build_test_app(stub_script: &str) -> TestApp {
    let tmp = tempfile::tempdir().expect("temp dir");

    let stub_path = tmp.path().join("generator.sh");
    std::fs::write(&stub_path, format!("#!/bin/sh\n{stub_script}\n")).expect("write stub");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&stub_path, std::fs::Permissions::from_mode(0o755))
            .expect("chmod stub");
    }

    let config = test_config(&tmp, &stub_path);
    let upload_root = config.upload_root.clone();
    let output_root = config.output_root.clone();
    std::fs::create_dir_all(&upload_root).expect("upload root");
    std::fs::create_dir_all(&output_root).expect("output root");

    TestApp {
        router: build_router(config),
        upload_root,
        output_root,
        _tmp: tmp,
    }
}

/// Build a test `ServerConfig` with safe defaults against temp roots.
fn test_config(tmp: &tempfile::TempDir, stub_path: &std::path::Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        upload_root: tmp.path().join("uploads"),
        output_root: tmp.path().join("outputs"),
        generator_bin: stub_path.to_string_lossy().to_string(),
        generator_args: vec![],
        generator_home: None,
        generation_timeout_secs: 20,
        max_concurrent_generations: 2,
        max_upload_bytes: 16 * 1024 * 1024,
    }
}

/// Build the full application router with all middleware layers.
///
/// This mirrors the router construction in `main.rs` so integration
/// tests exercise the same middleware stack (CORS, request ID, timeout,
/// tracing, panic recovery) that production uses.
fn build_router(config: ServerConfig) -> Router {
    let request_timeout = config.request_timeout_secs;
    let max_upload_bytes = config.max_upload_bytes;
    let state = AppState::new(config);

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:5173".parse().unwrap()])
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(request_timeout),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

/// Issue a GET request against the app.
pub async fn get(app: Router, uri: &str) -> Response {
    app.oneshot(
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request"),
    )
    .await
    .expect("response")
}

/// Build a multipart submission request. Each entry is `(filename, bytes)`,
/// sent as a file part named `images`.
pub fn submit_request(uri: &str, files: &[(&str, &[u8])]) -> Request<Body> {
    let mut body: Vec<u8> = Vec::new();
    for (filename, bytes) in files {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"images\"; filename=\"{filename}\"\r\n")
                .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: image/jpeg\r\n\r\n");
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("request")
}

/// Collect a response body as parsed JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body is JSON")
}

/// Collect a response body as raw bytes.
pub async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes()
        .to_vec()
}

/// Count the entries directly under `dir`.
pub fn dir_entry_count(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}
