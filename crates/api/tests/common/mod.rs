//! Shared helpers for API integration tests.
//!
//! [`build_test_app`] builds the production router over the mock image
//! backend and a temporary data directory. Projects live in memory, so a test
//! clones the same [`Router`] for every request it sends.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use storyboard_api::config::{DataDirs, ServerConfig};
use storyboard_api::router::build_app_router;
use storyboard_api::state::AppState;
use storyboard_pipeline::mock::MockBackend;
use storyboard_pipeline::{ImageBackend, Orchestrator};
use tempfile::TempDir;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    /// Keeps the data directory alive for the duration of the test.
    pub data: TempDir,
}

impl TestApp {
    pub fn app(&self) -> Router {
        self.router.clone()
    }
}

/// Build a test `ServerConfig` rooted at `data_dir`.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default)
/// and a 30-second request timeout.
pub fn test_config(data_dir: &std::path::Path) -> ServerConfig {
    let mut config = ServerConfig::from_lookup(|_| None).expect("default config is valid");
    config.host = "127.0.0.1".to_string();
    config.request_timeout_secs = 30;
    config.generation_timeout_secs = 10;
    config.data_dir = data_dir.to_path_buf();
    config
}

/// Build the full application over the mock backend.
pub async fn build_test_app() -> TestApp {
    build_test_app_with(Arc::new(MockBackend::new())).await
}

/// Build the full application over `backend`.
///
/// This goes through [`build_app_router`], the same function `main.rs` uses,
/// so tests exercise the production middleware stack.
pub async fn build_test_app_with(backend: Arc<dyn ImageBackend>) -> TestApp {
    let data = tempfile::tempdir().expect("create temp dir");
    let config = test_config(data.path());
    let dirs = DataDirs::new(&config.data_dir);
    dirs.create_all().await.expect("create data dirs");

    let orchestrator = Orchestrator::new(backend, dirs.outputs.clone())
        .with_timeout(Duration::from_secs(config.generation_timeout_secs));
    let state = AppState::new(config.clone(), orchestrator, None);
    let router = build_app_router(state.clone(), &config).expect("router builds");

    TestApp { router, state, data }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> Response<Body> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("valid request");
    app.oneshot(request).await.expect("infallible service")
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(body)).await
}

/// POST without a body.
pub async fn post(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::POST, uri, None).await
}

pub async fn put_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send(app, Method::PUT, uri, Some(body)).await
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, None).await
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body is JSON")
}

/// Create a project and return its id.
pub async fn create_project(app: Router, name: &str) -> String {
    let response = post_json(app, "/api/v1/projects", serde_json::json!({ "name": name })).await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    let json = body_json(response).await;
    json["data"]["id"].as_str().expect("id is a string").to_string()
}
