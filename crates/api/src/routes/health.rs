use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Selected image backend.
    pub backend: &'static str,
    /// Whether the image backend answered its availability check.
    pub backend_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_message: Option<String>,
    pub open_projects: usize,
}

/// GET /health -- returns service and image backend health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let backend = state.orchestrator.backend();
    let availability = backend.check_availability().await;
    let backend_available = availability.is_ok();

    Json(HealthResponse {
        status: if backend_available { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        backend: backend.kind().as_str(),
        backend_available,
        backend_message: availability.err().map(|e| e.to_string()),
        open_projects: state.projects.len().await,
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
