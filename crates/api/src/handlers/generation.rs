//! Handlers that drive the image backend.
//!
//! The project lock is released while the backend runs, so other requests
//! against the same project keep working during a generation.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use storyboard_pipeline::progress::{BatchProgressFn, StepHook};
use storyboard_pipeline::{BatchResult, ErrorKind, ShotGenerationResult};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GenerateShot {
    /// Used verbatim instead of the stored prompt when non-blank.
    pub custom_prompt: Option<String>,
}

impl GenerateShot {
    /// The body is optional; an empty one means "use the stored prompt".
    fn from_body(body: &[u8]) -> AppResult<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body).map_err(|e| AppError::BadRequest(format!("invalid request body: {e}")))
    }
}

/// POST /api/v1/projects/{id}/shots/{n}/generate
///
/// A backend failure is recorded on the shot and returned as a result with
/// `success: false`. A disabled or unreachable backend answers 503.
pub async fn generate_shot(
    State(state): State<AppState>,
    Path((id, shot_number)): Path<(Uuid, u32)>,
    body: Bytes,
) -> AppResult<Json<DataResponse<ShotGenerationResult>>> {
    let custom_prompt = GenerateShot::from_body(&body)?.custom_prompt;
    let shared = state.project(id).await?;

    let on_step = StepHook::new(Arc::new(move |current: u32, total: u32| {
        tracing::debug!(project_id = %id, shot_number, current, total, "Generation step");
    }));
    let result = state
        .orchestrator
        .generate_shot_shared(&shared, shot_number, custom_prompt.as_deref(), on_step)
        .await?;

    if !result.success && result.error_kind == Some(ErrorKind::Configuration) {
        return Err(AppError::BackendUnavailable(result.error.unwrap_or_default()));
    }
    Ok(Json(DataResponse::new(result)))
}

/// POST /api/v1/projects/{id}/generate
///
/// Generates every shot without an output image. Individual failures are
/// part of the result.
pub async fn generate_all(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DataResponse<BatchResult>>> {
    let shared = state.project(id).await?;
    let progress: &BatchProgressFn = &move |index: usize, total: usize, message: &str| {
        tracing::info!(project_id = %id, index, total, progress = message, "Batch progress");
    };
    let batch = state
        .orchestrator
        .generate_all_shared(&shared, Some(progress))
        .await?;
    Ok(Json(DataResponse::new(batch)))
}
