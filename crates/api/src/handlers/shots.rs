//! Handlers for `/projects/{id}/shots`.
//!
//! Shots are addressed by their 1-based number, which changes when shots are
//! deleted or moved.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use storyboard_core::error::CoreError;
use storyboard_core::model::Shot;
use storyboard_core::prompt::{self, CompileOptions, CompiledPrompt};
use storyboard_core::service::{self, MoveDirection, ShotListing, ShotUpdate};
use uuid::Uuid;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

fn default_template() -> String {
    "medium".to_string()
}

#[derive(Debug, Deserialize)]
pub struct CreateShot {
    /// Persisted value, short code or shorthand; unknown values mean T4.
    #[serde(default = "default_template")]
    pub template: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub character_ids: Vec<String>,
    #[serde(default)]
    pub scene_id: String,
}

#[derive(Debug, Deserialize)]
pub struct MoveShot {
    pub direction: MoveDirection,
}

/// Compiled prompt plus the formatted breakdown shown in the editor.
#[derive(Debug, Serialize)]
pub struct ShotPromptView {
    pub shot_number: u32,
    pub stored_prompt: String,
    #[serde(flatten)]
    pub compiled: CompiledPrompt,
    pub formatted_breakdown: String,
}

/// GET /api/v1/projects/{id}/shots
pub async fn list(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DataResponse<Vec<ShotListing>>>> {
    let shared = state.project(id).await?;
    let shots = service::list_shots(&*shared.lock().await);
    Ok(Json(DataResponse::new(shots)))
}

/// POST /api/v1/projects/{id}/shots
pub async fn create(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<CreateShot>,
) -> AppResult<(StatusCode, Json<DataResponse<Shot>>)> {
    let shared = state.project(id).await?;
    let shot = service::add_shot(
        &mut *shared.lock().await,
        &input.template,
        &input.description,
        &input.character_ids,
        &input.scene_id,
    );
    Ok((StatusCode::CREATED, Json(DataResponse::new(shot))))
}

/// PUT /api/v1/projects/{id}/shots/{n}
pub async fn update(
    State(state): State<AppState>,
    Path((id, shot_number)): Path<(Uuid, u32)>,
    Json(input): Json<ShotUpdate>,
) -> AppResult<Json<DataResponse<Shot>>> {
    let shared = state.project(id).await?;
    let shot = service::update_shot(&mut *shared.lock().await, shot_number, input)?;
    Ok(Json(DataResponse::new(shot)))
}

/// DELETE /api/v1/projects/{id}/shots/{n}
pub async fn delete(
    State(state): State<AppState>,
    Path((id, shot_number)): Path<(Uuid, u32)>,
) -> AppResult<StatusCode> {
    let shared = state.project(id).await?;
    service::delete_shot(&mut *shared.lock().await, shot_number)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/projects/{id}/shots/{n}/move
///
/// Returns the renumbered shot list.
pub async fn move_shot(
    State(state): State<AppState>,
    Path((id, shot_number)): Path<(Uuid, u32)>,
    Json(input): Json<MoveShot>,
) -> AppResult<Json<DataResponse<Vec<ShotListing>>>> {
    let shared = state.project(id).await?;
    let mut project = shared.lock().await;
    service::move_shot(&mut project, shot_number, input.direction)?;
    Ok(Json(DataResponse::new(service::list_shots(&project))))
}

/// GET /api/v1/projects/{id}/shots/{n}/prompt
pub async fn prompt(
    State(state): State<AppState>,
    Path((id, shot_number)): Path<(Uuid, u32)>,
) -> AppResult<Json<DataResponse<ShotPromptView>>> {
    let shared = state.project(id).await?;
    let project = shared.lock().await;
    let shot = project
        .shot(shot_number)
        .ok_or_else(|| CoreError::not_found("shot", shot_number))?;

    let compiled = prompt::compile(shot, &project, CompileOptions::default());
    let formatted_breakdown = compiled.breakdown.to_formatted_string();
    Ok(Json(DataResponse::new(ShotPromptView {
        shot_number,
        stored_prompt: shot.generated_prompt.clone(),
        compiled,
        formatted_breakdown,
    })))
}
