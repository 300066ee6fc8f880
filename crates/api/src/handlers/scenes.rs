//! Handlers for `/projects/{id}/scenes`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use storyboard_core::model::Scene;
use storyboard_core::service::{self, SceneSummary};
use uuid::Uuid;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateScene {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub space_ref_image: String,
}

/// GET /api/v1/projects/{id}/scenes
pub async fn list(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DataResponse<Vec<SceneSummary>>>> {
    let shared = state.project(id).await?;
    let scenes = service::list_scenes(&*shared.lock().await);
    Ok(Json(DataResponse::new(scenes)))
}

/// POST /api/v1/projects/{id}/scenes
pub async fn create(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<CreateScene>,
) -> AppResult<(StatusCode, Json<DataResponse<Scene>>)> {
    let shared = state.project(id).await?;
    let scene = service::add_scene(
        &mut *shared.lock().await,
        &input.name,
        &input.description,
        &input.space_ref_image,
    )?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(scene))))
}

/// PUT /api/v1/projects/{id}/scenes/{sid}
pub async fn update(
    State(state): State<AppState>,
    Path((id, scene_id)): Path<(Uuid, String)>,
    Json(input): Json<Scene>,
) -> AppResult<Json<DataResponse<Scene>>> {
    let shared = state.project(id).await?;
    let scene = service::update_scene(&mut *shared.lock().await, &scene_id, input)?;
    Ok(Json(DataResponse::new(scene)))
}

/// DELETE /api/v1/projects/{id}/scenes/{sid}
pub async fn delete(
    State(state): State<AppState>,
    Path((id, scene_id)): Path<(Uuid, String)>,
) -> AppResult<StatusCode> {
    let shared = state.project(id).await?;
    service::delete_scene(&mut *shared.lock().await, &scene_id)?;
    Ok(StatusCode::NO_CONTENT)
}
