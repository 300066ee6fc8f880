//! Handlers for `/projects/{id}/characters`.
//!
//! Changing or deleting a character recompiles every shot prompt.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use storyboard_core::model::Character;
use storyboard_core::service::{self, CharacterSummary};
use uuid::Uuid;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateCharacter {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub ref_images: Vec<String>,
}

/// GET /api/v1/projects/{id}/characters
pub async fn list(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DataResponse<Vec<CharacterSummary>>>> {
    let shared = state.project(id).await?;
    let characters = service::list_characters(&*shared.lock().await);
    Ok(Json(DataResponse::new(characters)))
}

/// POST /api/v1/projects/{id}/characters
pub async fn create(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<CreateCharacter>,
) -> AppResult<(StatusCode, Json<DataResponse<Character>>)> {
    let shared = state.project(id).await?;
    let character = service::add_character(
        &mut *shared.lock().await,
        &input.name,
        &input.description,
        input.ref_images,
    )?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(character))))
}

/// PUT /api/v1/projects/{id}/characters/{cid}
///
/// Replaces the whole record; the id in the body is ignored.
pub async fn update(
    State(state): State<AppState>,
    Path((id, character_id)): Path<(Uuid, String)>,
    Json(input): Json<Character>,
) -> AppResult<Json<DataResponse<Character>>> {
    let shared = state.project(id).await?;
    let character = service::update_character(&mut *shared.lock().await, &character_id, input)?;
    Ok(Json(DataResponse::new(character)))
}

/// DELETE /api/v1/projects/{id}/characters/{cid}
///
/// `cid` may be the character's id or its name.
pub async fn delete(
    State(state): State<AppState>,
    Path((id, character_id)): Path<(Uuid, String)>,
) -> AppResult<StatusCode> {
    let shared = state.project(id).await?;
    service::delete_character(&mut *shared.lock().await, &character_id)?;
    Ok(StatusCode::NO_CONTENT)
}
