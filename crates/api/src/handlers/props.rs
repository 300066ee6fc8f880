//! Handlers for `/projects/{id}/props`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use storyboard_core::model::Prop;
use storyboard_core::service;
use uuid::Uuid;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateProp {
    pub name: String,
    #[serde(default)]
    pub material: String,
    #[serde(default)]
    pub size_reference: String,
    #[serde(default)]
    pub ref_image: String,
}

/// GET /api/v1/projects/{id}/props
pub async fn list(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DataResponse<Vec<Prop>>>> {
    let shared = state.project(id).await?;
    let props = service::list_props(&*shared.lock().await).to_vec();
    Ok(Json(DataResponse::new(props)))
}

/// POST /api/v1/projects/{id}/props
pub async fn create(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<CreateProp>,
) -> AppResult<(StatusCode, Json<DataResponse<Prop>>)> {
    let shared = state.project(id).await?;
    let prop = service::add_prop(
        &mut *shared.lock().await,
        &input.name,
        &input.material,
        &input.size_reference,
        &input.ref_image,
    )?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(prop))))
}

/// DELETE /api/v1/projects/{id}/props/{pid}
pub async fn delete(
    State(state): State<AppState>,
    Path((id, prop_id)): Path<(Uuid, String)>,
) -> AppResult<StatusCode> {
    let shared = state.project(id).await?;
    service::delete_prop(&mut *shared.lock().await, &prop_id)?;
    Ok(StatusCode::NO_CONTENT)
}
