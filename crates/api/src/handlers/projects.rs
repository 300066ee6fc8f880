//! Handlers for the `/projects` resource.
//!
//! Open projects live in the in-memory registry; `save` and `load` move them
//! to and from the JSON project store under `DATA_DIR/projects`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use storyboard_core::model::{ProjectDocument, StoryboardProject, StyleConfig};
use storyboard_core::service::{self, ProjectSummary};
use storyboard_core::store;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

fn default_aspect_ratio() -> String {
    "16:9".to_string()
}

#[derive(Debug, Deserialize)]
pub struct CreateProject {
    pub name: String,
    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: String,
}

#[derive(Debug, Deserialize)]
pub struct LoadProject {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ApplyPreset {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSeed {
    pub lock_seed: bool,
    #[serde(default)]
    pub generation_seed: i64,
}

/// An open project with its registry id.
#[derive(Debug, Serialize)]
pub struct ProjectView {
    pub id: Uuid,
    #[serde(flatten)]
    pub summary: ProjectSummary,
}

#[derive(Debug, Serialize)]
pub struct ProjectListing {
    pub id: Uuid,
    pub name: String,
    pub aspect_ratio: String,
    pub shot_count: usize,
    pub completed_count: usize,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
pub struct SeedPolicyView {
    pub lock_seed: bool,
    pub generation_seed: i64,
}

#[derive(Debug, Serialize)]
pub struct SavedProject {
    pub name: String,
    pub path: String,
}

/// Register `project` and answer `201 Created` with its view.
pub(crate) async fn open_project(
    state: &AppState,
    project: StoryboardProject,
) -> (StatusCode, Json<DataResponse<ProjectView>>) {
    let summary = service::project_summary(&project);
    let id = state.projects.insert(project).await;
    (
        StatusCode::CREATED,
        Json(DataResponse::new(ProjectView { id, summary })),
    )
}

/// POST /api/v1/projects
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateProject>,
) -> AppResult<(StatusCode, Json<DataResponse<ProjectView>>)> {
    let project = service::create_project(&input.name, &input.aspect_ratio)?;
    Ok(open_project(&state, project).await)
}

/// GET /api/v1/projects
pub async fn list(State(state): State<AppState>) -> AppResult<Json<DataResponse<Vec<ProjectListing>>>> {
    let mut listings = Vec::new();
    for (id, shared) in state.projects.entries().await {
        let project = shared.lock().await;
        listings.push(ProjectListing {
            id,
            name: project.name.clone(),
            aspect_ratio: project.aspect_ratio.as_str().to_string(),
            shot_count: project.shots.len(),
            completed_count: project.completed_count(),
            updated_at: project.updated_at.clone(),
        });
    }
    Ok(Json(DataResponse::new(listings)))
}

/// GET /api/v1/projects/{id}
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DataResponse<ProjectView>>> {
    let shared = state.project(id).await?;
    let summary = service::project_summary(&*shared.lock().await);
    Ok(Json(DataResponse::new(ProjectView { id, summary })))
}

/// DELETE /api/v1/projects/{id}
///
/// Closes the project without touching the project store.
pub async fn close(State(state): State<AppState>, Path(id): Path<Uuid>) -> AppResult<StatusCode> {
    state.projects.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/projects/{id}/document
pub async fn document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DataResponse<ProjectDocument>>> {
    let shared = state.project(id).await?;
    let document = shared.lock().await.to_document();
    Ok(Json(DataResponse::new(document)))
}

/// PUT /api/v1/projects/{id}/style
pub async fn update_style(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(style): Json<StyleConfig>,
) -> AppResult<Json<DataResponse<StyleConfig>>> {
    let shared = state.project(id).await?;
    let mut project = shared.lock().await;
    service::update_style(&mut project, style);
    Ok(Json(DataResponse::new(project.style.clone())))
}

/// POST /api/v1/projects/{id}/style/preset
pub async fn apply_preset(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<ApplyPreset>,
) -> AppResult<Json<DataResponse<StyleConfig>>> {
    let shared = state.project(id).await?;
    let style = service::apply_style_preset(&mut *shared.lock().await, &input.name);
    Ok(Json(DataResponse::new(style)))
}

/// PUT /api/v1/projects/{id}/seed
pub async fn update_seed(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateSeed>,
) -> AppResult<Json<DataResponse<SeedPolicyView>>> {
    let shared = state.project(id).await?;
    let mut project = shared.lock().await;
    service::update_seed(&mut project, input.lock_seed, input.generation_seed);
    Ok(Json(DataResponse::new(SeedPolicyView {
        lock_seed: project.lock_seed,
        generation_seed: project.generation_seed,
    })))
}

/// POST /api/v1/projects/{id}/save
pub async fn save(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DataResponse<SavedProject>>> {
    let shared = state.project(id).await?;
    let snapshot = shared.lock().await.clone();
    let path = store::save(&state.dirs.projects, &snapshot).await?;
    Ok(Json(DataResponse::new(SavedProject {
        name: snapshot.name,
        path: path.to_string_lossy().into_owned(),
    })))
}

/// GET /api/v1/projects/stored
pub async fn stored(State(state): State<AppState>) -> AppResult<Json<DataResponse<Vec<String>>>> {
    let names = store::list(&state.dirs.projects).await?;
    Ok(Json(DataResponse::new(names)))
}

/// POST /api/v1/projects/load
pub async fn load(
    State(state): State<AppState>,
    Json(input): Json<LoadProject>,
) -> AppResult<(StatusCode, Json<DataResponse<ProjectView>>)> {
    if input.name.trim().is_empty() {
        return Err(AppError::BadRequest("project name must not be empty".into()));
    }
    let project = store::load_by_name(&state.dirs.projects, &input.name).await?;
    Ok(open_project(&state, project).await)
}
