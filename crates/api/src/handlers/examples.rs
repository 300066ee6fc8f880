//! Handlers for the built-in example stories.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use storyboard_core::outline::OutlineSummary;
use storyboard_core::stories::{example_stories, load_example};

use crate::error::AppResult;
use crate::handlers::projects::{open_project, ProjectView};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/examples
pub async fn list() -> AppResult<Json<DataResponse<Vec<OutlineSummary>>>> {
    let summaries = example_stories().iter().map(|s| s.summary()).collect();
    Ok(Json(DataResponse::new(summaries)))
}

/// POST /api/v1/examples/{name}
///
/// Names match case-insensitively.
pub async fn load(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<(StatusCode, Json<DataResponse<ProjectView>>)> {
    let project = load_example(&name)?;
    Ok(open_project(&state, project).await)
}
