//! Handler for `/projects/{id}/export/{format}`.

use axum::extract::{Path, State};
use axum::Json;
use storyboard_core::export::{export_project, ExportFormat, ExportOutcome};
use uuid::Uuid;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/projects/{id}/export/{format}
///
/// `format` is one of `json`, `txt`, `zip` or `full`. The file is written to
/// `DATA_DIR/exports` from a snapshot of the project.
pub async fn export(
    State(state): State<AppState>,
    Path((id, format)): Path<(Uuid, String)>,
) -> AppResult<Json<DataResponse<ExportOutcome>>> {
    let format = ExportFormat::parse(&format)?;
    let shared = state.project(id).await?;
    let snapshot = shared.lock().await.clone();
    let dir = state.dirs.exports.clone();

    let outcome = tokio::task::spawn_blocking(move || export_project(&snapshot, format, &dir)).await??;
    Ok(Json(DataResponse::new(outcome)))
}
