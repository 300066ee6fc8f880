//! Handlers for `/imports`.
//!
//! Documents are read from the server's file system. Analysis never fails
//! outright: without an analyzer, or when it errors, a default outline is
//! derived from the text.

use std::path::{Path, PathBuf};

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use storyboard_core::import::{self, DocumentParser, ImportAnalysis, ParsedDocument};

use crate::error::{AppError, AppResult};
use crate::handlers::projects::{open_project, ProjectView};
use crate::response::DataResponse;
use crate::state::AppState;

/// Exactly one of the fields should be set; `text` wins, then `path`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AnalyzeDocument {
    pub text: Option<String>,
    pub path: Option<String>,
    pub paths: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApplyOutline {
    pub outline_json: String,
}

async fn read_document(input: AnalyzeDocument) -> AppResult<ParsedDocument> {
    if let Some(text) = input.text.filter(|t| !t.trim().is_empty()) {
        return Ok(ParsedDocument::raw(text));
    }
    if let Some(path) = input.path.filter(|p| !p.trim().is_empty()) {
        let path = PathBuf::from(path);
        return Ok(tokio::task::spawn_blocking(move || DocumentParser::parse(&path)).await?);
    }
    if input.paths.is_empty() {
        return Err(AppError::BadRequest(
            "one of 'text', 'path' or 'paths' is required".into(),
        ));
    }

    let paths: Vec<PathBuf> = input.paths.into_iter().map(PathBuf::from).collect();
    tokio::task::spawn_blocking(move || {
        let refs: Vec<&Path> = paths.iter().map(PathBuf::as_path).collect();
        DocumentParser::parse_many(&refs)
    })
    .await?
    .ok_or_else(|| AppError::BadRequest("none of the files could be parsed".into()))
}

/// POST /api/v1/imports/analyze
pub async fn analyze(
    State(state): State<AppState>,
    Json(input): Json<AnalyzeDocument>,
) -> AppResult<Json<DataResponse<ImportAnalysis>>> {
    let document = read_document(input).await?;
    let analysis = import::analyze_document(state.analyzer.as_deref(), &document).await;
    tracing::info!(
        kind = %analysis.kind,
        success = analysis.success,
        used_fallback = analysis.used_fallback,
        "Document analyzed"
    );
    Ok(Json(DataResponse::new(analysis)))
}

/// POST /api/v1/imports/apply
///
/// Missing top-level outline fields are filled in before the project is built.
pub async fn apply(
    State(state): State<AppState>,
    Json(input): Json<ApplyOutline>,
) -> AppResult<(StatusCode, Json<DataResponse<ProjectView>>)> {
    let project = import::apply_outline(&input.outline_json)?;
    Ok(open_project(&state, project).await)
}
