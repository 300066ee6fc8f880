//! Handlers for the `/templates` resource.

use axum::extract::{Path, Query};
use axum::Json;
use serde::Deserialize;
use storyboard_core::error::CoreError;
use storyboard_core::templates::{
    all_templates, get_by_code, list_by_category, ShotTemplate, TemplateCategory,
    TemplateDefinition,
};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;

#[derive(Debug, Deserialize)]
pub struct TemplateQuery {
    pub category: Option<String>,
}

/// Accepts a persisted value (`T4_standard_medium`) or a short code (`CU`).
fn resolve(template: &str) -> Result<&'static TemplateDefinition, CoreError> {
    ShotTemplate::from_value(template)
        .map(ShotTemplate::definition)
        .or_else(|| get_by_code(template))
        .ok_or_else(|| CoreError::not_found("template", template))
}

/// GET /api/v1/templates
pub async fn list(
    Query(query): Query<TemplateQuery>,
) -> AppResult<Json<DataResponse<Vec<&'static TemplateDefinition>>>> {
    let templates = match query.category.as_deref() {
        None => all_templates().iter().collect(),
        Some(raw) => {
            let category = TemplateCategory::parse(raw)
                .ok_or_else(|| AppError::BadRequest(format!("unknown template category '{raw}'")))?;
            list_by_category(category)
        }
    };
    Ok(Json(DataResponse::new(templates)))
}

/// GET /api/v1/templates/{template}
pub async fn get(
    Path(template): Path<String>,
) -> AppResult<Json<DataResponse<&'static TemplateDefinition>>> {
    Ok(Json(DataResponse::new(resolve(&template)?)))
}

/// GET /api/v1/templates/{template}/suggestions
pub async fn suggestions(
    Path(template): Path<String>,
) -> AppResult<Json<DataResponse<Vec<&'static TemplateDefinition>>>> {
    let current = resolve(&template)?.template_type;
    let next = current
        .suggest_next()
        .into_iter()
        .map(ShotTemplate::definition)
        .collect();
    Ok(Json(DataResponse::new(next)))
}
