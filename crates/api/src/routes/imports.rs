//! Route definitions for document import.

use axum::routing::post;
use axum::Router;

use crate::handlers::imports;
use crate::state::AppState;

/// Routes mounted at `/imports`.
///
/// ```text
/// POST   /analyze    parse and analyze a document
/// POST   /apply      open a project from outline JSON
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/analyze", post(imports::analyze))
        .route("/apply", post(imports::apply))
}
