//! Route definitions for the shot template catalog.

use axum::routing::get;
use axum::Router;

use crate::handlers::templates;
use crate::state::AppState;

/// Routes mounted at `/templates`.
///
/// ```text
/// GET    /                          list (optional ?category=)
/// GET    /{template}                get
/// GET    /{template}/suggestions    suggest_next
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(templates::list))
        .route("/{template}", get(templates::get))
        .route("/{template}/suggestions", get(templates::suggestions))
}
