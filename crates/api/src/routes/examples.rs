//! Route definitions for the built-in example stories.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::examples;
use crate::state::AppState;

/// Routes mounted at `/examples`.
///
/// ```text
/// GET    /          list
/// POST   /{name}    load into a new project
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(examples::list))
        .route("/{name}", post(examples::load))
}
