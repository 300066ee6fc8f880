pub mod examples;
pub mod health;
pub mod imports;
pub mod projects;
pub mod templates;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /templates                                       catalog, one template, suggestions
/// /examples                                        built-in stories, load one
///
/// /projects                                        create, list, load from store
/// /projects/{id}                                   summary, close, document
/// /projects/{id}/style, /seed, /save               style and seed policy, persist
/// /projects/{id}/characters[/{cid}]                reference library
/// /projects/{id}/scenes[/{sid}]                    reference library
/// /projects/{id}/props[/{pid}]                     reference library
/// /projects/{id}/shots[/{n}]                       shot list, move, prompt
/// /projects/{id}/shots/{n}/generate                one shot
/// /projects/{id}/generate                          every pending shot
/// /projects/{id}/export/{format}                   json, txt, zip, full
///
/// /imports/analyze                                 document to outline JSON
/// /imports/apply                                   outline JSON to project
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/templates", templates::router())
        .nest("/examples", examples::router())
        .nest("/projects", projects::router())
        .nest("/imports", imports::router())
}
