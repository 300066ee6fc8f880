//! Route definitions for open projects and everything they own.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{characters, export, generation, projects, props, scenes, shots};
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// GET    /                                list
/// POST   /                                create
/// GET    /stored                          names in the project store
/// POST   /load                            load from the project store
/// GET    /{id}                            get
/// DELETE /{id}                            close
/// GET    /{id}/document                   document
/// PUT    /{id}/style                      update_style
/// POST   /{id}/style/preset               apply_preset
/// PUT    /{id}/seed                       update_seed
/// POST   /{id}/save                       save
///
/// GET    /{id}/characters                 list
/// POST   /{id}/characters                 create
/// PUT    /{id}/characters/{cid}           update
/// DELETE /{id}/characters/{cid}           delete
///
/// GET    /{id}/scenes                     list
/// POST   /{id}/scenes                     create
/// PUT    /{id}/scenes/{sid}               update
/// DELETE /{id}/scenes/{sid}               delete
///
/// GET    /{id}/props                      list
/// POST   /{id}/props                      create
/// DELETE /{id}/props/{pid}                delete
///
/// GET    /{id}/shots                      list
/// POST   /{id}/shots                      create
/// PUT    /{id}/shots/{n}                  update
/// DELETE /{id}/shots/{n}                  delete
/// POST   /{id}/shots/{n}/move             move
/// GET    /{id}/shots/{n}/prompt           prompt
/// POST   /{id}/shots/{n}/generate         generate_shot
///
/// POST   /{id}/generate                   generate_all
/// POST   /{id}/export/{format}            export
/// ```
pub fn router() -> Router<AppState> {
    let character_routes = Router::new()
        .route("/", get(characters::list).post(characters::create))
        .route("/{cid}", put(characters::update).delete(characters::delete));

    let scene_routes = Router::new()
        .route("/", get(scenes::list).post(scenes::create))
        .route("/{sid}", put(scenes::update).delete(scenes::delete));

    let prop_routes = Router::new()
        .route("/", get(props::list).post(props::create))
        .route("/{pid}", axum::routing::delete(props::delete));

    let shot_routes = Router::new()
        .route("/", get(shots::list).post(shots::create))
        .route("/{n}", put(shots::update).delete(shots::delete))
        .route("/{n}/move", post(shots::move_shot))
        .route("/{n}/prompt", get(shots::prompt))
        .route("/{n}/generate", post(generation::generate_shot));

    Router::new()
        .route("/", get(projects::list).post(projects::create))
        .route("/stored", get(projects::stored))
        .route("/load", post(projects::load))
        .route("/{id}", get(projects::get).delete(projects::close))
        .route("/{id}/document", get(projects::document))
        .route("/{id}/style", put(projects::update_style))
        .route("/{id}/style/preset", post(projects::apply_preset))
        .route("/{id}/seed", put(projects::update_seed))
        .route("/{id}/save", post(projects::save))
        .route("/{id}/generate", post(generation::generate_all))
        .route("/{id}/export/{format}", post(export::export))
        .nest("/{id}/characters", character_routes)
        .nest("/{id}/scenes", scene_routes)
        .nest("/{id}/props", prop_routes)
        .nest("/{id}/shots", shot_routes)
}
