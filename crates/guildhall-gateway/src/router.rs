use axum::Router;
use axum::middleware;
use axum::routing::{delete, get, post};
use tower_http::trace::TraceLayer;

use crate::auth::require_admin;
use crate::installation::{base_url_handler, update_handler};
use crate::registration::{assign_handler, delete_handler, list_handler};
use crate::state::SharedState;

pub fn build_router(state: SharedState) -> Router {
    // Registration data and the update run are for administrators only.
    let admin = Router::new()
        .route("/adm_program/modules/registration", get(list_handler))
        .route(
            "/adm_program/modules/registration/{uuid}/assign",
            post(assign_handler),
        )
        .route(
            "/adm_program/modules/registration/{uuid}",
            delete(delete_handler),
        )
        .route("/adm_program/installation/update", post(update_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/adm_program/installation/base-url", get(base_url_handler))
        .merge(admin)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
