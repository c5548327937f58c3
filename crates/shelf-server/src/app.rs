//! Router construction.
//!
//! Builds the axum router with all routes and middleware.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::security;
use crate::state::AppState;

/// Create the application router.
pub(crate) fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/api/config", get(handlers::config::get_config))
        .route("/api/workspace", get(handlers::workspace::get_workspace))
        .route("/api/pages/{slug_or_id}", get(handlers::pages::get_page))
        .route("/api/tables/{slug_or_id}", get(handlers::tables::get_table))
        .route("/api/images", get(handlers::images::get_image))
        .route("/api/search", get(handlers::search::search))
        .route(
            "/api/search/documents",
            get(handlers::search::get_documents),
        )
        .route("/api/search/rebuild", post(handlers::search::rebuild));

    Router::new()
        .merge(api_routes)
        .layer(security::layers())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
