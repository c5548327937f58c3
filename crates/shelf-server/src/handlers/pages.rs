//! Pages API endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use shelf_export::ResolvedPage;

use crate::error::ServerError;
use crate::state::AppState;

/// Handle GET /api/pages/{slug_or_id}.
///
/// Responds with the node, markdown, title, images, headings, icon and
/// breadcrumbs; disabled features leave their fields empty.
pub(crate) async fn get_page(
    Path(slug_or_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<ResolvedPage>, ServerError> {
    let page = state.workspace.page(&slug_or_id)?;
    Ok(Json(page))
}
