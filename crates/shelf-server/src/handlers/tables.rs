//! Tables API endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use shelf_export::ResolvedTable;

use crate::error::ServerError;
use crate::state::AppState;

/// Handle GET /api/tables/{slug_or_id}.
///
/// Responds with both table variants, the configured default variant and
/// per-value colors.
pub(crate) async fn get_table(
    Path(slug_or_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<ResolvedTable>, ServerError> {
    let table = state.workspace.table(&slug_or_id)?;
    Ok(Json(table))
}
