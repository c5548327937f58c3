//! Workspace API endpoint.
//!
//! Returns the navigation tree of the export.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use shelf_export::WorkspaceData;

use crate::state::AppState;

/// Handle GET /api/workspace.
pub(crate) async fn get_workspace(State(state): State<Arc<AppState>>) -> Json<WorkspaceData> {
    Json(state.workspace.tree())
}
