//! Images API endpoint.
//!
//! Serves image bytes referenced by pages, confined to the export roots.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use serde::Deserialize;

use crate::error::ServerError;
use crate::state::AppState;

#[derive(Deserialize)]
pub(crate) struct ImageQuery {
    path: Option<String>,
}

/// Handle GET /api/images?path=.
pub(crate) async fn get_image(
    Query(query): Query<ImageQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServerError> {
    let path = query
        .path
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| ServerError::BadRequest("missing `path` parameter".to_owned()))?;

    let image = state.workspace.image(&path)?;
    Ok((
        [
            (header::CONTENT_TYPE, image.mime),
            (header::CACHE_CONTROL, "private, max-age=3600".to_owned()),
        ],
        image.bytes,
    ))
}
