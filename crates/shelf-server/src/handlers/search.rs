//! Search API endpoints.
//!
//! All routes answer 404 while the `search` feature is off. Index builds
//! read the whole export, so they run on the blocking pool.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};
use shelf_search::{SearchDocument, SearchHit};

use crate::error::ServerError;
use crate::state::AppState;

/// Hits returned when no limit is given.
const DEFAULT_LIMIT: usize = 20;

/// Upper bound on requested hits.
const MAX_LIMIT: usize = 100;

#[derive(Deserialize)]
pub(crate) struct SearchQuery {
    q: Option<String>,
    limit: Option<usize>,
}

/// Response for GET /api/search.
#[derive(Serialize)]
pub(crate) struct SearchResponse {
    query: String,
    results: Vec<SearchHit>,
}

/// Response for POST /api/search/rebuild.
#[derive(Serialize)]
pub(crate) struct RebuildResponse {
    documents: usize,
}

fn ensure_enabled(state: &AppState) -> Result<(), ServerError> {
    if state.features().search {
        Ok(())
    } else {
        Err(ServerError::FeatureDisabled("search"))
    }
}

/// Handle GET /api/search?q=&limit=.
pub(crate) async fn search(
    Query(params): Query<SearchQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<SearchResponse>, ServerError> {
    ensure_enabled(&state)?;
    let query = params
        .q
        .ok_or_else(|| ServerError::BadRequest("missing `q` parameter".to_owned()))?;
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);

    let index = Arc::clone(&state.search);
    let q = query.clone();
    let results = tokio::task::spawn_blocking(move || index.search(&q, limit)).await??;

    Ok(Json(SearchResponse { query, results }))
}

/// Handle GET /api/search/documents.
pub(crate) async fn get_documents(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SearchDocument>>, ServerError> {
    ensure_enabled(&state)?;
    let index = Arc::clone(&state.search);
    let documents = tokio::task::spawn_blocking(move || index.documents()).await??;
    Ok(Json(documents))
}

/// Handle POST /api/search/rebuild.
pub(crate) async fn rebuild(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RebuildResponse>, ServerError> {
    ensure_enabled(&state)?;
    let index = Arc::clone(&state.search);
    let snapshot = tokio::task::spawn_blocking(move || index.rebuild()).await??;
    Ok(Json(RebuildResponse {
        documents: snapshot.documents().len(),
    }))
}
