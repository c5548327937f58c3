//! Search error types.

/// Errors from building or querying the search index.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Index construction or lookup failed.
    #[error("Search index error: {0}")]
    Index(#[from] tantivy::TantivyError),
    /// The query cannot be run.
    #[error("Invalid query: {0}")]
    Query(String),
}
