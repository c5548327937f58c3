//! Error types for the HTTP server.

use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use shelf_export::ExportError;
use shelf_search::SearchError;

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Node, page, table or image does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Requested file lies outside the export roots.
    #[error("Forbidden path: {}", .0.display())]
    Forbidden(PathBuf),

    /// Request is missing or has an invalid parameter.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The feature behind this route is turned off.
    #[error("Feature disabled: {0}")]
    FeatureDisabled(&'static str),

    /// Reading the export failed.
    #[error(transparent)]
    Export(ExportError),

    /// Search index failure.
    #[error(transparent)]
    Search(SearchError),

    /// Binding or serving failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Listen address cannot be parsed.
    #[error("Invalid listen address: {0}")]
    Address(#[from] std::net::AddrParseError),

    /// Background task panicked or was cancelled.
    #[error("Task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<ExportError> for ServerError {
    fn from(error: ExportError) -> Self {
        match error {
            ExportError::NotFound(what) => Self::NotFound(what),
            ExportError::PathViolation(path) => Self::Forbidden(path),
            other @ ExportError::Io { .. } => Self::Export(other),
        }
    }
}

impl From<SearchError> for ServerError {
    fn from(error: SearchError) -> Self {
        match error {
            SearchError::Query(message) => Self::BadRequest(message),
            other @ SearchError::Index(_) => Self::Search(other),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::NotFound(what) => (
                StatusCode::NOT_FOUND,
                json!({"error": "Not found", "target": what}),
            ),
            Self::Forbidden(path) => (
                StatusCode::FORBIDDEN,
                json!({"error": "Forbidden", "path": path.display().to_string()}),
            ),
            Self::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                json!({"error": "Bad request", "detail": message}),
            ),
            Self::FeatureDisabled(feature) => (
                StatusCode::NOT_FOUND,
                json!({"error": "Feature disabled", "feature": feature}),
            ),
            Self::Export(_) | Self::Search(_) | Self::Io(_) | Self::Address(_) | Self::Join(_) => {
                tracing::error!(error = %self, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({"error": self.to_string()}),
                )
            }
        };

        (status, axum::Json(body)).into_response()
    }
}
