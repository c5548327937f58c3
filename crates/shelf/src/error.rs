//! CLI error types.

use shelf_config::ConfigError;
use shelf_search::SearchError;
use shelf_server::ServerError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Search(#[from] SearchError),

    #[error("{0}")]
    Server(#[from] ServerError),
}
