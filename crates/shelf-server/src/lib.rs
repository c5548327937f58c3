//! HTTP API for browsing a shelf workspace export.
//!
//! Serves JSON for the navigation tree, pages, tables and search results,
//! plus raw image bytes confined to the export roots.
//!
//! # Quick Start
//!
//! ```ignore
//! use shelf_config::Config;
//! use shelf_server::{ServerConfig, run_server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::load(None, None).unwrap();
//!     run_server(ServerConfig::from_config(&config)).await.unwrap();
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! Browser ──HTTP──► axum router (shelf-server)
//!                        │
//!                        ├─► /api/workspace, /api/pages, /api/tables, /api/images
//!                        │       └─► Workspace (shelf-export)
//!                        │
//!                        └─► /api/search*
//!                                └─► SearchIndex (shelf-search) ──► Workspace
//! ```

mod app;
mod error;
mod handlers;
mod middleware;
mod state;

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use shelf_config::{Config, Features, WorkspaceConfig};
use shelf_export::Workspace;
use state::AppState;

pub use error::ServerError;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Export locations.
    pub workspace: WorkspaceConfig,
    /// Presentation feature flags.
    pub features: Features,
}

impl ServerConfig {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            host: config.server.host.clone(),
            port: config.server.port,
            workspace: config.workspace_resolved.clone(),
            features: config.features,
        }
    }
}

/// Run the server until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the address is invalid or the listener fails.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let workspace = Workspace::new(config.workspace, config.features);
    let state = Arc::new(AppState::new(workspace));
    let app = app::create_router(state);

    let addr = SocketAddr::from_str(&format!("{}:{}", config.host, config.port))?;
    tracing::info!(address = %addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        return;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}
