//! `shelf serve` command implementation.

use std::path::PathBuf;

use clap::Args;
use shelf_config::{CliSettings, Config};
use shelf_server::{ServerConfig, run_server};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    /// Path to configuration file (default: auto-discover shelf.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Markdown/CSV export directory (overrides config).
    #[arg(short, long, env = "SHELF_MARKDOWN_ROOT")]
    markdown_root: Option<PathBuf>,

    /// HTML export directory (overrides config).
    #[arg(long, env = "SHELF_HTML_ROOT")]
    html_root: Option<PathBuf>,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose output (request and index build logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the server fails to start.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            host: self.host,
            port: self.port,
            markdown_root: self.markdown_root,
            html_root: self.html_root,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        output.info(&format!(
            "Starting server on {}:{}",
            config.server.host, config.server.port
        ));
        output.info(&format!(
            "Markdown export: {}",
            config.workspace_resolved.markdown_root.display()
        ));
        match &config.workspace_resolved.html_root {
            Some(html_root) => output.info(&format!("HTML export: {}", html_root.display())),
            None => output.info("HTML export: none (icons and colors disabled)"),
        }
        if !config.features.search {
            output.info("Search: disabled");
        }

        run_server(ServerConfig::from_config(&config)).await?;
        Ok(())
    }
}
