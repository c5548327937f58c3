//! `shelf search` command implementation.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use shelf_config::{CliSettings, Config};
use shelf_export::Workspace;
use shelf_search::SearchIndex;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the search command.
#[derive(Args)]
pub(crate) struct SearchArgs {
    /// Search terms.
    query: String,

    /// Maximum number of hits to print.
    #[arg(short, long, default_value_t = 10)]
    limit: usize,

    /// Path to configuration file (default: auto-discover shelf.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Markdown/CSV export directory (overrides config).
    #[arg(short, long, env = "SHELF_MARKDOWN_ROOT")]
    markdown_root: Option<PathBuf>,

    /// HTML export directory (overrides config).
    #[arg(long, env = "SHELF_HTML_ROOT")]
    html_root: Option<PathBuf>,
}

impl SearchArgs {
    /// Build the index once and print ranked hits.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let cli_settings = CliSettings {
            markdown_root: self.markdown_root,
            html_root: self.html_root,
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let index = SearchIndex::new(Arc::new(Workspace::from_config(&config)));

        let hits = index.search(&self.query, self.limit)?;
        if hits.is_empty() {
            output.info(&format!("No results for {:?}", self.query));
            return Ok(());
        }
        for hit in hits {
            output.line(&format!(
                "{} {}",
                output.highlight(&hit.title),
                output.muted(&format!("({}, {:.2})", hit.slug, hit.score))
            ));
            output.line(&format!("    {}", hit.excerpt));
        }
        Ok(())
    }
}
