//! `shelf tree` command implementation.

use std::path::PathBuf;

use clap::Args;
use shelf_config::{CliSettings, Config};
use shelf_export::{NavNode, Workspace};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the tree command.
#[derive(Args)]
pub(crate) struct TreeArgs {
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

impl TreeArgs {
    /// Print the navigation tree of the export.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let cli_settings = CliSettings {
            markdown_root: self.markdown_root,
            html_root: self.html_root,
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let tree = Workspace::from_config(&config).tree();

        output.line(&output.highlight(&tree.name));
        if tree.is_empty() {
            output.info("No navigation entries found");
            return Ok(());
        }
        let mut lines = Vec::new();
        for node in &tree.nodes {
            render(node, 0, &mut lines);
        }
        for (text, detail) in lines {
            output.line(&format!("{text} {}", output.muted(&detail)));
        }
        Ok(())
    }
}

/// Indented title plus `(slug)` and markers for each node, pre-order.
fn render(node: &NavNode, depth: usize, lines: &mut Vec<(String, String)>) {
    let mut detail = format!("({})", node.slug);
    if node.is_csv {
        detail.push_str(" [table]");
    }
    if node.is_external {
        detail.push_str(" [external]");
    }
    lines.push((format!("{}{}", "  ".repeat(depth), node.title), detail));
    for child in &node.children {
        render(child, depth + 1, lines);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn node(title: &str, slug: &str) -> NavNode {
        NavNode {
            title: title.to_owned(),
            slug: slug.to_owned(),
            ..NavNode::default()
        }
    }

    #[test]
    fn test_render_indents_and_marks() {
        let mut root = node("Home", "home-aaaaaaaa");
        let mut table = node("Tasks", "tasks-bbbbbbbb");
        table.is_csv = true;
        let mut link = node("Docs", "docs");
        link.is_external = true;
        root.children = vec![table, link];

        let mut lines = Vec::new();
        render(&root, 0, &mut lines);

        assert_eq!(
            lines,
            vec![
                ("Home".to_owned(), "(home-aaaaaaaa)".to_owned()),
                ("  Tasks".to_owned(), "(tasks-bbbbbbbb) [table]".to_owned()),
                ("  Docs".to_owned(), "(docs) [external]".to_owned()),
            ]
        );
    }
}
