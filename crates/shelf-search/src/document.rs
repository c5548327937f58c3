//! Search documents and their sources.
//!
//! A [`SearchDocument`] is the plain-text form of one navigation node. The
//! index pulls documents from a [`DocumentSource`]; [`Workspace`] is the
//! production source, tests use in-memory vectors.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use shelf_export::{NavNode, TableData, Workspace};

static RULE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*(?:[-*_][ \t]*){3,}$").unwrap());
static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^[ \t]*#{1,6}[ \t]+").unwrap());
static IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!\[([^\]]*)\]\([^)]*\)").unwrap());
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\([^)]*\)").unwrap());
static STRONG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*|__").unwrap());
static STAR_EM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*([^*\n]+)\*").unwrap());
static UNDERSCORE_EM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b_([^_\n]+)_\b").unwrap());
static CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`+").unwrap());

/// What a document was extracted from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Page,
    Table,
}

/// Plain-text view of one node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SearchDocument {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: DocumentKind,
}

/// Supplies the documents an index is built from.
pub trait DocumentSource: Send + Sync {
    /// All documents, in the order ties should be ranked.
    fn documents(&self) -> Vec<SearchDocument>;
}

impl DocumentSource for Vec<SearchDocument> {
    fn documents(&self) -> Vec<SearchDocument> {
        self.clone()
    }
}

impl DocumentSource for Workspace {
    /// Every non-external node with a file or children, depth-first
    /// pre-order.
    fn documents(&self) -> Vec<SearchDocument> {
        let tree = self.tree();
        tree.flatten()
            .into_iter()
            .filter(|node| !node.is_external && node.has_content())
            .map(|node| document_for(self, node))
            .collect()
    }
}

fn document_for(workspace: &Workspace, node: &NavNode) -> SearchDocument {
    let (kind, content) = if node.is_csv {
        let content = workspace
            .table_path(node)
            .and_then(|path| workspace.tables().get_pair(&path))
            .map(|pair| table_text(&pair.all))
            .unwrap_or_default();
        (DocumentKind::Table, content)
    } else {
        let content = workspace
            .page_path(node)
            .and_then(|path| match workspace.content().read_page(&path) {
                Ok(page) => Some(plain_text(&page.content)),
                Err(e) => {
                    tracing::warn!(id = %node.id, error = %e, "Skipping unreadable page content");
                    None
                }
            })
            .unwrap_or_default();
        (DocumentKind::Page, content)
    };

    SearchDocument {
        id: node.id.clone(),
        title: node.title.clone(),
        slug: node.slug.clone(),
        content,
        kind,
    }
}

/// Strip markdown syntax down to searchable text.
///
/// Removes heading markers, emphasis and inline-code markers and horizontal
/// rules, keeps the visible text of links and images, and collapses all
/// whitespace.
pub fn plain_text(markdown: &str) -> String {
    let text = RULE_RE.replace_all(markdown, " ");
    let text = HEADING_RE.replace_all(&text, "");
    let text = IMAGE_RE.replace_all(&text, "$1");
    let text = LINK_RE.replace_all(&text, "$1");
    let text = STRONG_RE.replace_all(&text, "");
    let text = STAR_EM_RE.replace_all(&text, "$1");
    let text = UNDERSCORE_EM_RE.replace_all(&text, "$1");
    let text = CODE_RE.replace_all(&text, "");
    collapse_whitespace(&text)
}

/// Every cell value of a table, row by row in header order.
pub fn table_text(table: &TableData) -> String {
    let cells: Vec<&str> = table
        .rows
        .iter()
        .flat_map(|row| {
            table
                .headers
                .iter()
                .filter_map(|h| row.get(h).map(String::as_str))
        })
        .filter(|cell| !cell.trim().is_empty())
        .collect();
    collapse_whitespace(&cells.join(" "))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
