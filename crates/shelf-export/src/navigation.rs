//! Navigation tree builder.
//!
//! Rebuilds the page hierarchy from the export's navigation markup: a
//! document of nested `<ul>` lists, one per page, each carrying an
//! `id::<identifier>` marker and either a link to the page file, a bare
//! label (section headers and inline table placeholders), or nothing but
//! nested lists.
//!
//! The parser is a recursive descent over [`markup`](crate::markup) tokens.
//! Each list returns the nodes it contributes to its parent together with
//! the token index after its closing tag, so a single forward pass builds the
//! tree and cycles are impossible.
//!
//! Pruned while parsing:
//! - the workspace root node (its children are promoted),
//! - external links back to the exporter's own site,
//! - inline table placeholders without children.

use std::fs;
use std::io;
use std::path::Path;

use serde::Serialize;

use crate::ident::{
    clean_title, decode_path, extract_identifier, has_inline_annotation, ids_match,
    normalize_identifier, slug_with_id, slugify,
};
use crate::markup::{Tag, Token, element_text, tokenize};
use crate::metadata::Icon;

/// Display name used when the markup names no workspace.
pub const DEFAULT_WORKSPACE_NAME: &str = "Workspace";

/// Hosts the exporter links back to from inside an export.
const LINK_BACK_DOMAINS: &[&str] = &["notion.so", "notion.site"];

/// One entry in the navigation hierarchy.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavNode {
    /// Normalized identifier, or a sanitized marker when none is embedded.
    pub id: String,
    pub title: String,
    /// Slugified title suffixed with the short identifier.
    pub slug: String,
    /// Path of the backing file relative to the markdown root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    pub is_external: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
    pub is_csv: bool,
    pub is_inline_db: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<Icon>,
    pub children: Vec<NavNode>,
}

impl NavNode {
    /// Whether the node has something to show: a backing file or children.
    pub fn has_content(&self) -> bool {
        self.file_path.is_some() || !self.children.is_empty()
    }
}

/// Root container of a parsed workspace.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WorkspaceData {
    pub id: String,
    pub name: String,
    pub nodes: Vec<NavNode>,
}

impl Default for WorkspaceData {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: DEFAULT_WORKSPACE_NAME.to_owned(),
            nodes: Vec::new(),
        }
    }
}

impl WorkspaceData {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// First node, depth-first pre-order, whose id prefix-matches `id`.
    pub fn find_by_id(&self, id: &str) -> Option<&NavNode> {
        self.flatten().into_iter().find(|node| ids_match(&node.id, id))
    }

    /// First node whose slug is exactly `slug`.
    pub fn find_by_slug(&self, slug: &str) -> Option<&NavNode> {
        self.flatten().into_iter().find(|node| node.slug == slug)
    }

    /// Root-first path to the node matching `id`, ending with that node.
    ///
    /// Empty when no node matches.
    pub fn breadcrumbs(&self, id: &str) -> Vec<&NavNode> {
        let mut path = Vec::new();
        if collect_path(&self.nodes, id, &mut path) {
            path
        } else {
            Vec::new()
        }
    }

    /// All nodes in depth-first pre-order.
    pub fn flatten(&self) -> Vec<&NavNode> {
        let mut out = Vec::new();
        flatten_into(&self.nodes, &mut out);
        out
    }

    /// Apply `f` to every node, depth-first pre-order.
    pub fn visit_mut(&mut self, f: &mut impl FnMut(&mut NavNode)) {
        visit_nodes_mut(&mut self.nodes, f);
    }
}

fn collect_path<'a>(nodes: &'a [NavNode], id: &str, path: &mut Vec<&'a NavNode>) -> bool {
    for node in nodes {
        path.push(node);
        if ids_match(&node.id, id) || collect_path(&node.children, id, path) {
            return true;
        }
        path.pop();
    }
    false
}

fn flatten_into<'a>(nodes: &'a [NavNode], out: &mut Vec<&'a NavNode>) {
    for node in nodes {
        out.push(node);
        flatten_into(&node.children, out);
    }
}

fn visit_nodes_mut(nodes: &mut [NavNode], f: &mut impl FnMut(&mut NavNode)) {
    for node in nodes {
        f(node);
        visit_nodes_mut(&mut node.children, f);
    }
}

/// Load and parse the navigation file.
///
/// Looks in the markdown root first, then the HTML root. A missing or
/// unreadable file yields an empty workspace.
pub fn load_workspace(
    markdown_root: &Path,
    html_root: Option<&Path>,
    navigation_file: &str,
) -> WorkspaceData {
    let candidates = std::iter::once(markdown_root).chain(html_root);
    for root in candidates {
        let path = root.join(navigation_file);
        match fs::read_to_string(&path) {
            Ok(markup) => {
                tracing::debug!(path = %path.display(), "Parsing navigation markup");
                return parse_navigation(&markup);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Unreadable navigation file");
                return WorkspaceData::default();
            }
        }
    }
    tracing::debug!(root = %markdown_root.display(), "No navigation file, empty workspace");
    WorkspaceData::default()
}

/// Parse navigation markup into a workspace tree.
pub fn parse_navigation(markup: &str) -> WorkspaceData {
    let tokens = tokenize(markup);
    let mut parser = NavParser::new(&tokens);
    let mut nodes = Vec::new();
    let mut document_title = None;

    let mut idx = 0;
    while idx < tokens.len() {
        if tokens[idx].as_start("ul").is_some() {
            let (parsed, next) = parser.parse_list(idx);
            nodes.extend(parsed);
            idx = next;
        } else if document_title.is_none() && tokens[idx].as_start("title").is_some() {
            let (text, next) = element_text(&tokens, idx);
            document_title = Some(clean_title(&text)).filter(|t| !t.is_empty());
            idx = next;
        } else {
            idx += 1;
        }
    }

    let (id, name) = match parser.workspace {
        Some(root) => root,
        None => (
            String::new(),
            document_title.unwrap_or_else(|| DEFAULT_WORKSPACE_NAME.to_owned()),
        ),
    };
    WorkspaceData { id, name, nodes }
}

/// Label found inside a list node.
struct Label {
    text: String,
    href: Option<String>,
    inline: bool,
}

struct NavParser<'t> {
    tokens: &'t [Token],
    /// Identifier and name of the pruned workspace root, first one wins.
    workspace: Option<(String, String)>,
}

impl<'t> NavParser<'t> {
    fn new(tokens: &'t [Token]) -> Self {
        Self {
            tokens,
            workspace: None,
        }
    }

    /// Parse the list starting at `start` (a `<ul>` start tag).
    ///
    /// Returns the nodes this list contributes to its parent and the index
    /// just past its closing tag.
    fn parse_list(&mut self, start: usize) -> (Vec<NavNode>, usize) {
        let tokens = self.tokens;
        let Some(Token::Start(list_tag)) = tokens.get(start) else {
            return (Vec::new(), start + 1);
        };
        let marker = list_tag
            .attr("id")
            .map(|id| id.trim().trim_start_matches("id::").to_owned())
            .unwrap_or_default();
        let list_inline = list_tag.class_contains("inline");

        let mut anchor: Option<Label> = None;
        let mut fallback: Option<Label> = None;
        let mut children = Vec::new();
        let mut seen_child_list = false;

        let mut idx = start + 1;
        while let Some(token) = tokens.get(idx) {
            match token {
                Token::End(name) if name == "ul" => {
                    idx += 1;
                    break;
                }
                Token::Start(tag) if tag.name == "ul" => {
                    seen_child_list = true;
                    let (nested, next) = self.parse_list(idx);
                    children.extend(nested);
                    idx = next;
                }
                Token::Start(tag) if tag.name == "a" && anchor.is_none() => {
                    let (text, next) = element_text(tokens, idx);
                    anchor = Some(label_from(tag, text, list_inline));
                    idx = next;
                }
                Token::Start(tag)
                    if matches!(tag.name.as_str(), "summary" | "span")
                        && fallback.is_none()
                        && anchor.is_none()
                        && !seen_child_list =>
                {
                    // Inner anchors still get their own turn, so don't skip.
                    let (text, _) = element_text(tokens, idx);
                    if !text.is_empty() {
                        fallback = Some(label_from(tag, text, list_inline));
                    }
                    idx += 1;
                }
                _ => idx += 1,
            }
        }

        let Some(label) = anchor.or(fallback) else {
            // No label: the list only groups its children.
            return (children, idx);
        };
        (self.build_node(&marker, label, children), idx)
    }

    fn build_node(&mut self, marker: &str, label: Label, children: Vec<NavNode>) -> Vec<NavNode> {
        let mut title = clean_title(&label.text);

        if is_workspace_root(&title, marker) {
            if self.workspace.is_none() {
                let id = match extract_identifier(marker) {
                    id if !id.is_empty() => id,
                    _ => normalize_identifier(marker),
                };
                let name = if title.is_empty() {
                    DEFAULT_WORKSPACE_NAME.to_owned()
                } else {
                    title
                };
                self.workspace = Some((id, name));
            }
            return children;
        }

        let mut node = NavNode {
            is_inline_db: label.inline,
            ..NavNode::default()
        };

        if let Some(href) = label.href.as_deref().map(str::trim).filter(|h| !h.is_empty()) {
            if is_absolute_url(href) {
                if is_link_back(href) {
                    tracing::debug!(href, "Dropping exporter link-back");
                    return Vec::new();
                }
                node.is_external = true;
                node.external_url = Some(href.to_owned());
            } else {
                let path = to_markdown_path(&decode_path(strip_fragment(href)));
                node.is_csv = has_extension(&path, "csv");
                node.file_path = Some(path);
            }
        }

        if node.is_inline_db && children.is_empty() {
            return Vec::new();
        }

        if title.is_empty()
            && let Some(path) = &node.file_path
        {
            let stem = path.rsplit('/').next().unwrap_or(path);
            title = clean_title(stem);
        }
        if title.is_empty() {
            title = "Untitled".to_owned();
        }

        node.id = [Some(marker), node.file_path.as_deref(), Some(title.as_str())]
            .into_iter()
            .flatten()
            .map(extract_identifier)
            .find(|id| !id.is_empty())
            .unwrap_or_else(|| sanitize_marker(marker));

        let base = match slugify(&title) {
            s if s.is_empty() => slugify(marker),
            s => s,
        };
        node.slug = slug_with_id(&base, &node.id).into_owned();
        node.title = title;
        node.children = children;
        vec![node]
    }
}

fn label_from(tag: &Tag, text: String, list_inline: bool) -> Label {
    let inline = list_inline || tag.class_contains("inline") || has_inline_annotation(&text);
    Label {
        href: tag.attr("href").map(str::to_owned),
        inline,
        text,
    }
}

fn is_workspace_root(title: &str, marker: &str) -> bool {
    title.eq_ignore_ascii_case(DEFAULT_WORKSPACE_NAME)
        || marker.to_ascii_lowercase().starts_with("workspace")
}

fn is_absolute_url(href: &str) -> bool {
    let lower = href.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Whether an absolute URL points at one of the exporter's own domains.
fn is_link_back(url: &str) -> bool {
    let after_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let authority = after_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    let host_port = authority.rsplit('@').next().unwrap_or(authority);
    let host = host_port
        .split(':')
        .next()
        .unwrap_or(host_port)
        .to_ascii_lowercase();

    LINK_BACK_DOMAINS.iter().any(|domain| {
        host == *domain
            || host
                .strip_suffix(domain)
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}

fn strip_fragment(href: &str) -> &str {
    href.split(['#', '?']).next().unwrap_or(href)
}

/// Rewrite an HTML export link to its markdown export counterpart.
fn to_markdown_path(path: &str) -> String {
    let path = path.trim_start_matches("./");
    if has_extension(path, "html") {
        format!("{}.md", &path[..path.len() - ".html".len()])
    } else {
        path.to_owned()
    }
}

pub(crate) fn has_extension(path: &str, ext: &str) -> bool {
    Path::new(path)
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

fn sanitize_marker(marker: &str) -> String {
    marker
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const ID_A: &str = "aaaaaaaa111122223333444444444444";
    const ID_B: &str = "bbbbbbbb111122223333444444444444";
    const ID_C: &str = "cccccccc111122223333444444444444";

    fn page(id: &str, href: &str, text: &str, inner: &str) -> String {
        format!(r#"<ul id="id::{id}"><li><a href="{href}">{text}</a>{inner}</li></ul>"#)
    }

    #[test]
    fn test_parse_simple_page() {
        let markup = page(ID_A, &format!("Home%20{ID_A}.html"), "Home", "");
        let ws = parse_navigation(&markup);

        assert_eq!(ws.nodes.len(), 1);
        let node = &ws.nodes[0];
        assert_eq!(node.id, ID_A);
        assert_eq!(node.title, "Home");
        assert_eq!(node.slug, "home-aaaaaaaa");
        assert_eq!(node.file_path.as_deref(), Some(format!("Home {ID_A}.md").as_str()));
        assert!(!node.is_external);
        assert!(!node.is_csv);
    }

    #[test]
    fn test_nested_children_in_document_order() {
        let child_b = page(ID_B, "B.md", "Beta", "");
        let child_c = page(ID_C, "C.csv", "Gamma", "");
        let markup = page(ID_A, "A.md", "Alpha", &format!("{child_b}{child_c}"));
        let ws = parse_navigation(&markup);

        let root = &ws.nodes[0];
        let titles: Vec<_> = root.children.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Beta", "Gamma"]);
        assert!(root.children[1].is_csv);
    }

    #[test]
    fn test_workspace_root_pruned_and_children_promoted() {
        let child = page(ID_B, "B.md", "Beta", "");
        let markup = format!(
            r#"<ul id="id::workspace-abc"><li><a>Workspace</a>{child}</li></ul>{}"#,
            page(ID_C, "C.md", "Gamma", "")
        );
        let ws = parse_navigation(&markup);

        assert_eq!(ws.id, "workspaceabc");
        assert_eq!(ws.name, "Workspace");
        let titles: Vec<_> = ws.nodes.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["Beta", "Gamma"]);
    }

    #[test]
    fn test_workspace_root_by_marker_keeps_name() {
        let markup = format!(
            r#"<ul id="id::workspace-{ID_A}"><li><a>Acme Wiki</a>{}</li></ul>"#,
            page(ID_B, "B.md", "Beta", "")
        );
        let ws = parse_navigation(&markup);
        assert_eq!(ws.id, ID_A);
        assert_eq!(ws.name, "Acme Wiki");
        assert_eq!(ws.nodes.len(), 1);
    }

    #[test]
    fn test_external_links() {
        let external = page(ID_A, "https://example.com/doc", "Docs", "");
        let link_back = page(ID_B, "https://www.notion.so/abc", "Open in Notion", "");
        let ws = parse_navigation(&format!("{external}{link_back}"));

        assert_eq!(ws.nodes.len(), 1);
        let node = &ws.nodes[0];
        assert!(node.is_external);
        assert_eq!(node.external_url.as_deref(), Some("https://example.com/doc"));
        assert_eq!(node.file_path, None);
        assert!(!node.is_csv);
    }

    #[test]
    fn test_inline_placeholder_without_children_dropped() {
        let placeholder = format!(r#"<ul id="id::{ID_A}"><li><a>Bugs (inline database)</a></li></ul>"#);
        let ws = parse_navigation(&placeholder);
        assert!(ws.is_empty());
    }

    #[test]
    fn test_inline_with_children_kept() {
        let row = page(ID_B, "Bugs/Row.md", "Row", "");
        let markup = format!(
            r#"<ul id="id::{ID_A}"><li><span class="inline-db">Bugs</span>{row}</li></ul>"#
        );
        let ws = parse_navigation(&markup);
        let node = &ws.nodes[0];
        assert!(node.is_inline_db);
        assert_eq!(node.title, "Bugs");
        assert_eq!(node.file_path, None);
        assert_eq!(node.children.len(), 1);
    }

    #[test]
    fn test_section_header_from_summary() {
        let child = page(ID_B, "B.md", "Beta", "");
        let markup = format!(
            r#"<ul id="id::{ID_A}"><li><details><summary>Section</summary>{child}</details></li></ul>"#
        );
        let ws = parse_navigation(&markup);
        assert_eq!(ws.nodes[0].title, "Section");
        assert_eq!(ws.nodes[0].id, ID_A);
        assert_eq!(ws.nodes[0].children[0].title, "Beta");
    }

    #[test]
    fn test_summary_with_anchor_prefers_anchor() {
        let markup = format!(
            r#"<ul id="id::{ID_A}"><li><details><summary><a href="A.md">Alpha</a></summary></details></li></ul>"#
        );
        let ws = parse_navigation(&markup);
        assert_eq!(ws.nodes[0].file_path.as_deref(), Some("A.md"));
    }

    #[test]
    fn test_unlabelled_list_is_transparent() {
        let inner = page(ID_B, "B.md", "Beta", "");
        let markup = format!(r#"<ul class="wrapper">{inner}</ul>"#);
        let ws = parse_navigation(&markup);
        assert_eq!(ws.nodes.len(), 1);
        assert_eq!(ws.nodes[0].title, "Beta");
    }

    #[test]
    fn test_id_falls_back_to_path_then_marker() {
        let from_path = format!(
            r#"<ul id="id::no-id-here"><li><a href="Notes%20{ID_B}.md">Notes</a></li></ul>"#
        );
        let ws = parse_navigation(&from_path);
        assert_eq!(ws.nodes[0].id, ID_B);

        let from_marker = r#"<ul id="id::Plain Marker!"><li><a href="x.md">X</a></li></ul>"#;
        let ws = parse_navigation(from_marker);
        assert_eq!(ws.nodes[0].id, "plainmarker");
        assert_eq!(ws.nodes[0].slug, "x-plainmar");
    }

    #[test]
    fn test_duplicate_titles_get_distinct_slugs() {
        let markup = format!(
            "{}{}",
            page(ID_A, "a.md", "Notes", ""),
            page(ID_B, "b.md", "Notes", "")
        );
        let ws = parse_navigation(&markup);
        assert_eq!(ws.nodes[0].slug, "notes-aaaaaaaa");
        assert_eq!(ws.nodes[1].slug, "notes-bbbbbbbb");
    }

    #[test]
    fn test_title_from_file_name_when_text_empty() {
        let markup = page(ID_A, &format!("Plans%20{ID_A}.md"), "", "");
        let ws = parse_navigation(&markup);
        assert_eq!(ws.nodes[0].title, "Plans");
    }

    #[test]
    fn test_document_title_used_as_name() {
        let markup = format!("<title>Team Space</title>{}", page(ID_A, "a.md", "A", ""));
        let ws = parse_navigation(&markup);
        assert_eq!(ws.name, "Team Space");
    }

    #[test]
    fn test_malformed_markup_degrades() {
        let ws = parse_navigation(r#"<ul id="id::x"><li><a href="a.md">A"#);
        assert_eq!(ws.nodes.len(), 1);
        assert_eq!(ws.nodes[0].title, "A");

        assert!(parse_navigation("not markup at all").is_empty());
        assert!(parse_navigation("").is_empty());
    }

    fn sample_tree() -> WorkspaceData {
        let grandchild = page(ID_C, "C.md", "Gamma", "");
        let child = page(ID_B, "B.md", "Beta", &grandchild);
        parse_navigation(&page(ID_A, "A.md", "Alpha", &child))
    }

    #[test]
    fn test_find_by_id_prefix() {
        let ws = sample_tree();
        assert_eq!(ws.find_by_id(ID_C).map(|n| n.title.as_str()), Some("Gamma"));
        assert_eq!(ws.find_by_id("cccccccc").map(|n| n.title.as_str()), Some("Gamma"));
        assert_eq!(
            ws.find_by_id("CCCCCCCC-0000").map(|n| n.title.as_str()),
            Some("Gamma")
        );
        assert!(ws.find_by_id("dddddddd").is_none());
    }

    #[test]
    fn test_find_by_slug_exact_only() {
        let ws = sample_tree();
        assert_eq!(
            ws.find_by_slug("beta-bbbbbbbb").map(|n| n.id.as_str()),
            Some(ID_B)
        );
        assert!(ws.find_by_slug("beta").is_none());
        assert!(ws.find_by_slug("beta-bbbbbbbb1").is_none());
    }

    #[test]
    fn test_breadcrumbs_root_first() {
        let ws = sample_tree();
        let crumbs: Vec<_> = ws
            .breadcrumbs("cccccccc")
            .iter()
            .map(|n| n.title.as_str())
            .collect();
        assert_eq!(crumbs, vec!["Alpha", "Beta", "Gamma"]);
        assert!(ws.breadcrumbs("dddddddd").is_empty());
    }

    #[test]
    fn test_flatten_pre_order() {
        let ws = sample_tree();
        let ids: Vec<_> = ws.flatten().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec![ID_A, ID_B, ID_C]);
    }

    #[test]
    fn test_load_workspace_fallback_to_html_root() {
        let md = tempfile::tempdir().unwrap();
        let html = tempfile::tempdir().unwrap();
        fs::write(html.path().join("index.html"), page(ID_A, "A.html", "Alpha", "")).unwrap();

        let ws = load_workspace(md.path(), Some(html.path()), "index.html");
        assert_eq!(ws.nodes[0].file_path.as_deref(), Some("A.md"));
    }

    #[test]
    fn test_load_workspace_missing_is_empty() {
        let md = tempfile::tempdir().unwrap();
        let ws = load_workspace(md.path(), None, "index.html");
        assert!(ws.is_empty());
        assert_eq!(ws.name, DEFAULT_WORKSPACE_NAME);
    }

    #[test]
    fn test_is_link_back() {
        assert!(is_link_back("https://notion.so/x"));
        assert!(is_link_back("https://acme.notion.site/page?x=1"));
        assert!(!is_link_back("https://notnotion.so/x"));
        assert!(!is_link_back("https://example.com/notion.so"));
    }
}
