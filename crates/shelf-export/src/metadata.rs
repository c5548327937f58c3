//! Page metadata from the HTML export.
//!
//! The markdown export carries no icons or select-option colors; the HTML
//! export of the same workspace does. [`MetadataReader`] maps content files
//! to their HTML counterparts and extracts:
//!
//! - the page icon, an emoji or an image reference ([`Icon`]),
//! - value colors of select and multi-select cells ([`ColorName`]).
//!
//! The reader only exists when an HTML root is configured and present on
//! disk. Without it, icons and colors are silently unavailable.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;

use crate::ident::decode_path;
use crate::markup::{Token, element_text, tokenize};

/// Class prefix the exporter puts on colored select values.
const COLOR_CLASS_PREFIX: &str = "select-value-color-";

/// Class of the container holding a page's own icon.
const HEADER_ICON_CLASS: &str = "page-header-icon";

/// Page icon, decided once at extraction time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Icon {
    /// Emoji text shown as-is.
    Emoji(String),
    /// Image path relative to the HTML export root, or an absolute URL.
    Image(String),
}

/// Closed set of value colors used by the exporter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorName {
    #[default]
    Default,
    Gray,
    Brown,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
    Pink,
    Red,
}

impl ColorName {
    /// Parse a color name. Unknown names map to [`ColorName::Default`].
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "gray" | "grey" => Self::Gray,
            "brown" => Self::Brown,
            "orange" => Self::Orange,
            "yellow" => Self::Yellow,
            "green" => Self::Green,
            "blue" => Self::Blue,
            "purple" => Self::Purple,
            "pink" => Self::Pink,
            "red" => Self::Red,
            _ => Self::Default,
        }
    }
}

/// Value to color mapping for one table.
pub type ValueColors = BTreeMap<String, ColorName>;

/// Reads icon and color annotations from the HTML export.
#[derive(Clone, Debug)]
pub struct MetadataReader {
    markdown_root: PathBuf,
    html_root: PathBuf,
}

impl MetadataReader {
    /// Create a reader, or `None` when `html_root` is not a directory.
    pub fn new(markdown_root: PathBuf, html_root: PathBuf) -> Option<Self> {
        if html_root.is_dir() {
            Some(Self {
                markdown_root,
                html_root,
            })
        } else {
            tracing::debug!(html_root = %html_root.display(), "HTML export absent, metadata disabled");
            None
        }
    }

    pub fn html_root(&self) -> &Path {
        &self.html_root
    }

    /// Relative form of `path` with respect to the markdown root.
    fn relative<'p>(&self, path: &'p Path) -> &'p Path {
        path.strip_prefix(&self.markdown_root).unwrap_or(path)
    }

    /// HTML counterpart of a content file: same relative path, `.html`
    /// extension, under the HTML root.
    pub fn find_metadata_file(&self, content_path: &Path) -> Option<PathBuf> {
        let candidate = self
            .html_root
            .join(self.relative(content_path))
            .with_extension("html");
        candidate.is_file().then_some(candidate)
    }

    /// HTML counterpart of a table file.
    ///
    /// Tries `<dir>/<stem>.html`, then `<dir>/<stem>/<stem>.html`, with the
    /// complete-variant suffix stripped from the stem.
    pub fn find_metadata_file_for_table(&self, table_path: &Path) -> Option<PathBuf> {
        let relative = self.relative(table_path);
        let stem = relative.file_stem()?.to_string_lossy();
        let stem = stem.strip_suffix(crate::table::ALL_SUFFIX).unwrap_or(&stem);
        let dir = self
            .html_root
            .join(relative.parent().unwrap_or_else(|| Path::new("")));
        let file_name = format!("{stem}.html");

        [dir.join(&file_name), dir.join(stem).join(&file_name)]
            .into_iter()
            .find(|candidate| candidate.is_file())
    }

    /// Icon declared in an HTML page's header.
    ///
    /// Only the header icon container counts; icons elsewhere belong to
    /// linked pages. Inside it, an emoji marker wins over an image. Image
    /// sources are returned as written in the page.
    pub fn extract_icon(&self, html_path: &Path) -> Option<Icon> {
        let tokens = read_tokens(html_path)?;

        let start = tokens.iter().position(|token| {
            matches!(token, Token::Start(tag) if tag.has_class(HEADER_ICON_CLASS))
        })?;
        let (_, end) = element_text(&tokens, start);
        let header = &tokens[start + 1..end.min(tokens.len())];

        let emoji = header.iter().enumerate().find_map(|(idx, token)| match token {
            Token::Start(tag) if tag.name != "img" && tag.has_class("icon") => {
                let (text, _) = element_text(header, idx);
                (!text.is_empty()).then_some(text)
            }
            _ => None,
        });
        if let Some(emoji) = emoji {
            return Some(Icon::Emoji(emoji));
        }

        header.iter().find_map(|token| match token {
            Token::Start(tag) if tag.name == "img" => tag
                .attr("src")
                .filter(|src| !src.is_empty())
                .map(|src| Icon::Image(src.to_owned())),
            _ => None,
        })
    }

    /// Icon for a content file, with image paths made relative to the HTML
    /// root.
    pub fn page_icon(&self, content_path: &Path) -> Option<Icon> {
        let html_path = self.find_metadata_file(content_path)?;
        match self.extract_icon(&html_path)? {
            Icon::Image(src) => self.rebase_image(&html_path, &src).map(Icon::Image),
            emoji @ Icon::Emoji(_) => Some(emoji),
        }
    }

    /// Resolve an image source found in `html_path` against the HTML root.
    fn rebase_image(&self, html_path: &Path, src: &str) -> Option<String> {
        if src.starts_with("http://") || src.starts_with("https://") || src.starts_with("data:") {
            return Some(src.to_owned());
        }
        let base = html_path.parent().unwrap_or(&self.html_root);
        let resolved = normalize_lexically(&base.join(decode_path(src)));
        let relative = resolved.strip_prefix(&self.html_root).ok()?;
        Some(
            relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/"),
        )
    }

    /// Colors of every styled value in an HTML table page.
    ///
    /// A value that appears with several colors keeps the last one.
    pub fn extract_value_colors(&self, html_path: &Path) -> ValueColors {
        let Some(tokens) = read_tokens(html_path) else {
            return ValueColors::new();
        };

        let mut colors = ValueColors::new();
        for (idx, token) in tokens.iter().enumerate() {
            let Token::Start(tag) = token else {
                continue;
            };
            let Some(color) = tag.attr("class").and_then(|classes| {
                classes
                    .split_whitespace()
                    .find_map(|c| c.strip_prefix(COLOR_CLASS_PREFIX))
            }) else {
                continue;
            };
            let (value, _) = element_text(&tokens, idx);
            if !value.is_empty() {
                colors.insert(value, ColorName::parse(color));
            }
        }
        colors
    }

    /// Colors for a table file, empty when no HTML counterpart exists.
    pub fn table_colors(&self, table_path: &Path) -> ValueColors {
        self.find_metadata_file_for_table(table_path)
            .map(|html| self.extract_value_colors(&html))
            .unwrap_or_default()
    }
}

fn read_tokens(path: &Path) -> Option<Vec<Token>> {
    match fs::read_to_string(path) {
        Ok(markup) => Some(tokenize(&markup)),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Metadata file unreadable");
            None
        }
    }
}

/// Resolve `.` and `..` components without touching the filesystem.
pub(crate) fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    struct Fixture {
        _md: TempDir,
        _html: TempDir,
        reader: MetadataReader,
    }

    impl Fixture {
        fn new() -> Self {
            let md = tempfile::tempdir().unwrap();
            let html = tempfile::tempdir().unwrap();
            let reader =
                MetadataReader::new(md.path().to_path_buf(), html.path().to_path_buf()).unwrap();
            Self {
                _md: md,
                _html: html,
                reader,
            }
        }

        fn write_html(&self, rel: &str, content: &str) -> PathBuf {
            let path = self.reader.html_root.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, content).unwrap();
            path
        }

        fn md_path(&self, rel: &str) -> PathBuf {
            self.reader.markdown_root.join(rel)
        }
    }

    #[test]
    fn test_reader_absent_without_html_root() {
        let md = tempfile::tempdir().unwrap();
        let missing = md.path().join("nope");
        assert!(MetadataReader::new(md.path().to_path_buf(), missing).is_none());
    }

    #[test]
    fn test_find_metadata_file_swaps_root_and_extension() {
        let fx = Fixture::new();
        let expected = fx.write_html("Team/Notes.html", "<p></p>");

        assert_eq!(
            fx.reader.find_metadata_file(&fx.md_path("Team/Notes.md")),
            Some(expected.clone())
        );
        assert_eq!(
            fx.reader.find_metadata_file(Path::new("Team/Notes.md")),
            Some(expected)
        );
        assert_eq!(fx.reader.find_metadata_file(Path::new("Other.md")), None);
    }

    #[test]
    fn test_extract_icon_emoji_wins() {
        let fx = Fixture::new();
        let path = fx.write_html(
            "Page.html",
            r#"<img class="icon" src="a.png"><div class="page-header-icon"><span class="icon">🚀</span></div>"#,
        );
        assert_eq!(
            fx.reader.extract_icon(&path),
            Some(Icon::Emoji("🚀".to_owned()))
        );
    }

    #[test]
    fn test_extract_icon_image() {
        let fx = Fixture::new();
        let path = fx.write_html(
            "Page.html",
            r#"<div class="page-header-icon page-header-icon-with-cover"><img class="icon" src="Page/icon.png"></div>"#,
        );
        assert_eq!(
            fx.reader.extract_icon(&path),
            Some(Icon::Image("Page/icon.png".to_owned()))
        );
    }

    #[test]
    fn test_extract_icon_ignores_linked_page_icons() {
        let fx = Fixture::new();
        let path = fx.write_html(
            "Home.html",
            r#"<header><h1 class="page-title">Home</h1></header>
               <figure class="link-to-page"><a href="Home/Child.html"><span class="icon">📄</span>Child</a></figure>
               <figure class="link-to-page"><a href="Home/Other.html"><img class="icon" src="Home/o.png">Other</a></figure>"#,
        );
        assert_eq!(fx.reader.extract_icon(&path), None);
    }

    #[test]
    fn test_extract_icon_none() {
        let fx = Fixture::new();
        let path = fx.write_html("Page.html", "<h1>No icon</h1>");
        assert_eq!(fx.reader.extract_icon(&path), None);
        assert_eq!(fx.reader.extract_icon(&fx.md_path("missing.html")), None);
    }

    #[test]
    fn test_page_icon_rebases_image() {
        let fx = Fixture::new();
        fx.write_html(
            "Team/Notes.html",
            r#"<div class="page-header-icon"><img class="icon" src="../assets/My%20Icon.png"></div>"#,
        );
        assert_eq!(
            fx.reader.page_icon(Path::new("Team/Notes.md")),
            Some(Icon::Image("assets/My Icon.png".to_owned()))
        );
    }

    #[test]
    fn test_extract_value_colors_last_wins() {
        let fx = Fixture::new();
        let path = fx.write_html(
            "Tasks.html",
            r#"<table>
                <td><span class="selected-value select-value-color-green">Done</span></td>
                <td><span class="selected-value select-value-color-red">Blocked</span></td>
                <td><span class="selected-value select-value-color-teal">Odd</span></td>
                <td><span class="selected-value select-value-color-blue">Done</span></td>
            </table>"#,
        );

        let colors = fx.reader.extract_value_colors(&path);
        assert_eq!(colors.len(), 3);
        assert_eq!(colors["Done"], ColorName::Blue);
        assert_eq!(colors["Blocked"], ColorName::Red);
        assert_eq!(colors["Odd"], ColorName::Default);
    }

    #[test]
    fn test_find_metadata_file_for_table_direct() {
        let fx = Fixture::new();
        let expected = fx.write_html("Projects/Tasks.html", "");
        assert_eq!(
            fx.reader
                .find_metadata_file_for_table(&fx.md_path("Projects/Tasks_all.csv")),
            Some(expected)
        );
    }

    #[test]
    fn test_find_metadata_file_for_table_subfolder() {
        let fx = Fixture::new();
        let expected = fx.write_html("Projects/Tasks/Tasks.html", "");
        assert_eq!(
            fx.reader
                .find_metadata_file_for_table(Path::new("Projects/Tasks.csv")),
            Some(expected)
        );
    }

    #[test]
    fn test_color_name_parse() {
        assert_eq!(ColorName::parse("Purple"), ColorName::Purple);
        assert_eq!(ColorName::parse("grey"), ColorName::Gray);
        assert_eq!(ColorName::parse(""), ColorName::Default);
    }

    #[test]
    fn test_normalize_lexically() {
        assert_eq!(
            normalize_lexically(Path::new("/a/b/../c/./d")),
            PathBuf::from("/a/c/d")
        );
    }

    #[test]
    fn test_icon_serializes_tagged() {
        let json = serde_json::to_string(&Icon::Emoji("📄".to_owned())).unwrap();
        assert_eq!(json, r#"{"type":"emoji","value":"📄"}"#);
    }
}
