//! Markdown page resolution.
//!
//! [`ContentResolver`] maps navigation paths and bare identifiers to files
//! under the markdown export root and reads them into [`PageContent`].

use std::fs;
use std::path::{Component, Path, PathBuf};

use regex::Regex;
use serde::Serialize;

use crate::error::ExportError;
use crate::ident::{decode_path, slugify};
use crate::locate;
use crate::metadata::{Icon, normalize_lexically};

/// Title used when a page has no level-1 heading.
pub const UNTITLED: &str = "Untitled";

/// A heading inside a page body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Heading {
    pub level: u8,
    pub text: String,
    /// Unique in-page anchor derived from the heading text.
    pub anchor: String,
}

/// A resolved markdown page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PageContent {
    /// First level-1 heading, or [`UNTITLED`].
    pub title: String,
    /// Raw markdown body.
    pub content: String,
    /// Local image targets in body order, decoded and relative to the
    /// markdown root, duplicates kept.
    pub images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<Icon>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub headings: Vec<Heading>,
}

/// Reads pages from the markdown export.
pub struct ContentResolver {
    root: PathBuf,
    h1_regex: Regex,
    heading_regex: Regex,
    image_regex: Regex,
}

impl ContentResolver {
    /// # Panics
    ///
    /// Panics if the internal regexes fail to compile, which cannot happen
    /// for these constant patterns.
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            h1_regex: Regex::new(r"(?m)^#\s+(.+)$").unwrap(),
            heading_regex: Regex::new(r"^(#{1,6})\s+(.+?)(?:\s+#+)?\s*$").unwrap(),
            image_regex: Regex::new(r"!\[[^\]]*\]\(\s*(?:<([^>]+)>|([^)\s]+))").unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of an existing file below the root.
    ///
    /// `None` when the file is absent or the path tries to leave the root.
    pub fn resolve_path(&self, relative: &str) -> Option<PathBuf> {
        let relative = Path::new(relative.trim_start_matches('/'));
        if !is_safe_relative(relative) {
            tracing::warn!(path = %relative.display(), "Rejected path outside markdown root");
            return None;
        }
        let path = self.root.join(relative);
        path.is_file().then_some(path)
    }

    /// Read a page file, given relative to the root or as an absolute path
    /// below it.
    pub fn read_page(&self, path: &Path) -> Result<PageContent, ExportError> {
        let full = if path.is_absolute() || path.starts_with(&self.root) {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };
        if !normalize_lexically(&full).starts_with(normalize_lexically(&self.root)) {
            tracing::warn!(path = %path.display(), "Rejected page outside markdown root");
            return Err(ExportError::PathViolation(path.to_path_buf()));
        }
        let path = full;
        if !path.is_file() {
            return Err(ExportError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(&path).map_err(|e| ExportError::io(&path, e))?;

        let title = self
            .h1_regex
            .captures(&content)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_owned())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| UNTITLED.to_owned());

        Ok(PageContent {
            title,
            images: self.local_images(&path, &content),
            headings: self.headings(&content),
            icon: None,
            content,
        })
    }

    /// Image targets of a page, rebased from the page's directory onto the
    /// root. Targets that leave the root are dropped.
    fn local_images(&self, page_path: &Path, content: &str) -> Vec<String> {
        let root = normalize_lexically(&self.root);
        let base = page_path.parent().unwrap_or(&self.root);

        self.image_regex
            .captures_iter(content)
            .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
            .map(|m| m.as_str().trim())
            .filter(|target| !is_remote(target))
            .filter_map(|target| {
                let resolved = normalize_lexically(&base.join(decode_path(target)));
                let Ok(relative) = resolved.strip_prefix(&root) else {
                    tracing::debug!(image = target, "Dropping image reference outside markdown root");
                    return None;
                };
                Some(
                    relative
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy())
                        .collect::<Vec<_>>()
                        .join("/"),
                )
            })
            .filter(|relative| !relative.is_empty())
            .collect()
    }

    /// Headings outside fenced code blocks, with unique anchors.
    fn headings(&self, content: &str) -> Vec<Heading> {
        let mut headings = Vec::new();
        let mut used: Vec<String> = Vec::new();
        let mut in_fence = false;

        for line in content.lines() {
            let trimmed = line.trim_start();
            if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
                in_fence = !in_fence;
                continue;
            }
            if in_fence {
                continue;
            }
            let Some(caps) = self.heading_regex.captures(line) else {
                continue;
            };
            let (Some(hashes), Some(text)) = (caps.get(1), caps.get(2)) else {
                continue;
            };

            let text = text.as_str().trim().to_owned();
            let base = match slugify(&text) {
                s if s.is_empty() => "section".to_owned(),
                s => s,
            };
            let mut anchor = base.clone();
            let mut n = 1;
            while used.contains(&anchor) {
                anchor = format!("{base}-{n}");
                n += 1;
            }
            used.push(anchor.clone());

            headings.push(Heading {
                level: u8::try_from(hashes.len()).unwrap_or(6),
                text,
                anchor,
            });
        }
        headings
    }

    /// Find a markdown file by identifier when path lookup fails.
    pub fn find_by_identifier(&self, id: &str) -> Option<PathBuf> {
        locate::find_by_identifier(&self.root, id, |name| name.ends_with(".md"))
    }
}

/// Whether `path` stays below whatever root it is joined to.
pub(crate) fn is_safe_relative(path: &Path) -> bool {
    !path
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)))
}

fn is_remote(target: &str) -> bool {
    let lower = target.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("data:")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn resolver_with(files: &[(&str, &str)]) -> (tempfile::TempDir, ContentResolver) {
        let dir = tempfile::tempdir().unwrap();
        for (rel, content) in files {
            let path = dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        let resolver = ContentResolver::new(dir.path().to_path_buf());
        (dir, resolver)
    }

    #[test]
    fn test_read_page_title_and_body() {
        let (_dir, resolver) = resolver_with(&[("Hello.md", "# Hello\n\nSome **bold** text")]);
        let page = resolver.read_page(Path::new("Hello.md")).unwrap();
        assert_eq!(page.title, "Hello");
        assert_eq!(page.content, "# Hello\n\nSome **bold** text");
    }

    #[test]
    fn test_read_page_title_not_on_first_line() {
        let (_dir, resolver) = resolver_with(&[("P.md", "intro\n## Sub\n# Real Title\n")]);
        let page = resolver.read_page(Path::new("P.md")).unwrap();
        assert_eq!(page.title, "Real Title");
    }

    #[test]
    fn test_read_page_untitled() {
        let (_dir, resolver) = resolver_with(&[("P.md", "no heading\n#hashtag")]);
        let page = resolver.read_page(Path::new("P.md")).unwrap();
        assert_eq!(page.title, UNTITLED);
    }

    #[test]
    fn test_read_page_missing() {
        let (_dir, resolver) = resolver_with(&[]);
        let err = resolver.read_page(Path::new("Nope.md")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_local_images_in_order_with_duplicates() {
        let body = "![a](img/one.png)\n![remote](https://x.io/a.png)\n\
                    ![b](<My Page/two%20words.png>)\n![c](img/one.png \"t\")";
        let (_dir, resolver) = resolver_with(&[("P.md", body)]);
        let page = resolver.read_page(Path::new("P.md")).unwrap();
        assert_eq!(
            page.images,
            vec!["img/one.png", "My Page/two words.png", "img/one.png"]
        );
    }

    #[test]
    fn test_images_rebased_onto_root() {
        let body = "![pic](Child%20Page/pic.png)\n![up](../shared/logo.png)\n![out](../../x.png)";
        let (_dir, resolver) = resolver_with(&[("Home/Child Page.md", body)]);
        let page = resolver.read_page(Path::new("Home/Child Page.md")).unwrap();
        assert_eq!(
            page.images,
            vec!["Home/Child Page/pic.png", "shared/logo.png"]
        );
    }

    #[test]
    fn test_read_page_rejects_escaping_paths() {
        let (dir, resolver) = resolver_with(&[("P.md", "# P")]);
        let err = resolver.read_page(Path::new("../P.md")).unwrap_err();
        assert!(matches!(err, ExportError::PathViolation(_)));

        let outside = dir.path().join("..").join("P.md");
        let err = resolver.read_page(&outside).unwrap_err();
        assert!(matches!(err, ExportError::PathViolation(_)));

        let inside = dir.path().join("P.md");
        assert_eq!(resolver.read_page(&inside).unwrap().title, "P");
    }

    #[test]
    fn test_headings_unique_anchors_skip_fences() {
        let body = "# Intro\n## Setup ##\n```\n# not a heading\n```\n## Setup\n";
        let (_dir, resolver) = resolver_with(&[("P.md", body)]);
        let page = resolver.read_page(Path::new("P.md")).unwrap();

        let summary: Vec<_> = page
            .headings
            .iter()
            .map(|h| (h.level, h.text.as_str(), h.anchor.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (1, "Intro", "intro"),
                (2, "Setup", "setup"),
                (2, "Setup", "setup-1"),
            ]
        );
    }

    #[test]
    fn test_resolve_path() {
        let (_dir, resolver) = resolver_with(&[("Team/Notes.md", "")]);
        assert!(resolver.resolve_path("Team/Notes.md").is_some());
        assert!(resolver.resolve_path("Team/Missing.md").is_none());
        assert!(resolver.resolve_path("../Team/Notes.md").is_none());
    }

    #[test]
    fn test_find_by_identifier_markdown_only() {
        let id = "0123456789abcdef0123456789abcdef";
        let csv_name = format!("A {id}.csv");
        let md_name = format!("Sub/B {id}.md");
        let (_dir, resolver) =
            resolver_with(&[(csv_name.as_str(), ""), (md_name.as_str(), "# B")]);
        let found = resolver.find_by_identifier(id).unwrap();
        assert!(found.ends_with(format!("Sub/B {id}.md")));
    }
}
