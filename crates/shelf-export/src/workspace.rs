//! Workspace facade.
//!
//! [`Workspace`] answers the lookups the serving layer needs: the navigation
//! tree, a page or table by slug or identifier, and image bytes. Nothing is
//! cached here; each call re-reads the export so a replaced export is picked
//! up on the next request.
//!
//! Page and table lookups go through three stages:
//! 1. exact slug match in the tree,
//! 2. identifier-prefix match in the tree,
//! 3. identifier search over file names on disk.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use shelf_config::{Config, Features, TableVariant, WorkspaceConfig};

use crate::content::{ContentResolver, PageContent, is_safe_relative};
use crate::error::ExportError;
use crate::ident::{extract_identifier, identifier_hint};
use crate::metadata::{MetadataReader, ValueColors, normalize_lexically};
use crate::navigation::{NavNode, WorkspaceData, load_workspace};
use crate::table::{TablePair, TableReader, variant_paths};

/// Ancestor entry of a page, root first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    pub id: String,
    pub title: String,
    pub slug: String,
}

impl From<&NavNode> for Breadcrumb {
    fn from(node: &NavNode) -> Self {
        Self {
            id: node.id.clone(),
            title: node.title.clone(),
            slug: node.slug.clone(),
        }
    }
}

/// A page together with its place in the tree.
#[derive(Clone, Debug, Serialize)]
pub struct ResolvedPage {
    /// Matching tree node without its children; `None` when the page was
    /// found only on disk.
    pub node: Option<NavNode>,
    #[serde(flatten)]
    pub content: PageContent,
    pub breadcrumbs: Vec<Breadcrumb>,
}

/// A table pair with display hints.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedTable {
    pub node: Option<NavNode>,
    #[serde(flatten)]
    pub pair: TablePair,
    pub default_variant: TableVariant,
    pub colors: ValueColors,
}

/// Image bytes with their MIME type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageFile {
    pub bytes: Vec<u8>,
    pub mime: String,
}

/// Read-only view over a markdown export and its optional HTML twin.
pub struct Workspace {
    config: WorkspaceConfig,
    features: Features,
    content: ContentResolver,
    tables: TableReader,
    metadata: Option<MetadataReader>,
}

impl Workspace {
    pub fn new(config: WorkspaceConfig, features: Features) -> Self {
        let metadata = config
            .html_root
            .clone()
            .and_then(|html_root| MetadataReader::new(config.markdown_root.clone(), html_root));

        Self {
            content: ContentResolver::new(config.markdown_root.clone()),
            tables: TableReader::new(config.markdown_root.clone()),
            metadata,
            config,
            features,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.workspace_resolved.clone(), config.features)
    }

    pub fn features(&self) -> Features {
        self.features
    }

    pub fn default_table_variant(&self) -> TableVariant {
        self.config.default_table_variant
    }

    pub fn markdown_root(&self) -> &Path {
        &self.config.markdown_root
    }

    pub fn content(&self) -> &ContentResolver {
        &self.content
    }

    pub fn tables(&self) -> &TableReader {
        &self.tables
    }

    /// Metadata reader, present only when the HTML export exists.
    pub fn metadata(&self) -> Option<&MetadataReader> {
        self.metadata.as_ref()
    }

    fn icons_enabled(&self) -> Option<&MetadataReader> {
        self.metadata.as_ref().filter(|_| self.features.icons)
    }

    /// Parse the navigation tree, with icons when enabled.
    pub fn tree(&self) -> WorkspaceData {
        let mut tree = load_workspace(
            &self.config.markdown_root,
            self.metadata.as_ref().map(MetadataReader::html_root),
            &self.config.navigation_file,
        );

        if let Some(metadata) = self.icons_enabled() {
            tree.visit_mut(&mut |node: &mut NavNode| {
                // Same file resolution as `page()`, so both report one icon.
                if let Some(path) = self.page_path(node) {
                    node.icon = metadata.page_icon(&path);
                }
            });
        }
        tree
    }

    /// Look a node up by exact slug, then by identifier prefix.
    pub fn find_node<'t>(tree: &'t WorkspaceData, slug_or_id: &str) -> Option<&'t NavNode> {
        tree.find_by_slug(slug_or_id)
            .or_else(|| tree.find_by_id(&identifier_hint(slug_or_id)))
    }

    /// Markdown file backing `node`, falling back to identifier search.
    pub fn page_path(&self, node: &NavNode) -> Option<PathBuf> {
        if node.is_external || node.is_csv {
            return None;
        }
        let relative = node.file_path.as_deref()?;
        self.content
            .resolve_path(relative)
            .or_else(|| self.content.find_by_identifier(&node.id))
    }

    /// Table file backing `node`, falling back to identifier search.
    pub fn table_path(&self, node: &NavNode) -> Option<PathBuf> {
        if !node.is_csv {
            return None;
        }
        let relative = node.file_path.as_deref()?;
        let (filtered, all) = variant_paths(Path::new(relative));
        let root = &self.config.markdown_root;
        if is_safe_relative(Path::new(relative))
            && (root.join(&filtered).is_file() || root.join(&all).is_file())
        {
            return Some(root.join(relative));
        }
        self.tables.find_by_identifier(&node.id)
    }

    /// Read the page for a slug or identifier.
    pub fn page(&self, slug_or_id: &str) -> Result<ResolvedPage, ExportError> {
        let tree = self.tree();
        let mut node = Self::find_node(&tree, slug_or_id);

        let path = match node {
            Some(found) => self.page_path(found),
            None => {
                tracing::debug!(slug_or_id, "No tree match, searching export by identifier");
                let path = self.content.find_by_identifier(&identifier_hint(slug_or_id));
                node = path
                    .as_deref()
                    .and_then(|p| tree.find_by_id(&extract_identifier(&p.to_string_lossy())));
                path
            }
        }
        .ok_or_else(|| ExportError::NotFound(format!("page {slug_or_id}")))?;

        let mut content = self.content.read_page(&path)?;
        if let Some(metadata) = self.icons_enabled() {
            content.icon = metadata.page_icon(&path);
        }
        if !self.features.image_gallery {
            content.images.clear();
        }
        if !self.features.heading_anchors {
            content.headings.clear();
        }

        let breadcrumbs = match node {
            Some(found) if self.features.breadcrumbs => tree
                .breadcrumbs(&found.id)
                .into_iter()
                .map(Breadcrumb::from)
                .collect(),
            _ => Vec::new(),
        };

        Ok(ResolvedPage {
            node: node.map(without_children),
            content,
            breadcrumbs,
        })
    }

    /// Read the table pair for a slug or identifier.
    pub fn table(&self, slug_or_id: &str) -> Result<ResolvedTable, ExportError> {
        let tree = self.tree();
        let node = Self::find_node(&tree, slug_or_id).filter(|n| n.is_csv);

        let path = match node {
            Some(found) => self.table_path(found),
            None => {
                tracing::debug!(slug_or_id, "No tree match, searching tables by identifier");
                self.tables.find_by_identifier(&identifier_hint(slug_or_id))
            }
        };
        let not_found = || ExportError::NotFound(format!("table {slug_or_id}"));
        let path = path.ok_or_else(not_found)?;
        let pair = self.tables.get_pair(&path).ok_or_else(not_found)?;

        let colors = self
            .icons_enabled()
            .map(|metadata| metadata.table_colors(&path))
            .unwrap_or_default();

        Ok(ResolvedTable {
            node: node.map(without_children),
            pair,
            default_variant: self.config.default_table_variant,
            colors,
        })
    }

    /// Read an image from the markdown export, else the HTML export.
    ///
    /// Paths that resolve outside both roots, lexically or through a
    /// symlink, are rejected with [`ExportError::PathViolation`].
    pub fn image(&self, relative: &str) -> Result<ImageFile, ExportError> {
        let relative = Path::new(relative);
        let roots: Vec<&Path> = std::iter::once(self.config.markdown_root.as_path())
            .chain(self.metadata.as_ref().map(MetadataReader::html_root))
            .collect();

        let contained: Vec<(&Path, PathBuf)> = roots
            .iter()
            .map(|root| (*root, normalize_lexically(&root.join(relative))))
            .filter(|(root, candidate)| candidate.starts_with(normalize_lexically(root)))
            .collect();
        if contained.is_empty() {
            tracing::warn!(path = %relative.display(), "Image path escapes export roots");
            return Err(ExportError::PathViolation(relative.to_path_buf()));
        }

        for (root, candidate) in contained {
            if !candidate.is_file() {
                continue;
            }
            let real = fs::canonicalize(&candidate).map_err(|e| ExportError::io(&candidate, e))?;
            let real_root = fs::canonicalize(root).map_err(|e| ExportError::io(root, e))?;
            if !real.starts_with(&real_root) {
                tracing::warn!(path = %candidate.display(), "Image symlink escapes export root");
                return Err(ExportError::PathViolation(relative.to_path_buf()));
            }

            let bytes = fs::read(&real).map_err(|e| ExportError::io(&real, e))?;
            let mime = mime_guess::from_path(&real)
                .first_or_octet_stream()
                .to_string();
            return Ok(ImageFile { bytes, mime });
        }

        Err(ExportError::NotFound(relative.display().to_string()))
    }
}

fn without_children(node: &NavNode) -> NavNode {
    NavNode {
        children: Vec::new(),
        ..node.clone()
    }
}
