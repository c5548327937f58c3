//! Export parsing and content resolution for shelf.
//!
//! Reads a static workspace export (a markdown/CSV tree plus an optional
//! HTML tree of the same workspace) and answers the lookups a browsing UI
//! needs:
//! - [`navigation`]: page hierarchy rebuilt from the navigation markup
//! - [`content`]: markdown pages by path or identifier
//! - [`table`]: CSV tables and their filtered/complete pairs
//! - [`metadata`]: icons and value colors from the HTML export
//! - [`Workspace`]: the facade tying these together
//!
//! # Quick Start
//!
//! ```no_run
//! use std::path::PathBuf;
//! use shelf_config::{Features, TableVariant, WorkspaceConfig};
//! use shelf_export::Workspace;
//!
//! let config = WorkspaceConfig {
//!     markdown_root: PathBuf::from("export/markdown"),
//!     html_root: Some(PathBuf::from("export/html")),
//!     navigation_file: "index.html".to_owned(),
//!     default_table_variant: TableVariant::All,
//! };
//! let workspace = Workspace::new(config, Features::default());
//!
//! let tree = workspace.tree();
//! if let Some(first) = tree.nodes.first() {
//!     let page = workspace.page(&first.slug);
//! }
//! ```

pub mod content;
mod error;
pub mod ident;
mod locate;
pub mod markup;
pub mod metadata;
pub mod navigation;
pub mod table;
mod workspace;

pub use content::{ContentResolver, Heading, PageContent};
pub use error::ExportError;
pub use metadata::{ColorName, Icon, MetadataReader, ValueColors};
pub use navigation::{NavNode, WorkspaceData};
pub use table::{TableData, TablePair, TableReader};
pub use workspace::{Breadcrumb, ImageFile, ResolvedPage, ResolvedTable, Workspace};
