//! Full-text search over a shelf workspace.
//!
//! Documents are pulled from a [`DocumentSource`] (normally a
//! [`shelf_export::Workspace`]) and indexed with tantivy in memory. Queries
//! match titles and content with prefix and typo tolerance; title matches
//! rank higher.
//!
//! ```no_run
//! use std::sync::Arc;
//! use shelf_search::{SearchDocument, DocumentKind, SearchIndex};
//!
//! let docs = vec![SearchDocument {
//!     id: "a1".to_owned(),
//!     title: "Roadmap".to_owned(),
//!     slug: "roadmap-a1".to_owned(),
//!     content: "Plans for next quarter".to_owned(),
//!     kind: DocumentKind::Page,
//! }];
//! let index = SearchIndex::new(Arc::new(docs));
//! let hits = index.search("roadmap", 10).unwrap();
//! ```

mod document;
mod error;
mod excerpt;
mod index;

pub use document::{DocumentKind, DocumentSource, SearchDocument, plain_text, table_text};
pub use error::SearchError;
pub use excerpt::{EXCERPT_LEFT_BIAS, EXCERPT_WIDTH, excerpt};
pub use index::{SearchHit, SearchIndex, Snapshot};
