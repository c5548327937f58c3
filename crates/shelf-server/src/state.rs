//! Application state.
//!
//! Shared state for all request handlers.

use std::sync::Arc;

use shelf_config::Features;
use shelf_export::Workspace;
use shelf_search::{DocumentSource, SearchIndex};

/// Application state shared across all handlers.
pub(crate) struct AppState {
    /// Export lookups.
    pub(crate) workspace: Arc<Workspace>,
    /// Lazily built index over the same workspace.
    pub(crate) search: Arc<SearchIndex>,
}

impl AppState {
    pub(crate) fn new(workspace: Workspace) -> Self {
        let workspace = Arc::new(workspace);
        let source = Arc::clone(&workspace) as Arc<dyn DocumentSource>;
        Self {
            search: Arc::new(SearchIndex::new(source)),
            workspace,
        }
    }

    pub(crate) fn features(&self) -> Features {
        self.workspace.features()
    }
}
