//! Export error types.

use std::path::PathBuf;

/// Errors surfaced by workspace lookups.
///
/// Absent optional data (icons, colors, a missing HTML export) is never an
/// error; it is threaded through `Option` instead.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Page, table, node or file does not exist.
    #[error("Not found: {0}")]
    NotFound(String),
    /// Resolved path escapes every configured export root.
    #[error("Path escapes export roots: {}", .0.display())]
    PathViolation(PathBuf),
    /// Reading an existing file failed.
    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
