//! Tabular export reader.
//!
//! Database views are exported as CSV, often twice: `Tasks.csv` holds the
//! rows visible in the saved view and `Tasks_all.csv` every row. A
//! [`TablePair`] bundles both variants. When only one file exists both sides
//! of the pair share the same parsed data.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::locate;

/// Suffix marking the complete variant of a table.
pub const ALL_SUFFIX: &str = "_all";

/// Parsed table: headers in source order and one map per row.
///
/// Cells missing from short rows are absent from the row map.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TableData {
    pub headers: Vec<String>,
    pub rows: Vec<BTreeMap<String, String>>,
}

/// Filtered and complete variants of one logical table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TablePair {
    pub filtered: Arc<TableData>,
    pub all: Arc<TableData>,
}

impl TablePair {
    /// Whether both variants are the same parsed data.
    pub fn is_single(&self) -> bool {
        Arc::ptr_eq(&self.filtered, &self.all)
    }
}

/// Reads CSV tables below the markdown export root.
#[derive(Clone, Debug)]
pub struct TableReader {
    root: PathBuf,
}

impl TableReader {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Parse a CSV file, or `None` when it does not exist.
    ///
    /// Malformed rows are logged and skipped; everything that parses is kept.
    pub fn read_table(&self, path: &Path) -> Option<TableData> {
        let path = self.root.join(path);
        if !path.is_file() {
            return None;
        }

        let mut reader = match csv::ReaderBuilder::new().flexible(true).from_path(&path) {
            Ok(reader) => reader,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to open table");
                return None;
            }
        };

        let headers: Vec<String> = match reader.headers() {
            Ok(headers) => headers
                .iter()
                .enumerate()
                .map(|(idx, h)| {
                    let h = if idx == 0 { h.trim_start_matches('\u{feff}') } else { h };
                    h.to_owned()
                })
                .collect(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Unreadable table header");
                return Some(TableData::default());
            }
        };

        let mut rows = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            match result {
                Ok(record) => rows.push(
                    headers
                        .iter()
                        .zip(record.iter())
                        .map(|(h, v)| (h.clone(), v.to_owned()))
                        .collect(),
                ),
                Err(e) => {
                    tracing::warn!(path = %path.display(), row = idx + 1, error = %e, "Skipping malformed row");
                }
            }
        }

        Some(TableData { headers, rows })
    }

    /// Read both variants of the table at `path`.
    ///
    /// `None` only when neither variant exists.
    pub fn get_pair(&self, path: &Path) -> Option<TablePair> {
        let (filtered_path, all_path) = variant_paths(path);
        let filtered = self.read_table(&filtered_path).map(Arc::new);
        let all = self.read_table(&all_path).map(Arc::new);

        match (filtered, all) {
            (Some(filtered), Some(all)) => Some(TablePair { filtered, all }),
            (Some(only), None) | (None, Some(only)) => Some(TablePair {
                filtered: Arc::clone(&only),
                all: only,
            }),
            (None, None) => None,
        }
    }

    /// Find a primary table file (never a `_all` variant) by identifier.
    pub fn find_by_identifier(&self, id: &str) -> Option<PathBuf> {
        let all_tail = format!("{ALL_SUFFIX}.csv");
        locate::find_by_identifier(&self.root, id, |name| {
            name.ends_with(".csv") && !name.ends_with(&all_tail)
        })
    }
}

/// Paths of the filtered and complete variants of a table file.
pub fn variant_paths(path: &Path) -> (PathBuf, PathBuf) {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let base = stem.strip_suffix(ALL_SUFFIX).unwrap_or(&stem);
    (
        path.with_file_name(format!("{base}{ext}")),
        path.with_file_name(format!("{base}{ALL_SUFFIX}{ext}")),
    )
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;

    use super::*;

    fn row(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_read_table_headers_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("Tasks.csv"),
            "\u{feff}Name,Status,Tags\nWrite docs,Done,\"a, b\"\nShip,In progress\n",
        )
        .unwrap();

        let reader = TableReader::new(dir.path().to_path_buf());
        let table = reader.read_table(Path::new("Tasks.csv")).unwrap();

        assert_eq!(table.headers, vec!["Name", "Status", "Tags"]);
        assert_eq!(
            table.rows,
            vec![
                row(&[("Name", "Write docs"), ("Status", "Done"), ("Tags", "a, b")]),
                row(&[("Name", "Ship"), ("Status", "In progress")]),
            ]
        );
    }

    #[test]
    fn test_read_table_missing() {
        let dir = tempfile::tempdir().unwrap();
        let reader = TableReader::new(dir.path().to_path_buf());
        assert_eq!(reader.read_table(Path::new("Nope.csv")), None);
    }

    #[test]
    fn test_read_table_skips_invalid_utf8_row() {
        let dir = tempfile::tempdir().unwrap();
        let mut bytes = b"Name\nok\n".to_vec();
        bytes.extend_from_slice(b"\xff\xfe\nlast\n");
        fs::write(dir.path().join("T.csv"), bytes).unwrap();

        let reader = TableReader::new(dir.path().to_path_buf());
        let table = reader.read_table(Path::new("T.csv")).unwrap();
        assert_eq!(table.rows, vec![row(&[("Name", "ok")]), row(&[("Name", "last")])]);
    }

    #[test]
    fn test_variant_paths() {
        let (filtered, all) = variant_paths(Path::new("db/Tasks.csv"));
        assert_eq!(filtered, PathBuf::from("db/Tasks.csv"));
        assert_eq!(all, PathBuf::from("db/Tasks_all.csv"));

        let (filtered, all) = variant_paths(Path::new("db/Tasks_all.csv"));
        assert_eq!(filtered, PathBuf::from("db/Tasks.csv"));
        assert_eq!(all, PathBuf::from("db/Tasks_all.csv"));
    }

    #[test]
    fn test_get_pair_both_variants() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Tasks.csv"), "Name\nA\n").unwrap();
        fs::write(dir.path().join("Tasks_all.csv"), "Name\nA\nB\n").unwrap();

        let reader = TableReader::new(dir.path().to_path_buf());
        let pair = reader.get_pair(Path::new("Tasks_all.csv")).unwrap();
        assert!(!pair.is_single());
        assert_eq!(pair.filtered.rows.len(), 1);
        assert_eq!(pair.all.rows.len(), 2);
    }

    #[test]
    fn test_get_pair_single_file_shared() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Tasks.csv"), "Name,Owner\nA,Kim\n").unwrap();

        let reader = TableReader::new(dir.path().to_path_buf());
        let pair = reader.get_pair(Path::new("Tasks.csv")).unwrap();
        assert!(pair.is_single());
        assert_eq!(pair.filtered, pair.all);

        let direct = reader.read_table(Path::new("Tasks.csv")).unwrap();
        assert_eq!(*pair.all, direct);
    }

    #[test]
    fn test_get_pair_only_all_variant() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Tasks_all.csv"), "Name\nA\n").unwrap();

        let reader = TableReader::new(dir.path().to_path_buf());
        let pair = reader.get_pair(Path::new("Tasks.csv")).unwrap();
        assert!(pair.is_single());
        assert!(reader.get_pair(Path::new("Other.csv")).is_none());
    }

    #[test]
    fn test_find_by_identifier_excludes_all_variant() {
        let dir = tempfile::tempdir().unwrap();
        let id = "0123456789abcdef0123456789abcdef";
        fs::write(dir.path().join(format!("A {id}_all.csv")), "x\n").unwrap();
        fs::write(dir.path().join(format!("B {id}.csv")), "x\n").unwrap();
        fs::write(dir.path().join(format!("C {id}.md")), "").unwrap();

        let reader = TableReader::new(dir.path().to_path_buf());
        let found = reader.find_by_identifier(id).unwrap();
        assert_eq!(found, dir.path().join(format!("B {id}.csv")));
    }
}
