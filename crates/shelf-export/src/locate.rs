//! Identifier search over an export directory.
//!
//! Exported file names are not guaranteed to match the paths recorded in
//! the navigation markup, but they do embed the page identifier. When a
//! lookup by path fails, callers search the tree by file name: first for the
//! full identifier, then for its short prefix.

use std::fs;
use std::path::{Path, PathBuf};

use crate::ident::{normalize_identifier, short_id};

/// Find the first file under `root` whose name contains `id`.
///
/// Traversal is depth-first in name order; hidden entries are skipped.
/// `accept` filters candidate file names (lowercased). Matching is
/// case-insensitive on the dash-free identifier.
pub(crate) fn find_by_identifier(
    root: &Path,
    id: &str,
    accept: impl Fn(&str) -> bool,
) -> Option<PathBuf> {
    let full = normalize_identifier(id);
    if full.is_empty() {
        return None;
    }
    let short = short_id(&full);

    let found = walk(root, &full, &accept).or_else(|| {
        if short == full {
            None
        } else {
            walk(root, short, &accept)
        }
    });

    match &found {
        Some(path) => tracing::debug!(id, path = %path.display(), "Resolved by identifier search"),
        None => tracing::debug!(id, root = %root.display(), "Identifier search found nothing"),
    }
    found
}

fn walk(dir: &Path, needle: &str, accept: &impl Fn(&str) -> bool) -> Option<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return None;
    };

    let mut entries: Vec<_> = entries
        .filter_map(Result::ok)
        .map(|e| {
            let is_dir = e.file_type().is_ok_and(|t| t.is_dir());
            let name_lower = e.file_name().to_string_lossy().to_lowercase();
            (e, is_dir, name_lower)
        })
        .collect();
    entries.sort_by(|(_, _, a), (_, _, b)| a.cmp(b));

    for (entry, is_dir, name_lower) in entries {
        if name_lower.starts_with('.') {
            continue;
        }
        if is_dir {
            if let Some(found) = walk(&entry.path(), needle, accept) {
                return Some(found);
            }
        } else if accept(&name_lower) && name_lower.contains(needle) {
            return Some(entry.path());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "0123456789abcdef0123456789abcdef";

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    fn any(_: &str) -> bool {
        true
    }

    #[test]
    fn test_full_identifier_preferred_over_short() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a/Other 01234567ffffffffffffffffffffffff.md");
        touch(dir.path(), &format!("b/Page {ID}.md"));

        let found = find_by_identifier(dir.path(), ID, any).unwrap();
        assert!(found.ends_with(format!("b/Page {ID}.md")));
    }

    #[test]
    fn test_short_identifier_fallback() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "Deep/Nested/Page 01234567.md");

        let found = find_by_identifier(dir.path(), ID, any).unwrap();
        assert!(found.ends_with("Deep/Nested/Page 01234567.md"));
    }

    #[test]
    fn test_case_insensitive_and_dashed_query() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &format!("Page {}.md", ID.to_uppercase()));

        let dashed = "01234567-89ab-cdef-0123-456789abcdef";
        assert!(find_by_identifier(dir.path(), dashed, any).is_some());
    }

    #[test]
    fn test_accept_filter_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &format!("Page {ID}.md"));

        assert!(find_by_identifier(dir.path(), ID, |n| n.ends_with(".csv")).is_none());
        assert!(find_by_identifier(dir.path(), "", any).is_none());
        assert!(find_by_identifier(&dir.path().join("missing"), ID, any).is_none());
    }
}
