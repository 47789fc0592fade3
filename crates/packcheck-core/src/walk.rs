//! # Pack Traversal
//!
//! Deterministic recursive enumeration of regular files below a root.
//! Every stage that discovers files (fingerprinting, schema discovery,
//! test-vector discovery) uses this walk so that they agree on which files
//! exist and in which order.
//!
//! Symlinks are not followed. Traversal errors are returned, never skipped.

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::PackError;
use crate::path::RelativePath;

/// A regular file found below a walk root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackFile {
    /// Path relative to the walk root.
    pub rel: RelativePath,
    /// Absolute (or root-joined) filesystem path.
    pub abs: PathBuf,
}

/// Enumerate every regular file below `root`, sorted by relative path.
///
/// Entries whose first path segment is in `excluded` are skipped, as is a
/// top-level file named `skip_file` (used for the manifest itself).
///
/// # Errors
///
/// Any directory that cannot be read, or a path that is not valid UTF-8,
/// fails the whole walk.
pub fn walk_files(
    root: &Path,
    excluded: &BTreeSet<String>,
    skip_file: Option<&str>,
) -> Result<Vec<PackFile>, PackError> {
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() != 1
                || !entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| excluded.contains(name))
        });

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| PackError::Io {
            path: e.path().map_or_else(|| root.to_path_buf(), Path::to_path_buf),
            source: io::Error::from(e),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = RelativePath::from_fs(root, entry.path()).ok_or_else(|| PackError::Io {
            path: entry.path().to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidData, "path is not valid UTF-8"),
        })?;
        if entry.depth() == 1 && skip_file.is_some_and(|skip| rel.as_str() == skip) {
            continue;
        }
        files.push(PackFile {
            rel,
            abs: entry.into_path(),
        });
    }
    files.sort_by(|a, b| a.rel.cmp(&b.rel));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn rels(files: &[PackFile]) -> Vec<&str> {
        files.iter().map(|f| f.rel.as_str()).collect()
    }

    #[test]
    fn walk_is_sorted_and_recursive() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b.yaml", "b");
        write(dir.path(), "a/z.yaml", "z");
        write(dir.path(), "a.yaml", "a");
        let files = walk_files(dir.path(), &BTreeSet::new(), None).unwrap();
        assert_eq!(rels(&files), vec!["a.yaml", "a/z.yaml", "b.yaml"]);
    }

    #[test]
    fn walk_skips_excluded_top_level_only() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), ".git/HEAD", "ref");
        write(dir.path(), "docs/.git/keep", "nested");
        write(dir.path(), "keep.yaml", "k");
        let excluded: BTreeSet<String> = [".git".to_string()].into_iter().collect();
        let files = walk_files(dir.path(), &excluded, None).unwrap();
        assert_eq!(rels(&files), vec!["docs/.git/keep", "keep.yaml"]);
    }

    #[test]
    fn walk_skips_root_manifest_but_not_nested_namesake() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "manifest.yaml", "m");
        write(dir.path(), "sub/manifest.yaml", "n");
        let files = walk_files(dir.path(), &BTreeSet::new(), Some("manifest.yaml")).unwrap();
        assert_eq!(rels(&files), vec!["sub/manifest.yaml"]);
    }

    #[test]
    fn walk_missing_root_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = walk_files(&dir.path().join("absent"), &BTreeSet::new(), None);
        assert!(matches!(result, Err(PackError::Io { .. })));
    }
}
