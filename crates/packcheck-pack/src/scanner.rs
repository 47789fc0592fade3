//! # File Scanner
//!
//! Walks a pack root and fingerprints every regular file: relative path,
//! byte size, and streamed SHA-256. The manifest file itself and anything
//! under an excluded top-level directory are skipped.
//!
//! An unreadable file fails the whole scan. A partial fingerprint of the
//! tree is worse than none, since it would silently report files as
//! missing.

use std::collections::BTreeSet;
use std::path::PathBuf;

use packcheck_core::{sha256_file, walk_files, PackError, PackLayout};

use crate::manifest::FileEntry;

/// Deterministic fingerprinting of a pack tree.
#[derive(Debug, Clone)]
pub struct FileScanner {
    root: PathBuf,
    excluded: BTreeSet<String>,
    manifest_file: String,
}

impl FileScanner {
    /// Scanner for `root` using the layout's exclusions and manifest name.
    pub fn new(root: impl Into<PathBuf>, layout: &PackLayout) -> Self {
        Self {
            root: root.into(),
            excluded: layout.excluded_dirs.clone(),
            manifest_file: layout.manifest_file.clone(),
        }
    }

    /// Fingerprint every file, sorted by path.
    ///
    /// # Errors
    ///
    /// Returns `PackError::Io` naming the first path that could not be
    /// traversed or read.
    pub fn scan(&self) -> Result<Vec<FileEntry>, PackError> {
        let files = walk_files(&self.root, &self.excluded, Some(&self.manifest_file))?;
        let mut entries = Vec::with_capacity(files.len());
        for (i, file) in files.into_iter().enumerate() {
            let (digest, size) = sha256_file(&file.abs).map_err(|source| PackError::Io {
                path: file.abs.clone(),
                source,
            })?;
            entries.push(FileEntry {
                path: file.rel,
                digest,
                size_bytes: Some(size),
            });
            if (i + 1) % 50 == 0 {
                tracing::debug!(hashed = i + 1, "scan progress");
            }
        }
        tracing::info!(
            root = %self.root.display(),
            files = entries.len(),
            "scanned pack tree"
        );
        Ok(entries)
    }
}
