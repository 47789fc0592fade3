#![deny(missing_docs)]
//! # packcheck-cli — Document Pack Checker
//!
//! Provides the `packcheck` command-line interface over the pack, schema,
//! and core crates.
//!
//! ## Subcommands
//!
//! - `packcheck check` (the default): run every stage and print one
//!   aggregated report with an overall verdict.
//! - `packcheck manifest generate`: write `manifest.yaml` from a scan, or
//!   with `--check` report drift without writing.
//! - `packcheck manifest verify`: verify the manifest alone, listing every
//!   offending path in full.
//! - `packcheck render-inputs`: check a render-input payload covers every
//!   placeholder a document schema requires.
//!
//! ## Exit Codes
//!
//! `0` PASS, `1` FAIL (content inconsistency), `2` MISCONFIG (the check
//! could not run: missing manifest, unreadable root, bad arguments).
//!
//! ## Crate Policy
//!
//! - Argument parsing is separate from business logic; handlers delegate to
//!   the domain crates.
//! - Reports go to stdout; logs and errors go to stderr.

pub mod check;
pub mod manifest;
pub mod render_inputs;
pub mod runner;

use std::path::{Path, PathBuf};

use packcheck_core::{ConfigurationError, PackLayout};

/// Resolved global options shared by every subcommand.
#[derive(Debug, Clone)]
pub struct PackContext {
    /// Root of the pack under check.
    pub pack_root: PathBuf,
    /// Naming conventions for the pack.
    pub layout: PackLayout,
    /// Repeat count of `-v`.
    pub verbose: u8,
}

impl PackContext {
    /// Build a context, loading the layout from `config` if given.
    pub fn new(
        pack_root: PathBuf,
        config: Option<&Path>,
        verbose: u8,
    ) -> Result<Self, ConfigurationError> {
        let layout = PackLayout::resolve(config)?;
        Ok(Self {
            pack_root,
            layout,
            verbose,
        })
    }
}

/// Resolve a path that may be relative to the pack root.
///
/// Absolute paths are returned as-is. A relative path is taken relative to
/// the pack root if it exists there, otherwise relative to the current
/// directory.
pub fn resolve_path(path: &Path, pack_root: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    let pack_relative = pack_root.join(path);
    if pack_relative.exists() {
        pack_relative
    } else {
        path.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_path_prefers_pack_relative() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("data.json"), "{}").unwrap();
        assert_eq!(
            resolve_path(Path::new("data.json"), dir.path()),
            dir.path().join("data.json")
        );
        assert_eq!(
            resolve_path(Path::new("absent.json"), dir.path()),
            PathBuf::from("absent.json")
        );
        let abs = dir.path().join("x");
        assert_eq!(resolve_path(&abs, Path::new("/elsewhere")), abs);
    }

    #[test]
    fn context_rejects_unreadable_config() {
        let dir = tempfile::tempdir().unwrap();
        let err = PackContext::new(
            dir.path().to_path_buf(),
            Some(&dir.path().join("missing.yaml")),
            0,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::ConfigFile { .. }));
    }
}
