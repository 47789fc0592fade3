//! # Manifest Verification
//!
//! Diffs a loaded [`Manifest`] against a live scan and classifies every
//! path:
//!
//! - **matched**: recorded and live, digest (and size, if recorded) equal.
//! - **missing**: recorded, absent from the live tree.
//! - **mismatched**: recorded and live, digest or recorded size differs.
//! - **extra**: live, not recorded.
//!
//! `matched`, `missing`, and `mismatched` partition the manifest's path set
//! exactly; `extra` is the live set minus the manifest set. The outcome is
//! PASS iff `missing`, `mismatched`, and `extra` are all empty.
//!
//! A missing or unparsable manifest is a configuration error, never an
//! inconsistent-tree outcome.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

use serde::Serialize;

use packcheck_core::{
    summarize, CheckResult, ConfigurationError, HexDigest, PackError, PackLayout, RelativePath,
};

use crate::manifest::{FileEntry, Manifest};
use crate::scanner::FileScanner;

/// Stage name reported by the runner.
pub const CHECK_NAME: &str = "manifest.verify";

const MISSING_LIMIT: usize = 10;
const MISMATCH_LIMIT: usize = 5;
const EXTRA_LIMIT: usize = 10;

/// A recorded file whose live content differs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    /// Pack-relative path.
    pub path: RelativePath,
    /// Digest recorded in the manifest.
    pub expected_digest: HexDigest,
    /// Digest of the live file.
    pub actual_digest: HexDigest,
    /// Size recorded in the manifest, if any.
    pub expected_size: Option<u64>,
    /// Live size; set whenever the manifest records a size.
    pub actual_size: Option<u64>,
}

impl Mismatch {
    /// Whether the digests differ.
    pub fn digest_differs(&self) -> bool {
        !self.expected_digest.matches(&self.actual_digest)
    }

    /// Whether a recorded size differs from the live size.
    pub fn size_differs(&self) -> bool {
        matches!((self.expected_size, self.actual_size), (Some(e), Some(a)) if e != a)
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let (true, Some(e), Some(a)) = (self.size_differs(), self.expected_size, self.actual_size) {
            parts.push(format!("bytes expected {e}, got {a}"));
        }
        if self.digest_differs() {
            parts.push(format!(
                "sha256 expected {}, got {}",
                self.expected_digest, self.actual_digest
            ));
        }
        write!(f, "{}: {}", self.path, parts.join(", "))
    }
}

/// Classification of every manifest and live path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerificationOutcome {
    /// Recorded paths whose content matches.
    pub matched: BTreeSet<RelativePath>,
    /// Recorded paths absent from the live tree, sorted.
    pub missing: Vec<RelativePath>,
    /// Recorded paths whose content differs, sorted by path.
    pub mismatched: Vec<Mismatch>,
    /// Live paths not recorded, sorted.
    pub extra: Vec<RelativePath>,
}

impl VerificationOutcome {
    /// PASS iff nothing is missing, mismatched, or extra.
    pub fn is_pass(&self) -> bool {
        self.missing.is_empty() && self.mismatched.is_empty() && self.extra.is_empty()
    }

    /// Number of recorded files that were present and compared.
    pub fn checked(&self) -> usize {
        self.matched.len() + self.mismatched.len()
    }

    /// Summarize as the `manifest.verify` stage result, with bounded detail.
    pub fn to_check_result(&self) -> CheckResult {
        if self.is_pass() {
            return CheckResult::pass(CHECK_NAME, format!("Verified {} files", self.checked()));
        }
        let mut parts = Vec::new();
        if !self.missing.is_empty() {
            parts.push(summarize("Missing files", &self.missing, MISSING_LIMIT, ", "));
        }
        if !self.mismatched.is_empty() {
            parts.push(summarize("Mismatches", &self.mismatched, MISMATCH_LIMIT, "; "));
        }
        if !self.extra.is_empty() {
            parts.push(summarize("Extra files", &self.extra, EXTRA_LIMIT, ", "));
        }
        CheckResult::fail(CHECK_NAME, parts.join(" | "))
    }
}

/// Compare a manifest against a live scan.
pub fn verify(manifest: &Manifest, live: &[FileEntry]) -> VerificationOutcome {
    let live_by_path: BTreeMap<&RelativePath, &FileEntry> =
        live.iter().map(|e| (&e.path, e)).collect();
    let recorded: BTreeSet<&RelativePath> = manifest.files.iter().map(|e| &e.path).collect();

    let mut outcome = VerificationOutcome::default();
    for expected in &manifest.files {
        let Some(actual) = live_by_path.get(&expected.path) else {
            outcome.missing.push(expected.path.clone());
            continue;
        };
        let mismatch = Mismatch {
            path: expected.path.clone(),
            expected_digest: expected.digest.clone(),
            actual_digest: actual.digest.clone(),
            expected_size: expected.size_bytes,
            actual_size: expected.size_bytes.and(actual.size_bytes),
        };
        if mismatch.digest_differs() || mismatch.size_differs() {
            outcome.mismatched.push(mismatch);
        } else {
            outcome.matched.insert(expected.path.clone());
        }
    }
    outcome.extra = live
        .iter()
        .filter(|e| !recorded.contains(&e.path))
        .map(|e| e.path.clone())
        .collect();

    outcome.missing.sort();
    outcome.mismatched.sort_by(|a, b| a.path.cmp(&b.path));
    outcome.extra.sort();
    outcome.extra.dedup();

    tracing::info!(
        matched = outcome.matched.len(),
        missing = outcome.missing.len(),
        mismatched = outcome.mismatched.len(),
        extra = outcome.extra.len(),
        "manifest verification complete"
    );
    outcome
}

/// Load the pack's manifest, scan the tree, and verify.
///
/// # Errors
///
/// `PackError::Configuration` if the root or manifest is absent or the
/// manifest is invalid; `PackError::Io` if the scan cannot read a file.
pub fn verify_pack(root: &Path, layout: &PackLayout) -> Result<VerificationOutcome, PackError> {
    if !root.is_dir() {
        return Err(ConfigurationError::PackRootMissing(root.to_path_buf()).into());
    }
    let manifest = Manifest::load(&root.join(&layout.manifest_file))?;
    let live = FileScanner::new(root, layout).scan()?;
    Ok(verify(&manifest, &live))
}
