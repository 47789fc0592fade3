#![deny(missing_docs)]
//! # packcheck-core — Foundational Types for Pack Verification
//!
//! This crate is the leaf of the packcheck workspace. It defines the
//! primitives every verification stage shares, so that the stages agree on
//! what a path, a digest, and a result look like.
//!
//! ## Key Design Principles
//!
//! 1. **Pack-relative paths are a newtype.** `RelativePath` is always
//!    forward-slash separated, never absolute, and never escapes the pack
//!    root. Manifest entries, scan results, and reports all use it.
//!
//! 2. **Digests are computed by streaming.** [`sha256_file`] reads bounded
//!    chunks and never assumes a file fits in memory.
//!
//! 3. **Documents are decoded once, into `serde_json::Value`.** YAML and JSON
//!    sources converge on the same value tree so that schema validation and
//!    reference resolution see identical shapes.
//!
//! 4. **One reporting unit.** Every stage produces a [`CheckResult`];
//!    results are aggregated, never merged or reinterpreted.
//!
//! 5. **Configuration and content failures are distinct types.**
//!    [`ConfigurationError`] means the run cannot proceed (exit 2);
//!    content inconsistencies are ordinary failing `CheckResult`s (exit 1).
//!
//! ## Crate Policy
//!
//! - No dependencies on other `packcheck-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod check;
pub mod digest;
pub mod document;
pub mod error;
pub mod layout;
pub mod path;
pub mod temporal;
pub mod walk;

// Re-export primary types for ergonomic imports.
pub use check::{summarize, CheckResult, RunReport, Verdict};
pub use digest::{sha256_bytes, sha256_file, sha256_reader, DigestAlgorithm, HexDigest};
pub use document::{load_document, load_json, load_yaml, yaml_to_json_value, DocumentFormat};
pub use error::{ConfigurationError, PackError, ParseError};
pub use layout::PackLayout;
pub use path::RelativePath;
pub use temporal::Timestamp;
pub use walk::{walk_files, PackFile};
