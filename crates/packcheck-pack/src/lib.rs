#![deny(missing_docs)]
//! # packcheck-pack — Pack Consistency Engine
//!
//! Answers two of the three questions packcheck asks of a document pack:
//!
//! - **Does every file match its recorded fingerprint?**
//!   [`scanner`] hashes the live tree, [`manifest`] models the recorded
//!   one, and [`verify`] diffs them into matched / missing / mismatched /
//!   extra.
//!
//! - **Does every preset resolve to version-matched library documents?**
//!   [`binding`] extracts typed `(kind, id, version)` references from each
//!   preset and searches the kind's library directory for a match.
//!
//! Schema conformance, the third question, lives in `packcheck-schema`.
//!
//! ## Crate Policy
//!
//! - Depends only on `packcheck-core` internally.
//! - Reported lists are sorted before they leave this crate; output never
//!   depends on traversal or completion order.

pub mod binding;
pub mod manifest;
pub mod scanner;
pub mod verify;

pub use binding::{
    Binding, BindingReport, BindingResolver, Preset, PresetOutcome, RefOutcome, RefSlot,
    Reference, ReferenceKind, UnresolvedReason,
};
pub use manifest::{FileEntry, Manifest, PackMetadata, MANIFEST_FORMAT_VERSION};
pub use scanner::FileScanner;
pub use verify::{verify, verify_pack, Mismatch, VerificationOutcome};
