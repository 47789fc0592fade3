#![deny(missing_docs)]
//! # packcheck-schema — Schema Loading & Conformance
//!
//! The schema half of a pack check:
//!
//! - [`store`] discovers every `*.schema.json` in the pack and parses it,
//!   collecting every failure instead of stopping at the first.
//! - [`validate`] compiles schemas with the `jsonschema` crate, resolving
//!   cross-schema `$ref`s locally, and validates report test vectors.
//! - [`coverage`] checks that a render-input payload supplies every
//!   dotted-path placeholder a document schema requires.
//!
//! ## Crate Policy
//!
//! - Depends only on `packcheck-core` internally.
//! - No network access: `$ref` URIs resolve only against loaded schemas.

pub mod coverage;
pub mod store;
pub mod validate;

pub use coverage::{coverage, required_paths, CoverageReport, DottedPath};
pub use store::{SchemaLoadFailure, SchemaStore};
pub use validate::{
    probe, validate_report_vectors, SchemaEngine, SchemaValidationError, ValidationViolations,
    Violation,
};
