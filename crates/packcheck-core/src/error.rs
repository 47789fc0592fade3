//! # Error Types — Structured Error Hierarchy
//!
//! Defines the error taxonomy shared across packcheck. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - [`ConfigurationError`]: the run cannot proceed at all (missing pack
//!   root, missing or invalid manifest, unusable validation engine).
//!   Always maps to the MISCONFIG exit code.
//! - [`ParseError`]: one document could not be decoded or has a field of
//!   the wrong type. Collected per document; never aborts sibling work.
//! - Content inconsistencies (missing/mismatched/extra files, schema
//!   violations, unresolved references) are not errors. They are failing
//!   `CheckResult`s.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for packcheck library operations.
#[derive(Error, Debug)]
pub enum PackError {
    /// The run cannot proceed.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// A document could not be decoded.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// A filesystem operation failed.
    #[error("io error at {}: {source}", .path.display())]
    Io {
        /// The path being read when the error occurred.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// A setup failure that prevents verification from running.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    /// The pack root does not exist or is not a directory.
    #[error("pack root not found: {}", .0.display())]
    PackRootMissing(PathBuf),

    /// The manifest file is absent from the pack root.
    #[error("{} not found at pack root", .0.display())]
    ManifestMissing(PathBuf),

    /// The manifest exists but could not be parsed or violates its invariants.
    #[error("invalid manifest {}: {reason}", .path.display())]
    ManifestInvalid {
        /// Path to the manifest file.
        path: PathBuf,
        /// What is wrong with it.
        reason: String,
    },

    /// The JSON-Schema engine could not compile or run a trivial schema.
    #[error("schema validation capability unavailable: {0}")]
    ValidationCapabilityUnavailable(String),

    /// A layout configuration file could not be read or parsed.
    #[error("config file {}: {reason}", .path.display())]
    ConfigFile {
        /// Path to the configuration file.
        path: PathBuf,
        /// Why it could not be used.
        reason: String,
    },
}

/// A per-document decoding failure.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The document could not be read.
    #[error("{}: cannot read file: {source}", .path.display())]
    Io {
        /// Document path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid YAML.
    #[error("{}: invalid YAML: {reason}", .path.display())]
    InvalidYaml {
        /// Document path.
        path: PathBuf,
        /// Decoder message.
        reason: String,
    },

    /// The document is not valid JSON.
    #[error("{}: invalid JSON: {reason}", .path.display())]
    InvalidJson {
        /// Document path.
        path: PathBuf,
        /// Decoder message.
        reason: String,
    },

    /// The YAML tree uses a construct with no JSON equivalent.
    #[error("{}: unsupported YAML construct: {reason}", .path.display())]
    Unsupported {
        /// Document path.
        path: PathBuf,
        /// What could not be converted.
        reason: String,
    },

    /// The document (or a nested field) is not a mapping.
    #[error("{context}: not a mapping")]
    NotAMapping {
        /// File name or field path that was expected to be a mapping.
        context: String,
    },

    /// A field is present but has the wrong type.
    #[error("{field}: expected {expected}, found {found}")]
    WrongType {
        /// Dotted field path.
        field: String,
        /// Expected JSON type name.
        expected: &'static str,
        /// Actual JSON type name.
        found: &'static str,
    },
}

impl ParseError {
    /// The message without the document path, for reports that already
    /// name the document.
    pub fn reason(&self) -> String {
        match self {
            Self::Io { source, .. } => format!("cannot read file: {source}"),
            Self::InvalidYaml { reason, .. } => format!("invalid YAML: {reason}"),
            Self::InvalidJson { reason, .. } => format!("invalid JSON: {reason}"),
            Self::Unsupported { reason, .. } => format!("unsupported YAML construct: {reason}"),
            Self::NotAMapping { .. } | Self::WrongType { .. } => self.to_string(),
        }
    }
}

/// Name of the JSON type of a value, for [`ParseError::WrongType`].
pub fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "mapping",
    }
}
