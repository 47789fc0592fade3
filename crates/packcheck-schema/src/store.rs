//! # Schema Store
//!
//! Recursive discovery and parsing of every schema file below the schema
//! root. Parse failures are collected, not fatal: one broken schema never
//! hides the others.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde_json::Value;

use packcheck_core::{summarize, walk_files, CheckResult, PackError, PackLayout, RelativePath};

/// Stage name reported by the runner.
pub const CHECK_NAME: &str = "schemas.load";

const FAILURE_LIMIT: usize = 5;

/// A schema file that could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaLoadFailure {
    /// Pack-relative path.
    pub path: RelativePath,
    /// Decoder message, or why the document is not a schema.
    pub reason: String,
}

impl fmt::Display for SchemaLoadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.reason)
    }
}

/// Every schema found in a pack, keyed by pack-relative path.
#[derive(Debug, Default)]
pub struct SchemaStore {
    schemas: BTreeMap<RelativePath, Value>,
    failures: Vec<SchemaLoadFailure>,
}

impl SchemaStore {
    /// Discover and parse every schema below `root/<schema_root>`.
    ///
    /// # Errors
    ///
    /// `PackError::Io` if the tree cannot be traversed. Individual schema
    /// parse failures are recorded in [`failures`](Self::failures).
    pub fn load(root: &Path, layout: &PackLayout) -> Result<Self, PackError> {
        let schema_root = root.join(&layout.schema_root);
        let files = walk_files(&schema_root, &layout.excluded_dirs, None)?;
        let mut store = Self::default();

        for file in files {
            if !file.rel.file_name().ends_with(&layout.schema_suffix) {
                continue;
            }
            // Key by pack-relative path even when the schema root is nested.
            let rel = RelativePath::from_fs(root, &file.abs).unwrap_or(file.rel);
            match parse_schema(&file.abs) {
                Ok(value) => {
                    store.schemas.insert(rel, value);
                }
                Err(reason) => {
                    tracing::warn!(schema = %rel, %reason, "schema failed to load");
                    store.failures.push(SchemaLoadFailure { path: rel, reason });
                }
            }
        }

        tracing::info!(
            loaded = store.schemas.len(),
            failed = store.failures.len(),
            "schema discovery complete"
        );
        Ok(store)
    }

    /// Parsed schemas, sorted by path.
    pub fn schemas(&self) -> &BTreeMap<RelativePath, Value> {
        &self.schemas
    }

    /// Schemas that failed to parse, in path order.
    pub fn failures(&self) -> &[SchemaLoadFailure] {
        &self.failures
    }

    /// Number of schema files found, loaded or not.
    pub fn discovered(&self) -> usize {
        self.schemas.len() + self.failures.len()
    }

    /// The first loaded schema (in path order) with the given file name.
    pub fn find_by_name(&self, file_name: &str) -> Option<(&RelativePath, &Value)> {
        let mut found = self.schemas.iter().filter(|(p, _)| p.file_name() == file_name);
        let first = found.next();
        let others = found.count();
        if others > 0 {
            tracing::warn!(file_name, others, "schema name is ambiguous; using the first by path");
        }
        first
    }

    /// The load failure for a schema file name, if it failed.
    pub fn failure_for_name(&self, file_name: &str) -> Option<&SchemaLoadFailure> {
        self.failures.iter().find(|f| f.path.file_name() == file_name)
    }

    /// Summarize as the `schemas.load` stage result.
    pub fn to_check_result(&self, layout: &PackLayout) -> CheckResult {
        if self.discovered() == 0 {
            return CheckResult::fail(
                CHECK_NAME,
                format!("No *{} files found", layout.schema_suffix),
            );
        }
        if !self.failures.is_empty() {
            return CheckResult::fail(
                CHECK_NAME,
                summarize("Schema JSON parse errors", &self.failures, FAILURE_LIMIT, "; "),
            );
        }
        CheckResult::pass(CHECK_NAME, format!("Loaded {} schema files", self.schemas.len()))
    }
}

fn parse_schema(path: &Path) -> Result<Value, String> {
    let content = std::fs::read_to_string(path).map_err(|e| format!("cannot read file: {e}"))?;
    let value: Value = serde_json::from_str(&content).map_err(|e| e.to_string())?;
    match value {
        Value::Object(_) | Value::Bool(_) => Ok(value),
        _ => Err("schema must be a JSON object or boolean".to_string()),
    }
}
