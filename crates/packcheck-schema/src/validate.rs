//! # Schema Validation
//!
//! Conformance checking of JSON documents against loaded schemas, backed by
//! the `jsonschema` crate. The draft is taken from each schema's `$schema`
//! keyword.
//!
//! ## Schema Resolution
//!
//! Cross-schema `$ref`s resolve against the [`SchemaStore`] only: by the
//! referenced schema's `$id`, by pack-relative path, or by file name. A
//! `$ref` that matches none of these fails compilation. Nothing is fetched
//! over the network.
//!
//! ## Report Vectors
//!
//! [`validate_report_vectors`] validates every `expected_report_*.json`
//! test vector against `report_result.schema.json`, collecting every
//! failing vector.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use jsonschema::{Retrieve, Uri, Validator};
use serde_json::{json, Value};
use thiserror::Error;

use packcheck_core::{
    load_json, summarize, walk_files, CheckResult, ConfigurationError, PackLayout,
};

use crate::store::SchemaStore;

/// Stage name reported by the runner.
pub const CHECK_NAME: &str = "report.vectors";

const FAILURE_LIMIT: usize = 3;

/// Resolves `$ref` URIs against schemas already in memory.
struct LocalSchemaRetriever {
    schemas_by_uri: HashMap<String, Value>,
}

impl Retrieve for LocalSchemaRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();
        if let Some(value) = self.schemas_by_uri.get(uri_str) {
            return Ok(value.clone());
        }
        // Relative refs arrive joined onto a base URI; fall back to the file name.
        let file_name = uri_str.rsplit('/').next().unwrap_or(uri_str);
        self.schemas_by_uri
            .get(file_name)
            .cloned()
            .ok_or_else(|| format!("schema not found locally: {uri_str}").into())
    }
}

/// Error during schema validation.
#[derive(Error, Debug)]
pub enum SchemaValidationError {
    /// The document did not conform to the schema.
    #[error("validation failed against schema '{schema_name}':\n{violations}")]
    ValidationFailed {
        /// Schema the document was checked against.
        schema_name: String,
        /// Every violation found.
        violations: ValidationViolations,
    },

    /// The schema could not be compiled.
    #[error("validator build error for schema '{schema_name}': {reason}")]
    ValidatorBuildError {
        /// Schema that failed to compile.
        schema_name: String,
        /// Compiler message, including any unresolvable `$ref`.
        reason: String,
    },
}

/// A single validation violation with structured context.
#[derive(Debug, Clone)]
pub struct Violation {
    /// JSON Pointer to the violating field in the instance.
    pub instance_path: String,
    /// JSON Pointer within the schema that triggered the error.
    pub schema_path: String,
    /// Human-readable description.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "(root): {}", self.message)
        } else {
            write!(f, "{}: {}", self.instance_path, self.message)
        }
    }
}

/// Collection of validation violations.
#[derive(Debug, Clone)]
pub struct ValidationViolations {
    violations: Vec<Violation>,
}

impl ValidationViolations {
    /// Number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Whether the instance conformed.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Every violation, in the order the validator reported them.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }
}

impl fmt::Display for ValidationViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  {v}")?;
        }
        Ok(())
    }
}

/// Check that schema validation works at all.
///
/// Compiles a trivial schema and validates one conforming and one
/// non-conforming instance. Run once before any stage.
///
/// # Errors
///
/// `ValidationCapabilityUnavailable` if compilation fails or the results
/// are wrong.
pub fn probe() -> Result<(), ConfigurationError> {
    let unavailable = |reason: String| ConfigurationError::ValidationCapabilityUnavailable(reason);
    let validator = jsonschema::options()
        .build(&json!({"type": "object", "required": ["probe"]}))
        .map_err(|e| unavailable(format!("cannot compile probe schema: {e}")))?;
    if !validator.is_valid(&json!({"probe": true})) || validator.is_valid(&json!({})) {
        return Err(unavailable("probe schema gave wrong results".to_string()));
    }
    tracing::debug!("schema validation capability available");
    Ok(())
}

/// Compiles and applies schemas, with every stored schema available for
/// `$ref` resolution.
pub struct SchemaEngine {
    schemas_by_uri: HashMap<String, Value>,
}

impl SchemaEngine {
    /// Index every schema in `store` under its `$id`, pack-relative path,
    /// and file name.
    pub fn new(store: &SchemaStore) -> Self {
        let mut schemas_by_uri = HashMap::new();
        // Reverse order so the first path wins a file-name collision.
        for (path, value) in store.schemas().iter().rev() {
            if let Some(id) = value.get("$id").and_then(Value::as_str) {
                schemas_by_uri.insert(id.to_string(), value.clone());
            }
            schemas_by_uri.insert(path.as_str().to_string(), value.clone());
            schemas_by_uri.insert(path.file_name().to_string(), value.clone());
        }
        Self { schemas_by_uri }
    }

    /// An engine with no schemas available for `$ref` resolution.
    pub fn empty() -> Self {
        Self {
            schemas_by_uri: HashMap::new(),
        }
    }

    /// Compile `schema`. `schema_name` is used only in errors.
    pub fn compile(&self, schema_name: &str, schema: &Value) -> Result<Validator, SchemaValidationError> {
        let retriever = LocalSchemaRetriever {
            schemas_by_uri: self.schemas_by_uri.clone(),
        };
        jsonschema::options()
            .with_retriever(retriever)
            .build(schema)
            .map_err(|e| SchemaValidationError::ValidatorBuildError {
                schema_name: schema_name.to_string(),
                reason: e.to_string(),
            })
    }

    /// Validate `instance` against an already compiled validator.
    pub fn check(
        validator: &Validator,
        schema_name: &str,
        instance: &Value,
    ) -> Result<(), SchemaValidationError> {
        let violations = ValidationViolations {
            violations: validator
                .iter_errors(instance)
                .map(|e| Violation {
                    instance_path: e.instance_path.to_string(),
                    schema_path: e.schema_path.to_string(),
                    message: e.to_string(),
                })
                .collect(),
        };
        if violations.is_empty() {
            Ok(())
        } else {
            Err(SchemaValidationError::ValidationFailed {
                schema_name: schema_name.to_string(),
                violations,
            })
        }
    }

    /// Compile `schema` and validate `instance` against it.
    pub fn validate(
        &self,
        schema_name: &str,
        schema: &Value,
        instance: &Value,
    ) -> Result<(), SchemaValidationError> {
        let validator = self.compile(schema_name, schema)?;
        Self::check(&validator, schema_name, instance)
    }
}

/// Validate every report test vector in the pack against the report schema.
///
/// Fails if the schema is absent or unloadable, if it does not compile, if
/// no vectors exist, or if any vector fails to parse or conform.
pub fn validate_report_vectors(root: &Path, layout: &PackLayout, store: &SchemaStore) -> CheckResult {
    let schema_name = layout.report_schema.as_str();
    let Some((schema_path, schema)) = store.find_by_name(schema_name) else {
        let details = match store.failure_for_name(schema_name) {
            Some(failure) => format!("Failed to load report schema: {failure}"),
            None => format!("{schema_name} not found"),
        };
        return CheckResult::fail(CHECK_NAME, details);
    };

    let engine = SchemaEngine::new(store);
    let validator = match engine.compile(schema_path.as_str(), schema) {
        Ok(v) => v,
        Err(e) => return CheckResult::fail(CHECK_NAME, format!("Failed to compile report schema: {e}")),
    };

    let vectors = match walk_files(root, &layout.excluded_dirs, Some(&layout.manifest_file)) {
        Ok(files) => files
            .into_iter()
            .filter(|f| layout.is_report_vector(f.rel.file_name()))
            .collect::<Vec<_>>(),
        Err(e) => return CheckResult::fail(CHECK_NAME, format!("Cannot search for report vectors: {e}")),
    };
    if vectors.is_empty() {
        return CheckResult::fail(
            CHECK_NAME,
            format!(
                "No {}*{} test vectors found",
                layout.report_vector_prefix, layout.report_vector_suffix
            ),
        );
    }

    let mut failures: Vec<String> = Vec::new();
    for vector in &vectors {
        let outcome = load_json(&vector.abs)
            .map_err(|e| e.to_string())
            .and_then(|instance| {
                SchemaEngine::check(&validator, schema_path.as_str(), &instance)
                    .map_err(describe_failure)
            });
        match outcome {
            Ok(()) => tracing::debug!(vector = %vector.rel, "report vector conforms"),
            Err(reason) => {
                tracing::debug!(vector = %vector.rel, %reason, "report vector rejected");
                failures.push(format!("{}: {reason}", vector.rel));
            }
        }
    }

    if failures.is_empty() {
        CheckResult::pass(
            CHECK_NAME,
            format!("Validated {} report vectors against {schema_path}", vectors.len()),
        )
    } else {
        CheckResult::fail(
            CHECK_NAME,
            summarize("Report vector validation failures", &failures, FAILURE_LIMIT, "; "),
        )
    }
}

/// First violation of a failed vector, with a count of the rest.
fn describe_failure(err: SchemaValidationError) -> String {
    match err {
        SchemaValidationError::ValidationFailed { violations, .. } => {
            let first = violations
                .violations()
                .first()
                .map(ToString::to_string)
                .unwrap_or_default();
            if violations.len() > 1 {
                format!("{first} (+{} more)", violations.len() - 1)
            } else {
                first
            }
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    const REPORT_SCHEMA: &str = r#"{
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
        "required": ["status", "findings"],
        "properties": {
            "status": {"enum": ["PASS", "FAIL"]},
            "findings": {"type": "array", "items": {"$ref": "finding.schema.json"}}
        }
    }"#;

    const FINDING_SCHEMA: &str = r#"{
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
        "required": ["code"],
        "properties": {"code": {"type": "string"}}
    }"#;

    fn pack(root: &Path) {
        write(root, "schemas/report_result.schema.json", REPORT_SCHEMA);
        write(root, "schemas/finding.schema.json", FINDING_SCHEMA);
        write(
            root,
            "tests/expected_report_ok.json",
            r#"{"status":"PASS","findings":[{"code":"X1"}]}"#,
        );
    }

    fn run(root: &Path) -> CheckResult {
        let layout = PackLayout::default();
        let store = SchemaStore::load(root, &layout).unwrap();
        validate_report_vectors(root, &layout, &store)
    }

    #[test]
    fn probe_succeeds() {
        probe().unwrap();
    }

    #[test]
    fn conforming_vectors_pass() {
        let dir = tempfile::tempdir().unwrap();
        pack(dir.path());
        let result = run(dir.path());
        assert!(result.ok, "{}", result.details);
        assert_eq!(
            result.details,
            "Validated 1 report vectors against schemas/report_result.schema.json"
        );
    }

    #[test]
    fn cross_schema_ref_is_enforced() {
        let dir = tempfile::tempdir().unwrap();
        pack(dir.path());
        write(
            dir.path(),
            "tests/expected_report_bad.json",
            r#"{"status":"PASS","findings":[{"code":7}]}"#,
        );
        let result = run(dir.path());
        assert!(!result.ok);
        assert!(result
            .details
            .starts_with("Report vector validation failures (1): tests/expected_report_bad.json:"));
    }

    #[test]
    fn every_bad_vector_is_counted() {
        let dir = tempfile::tempdir().unwrap();
        pack(dir.path());
        for i in 0..4 {
            write(dir.path(), &format!("v/expected_report_{i}.json"), r#"{"status":"MAYBE"}"#);
        }
        write(dir.path(), "v/expected_report_broken.json", "{");
        let result = run(dir.path());
        assert!(!result.ok);
        assert!(result.details.starts_with("Report vector validation failures (5)"));
        assert!(result.details.ends_with("...and 2 more"));
    }

    #[test]
    fn missing_report_schema_fails() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "tests/expected_report_ok.json", "{}");
        let result = run(dir.path());
        assert!(!result.ok);
        assert_eq!(result.details, "report_result.schema.json not found");
    }

    #[test]
    fn unparsable_report_schema_is_named() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "schemas/report_result.schema.json", "{");
        let result = run(dir.path());
        assert!(result
            .details
            .starts_with("Failed to load report schema: schemas/report_result.schema.json:"));
    }

    #[test]
    fn no_vectors_fails() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "schemas/report_result.schema.json", REPORT_SCHEMA);
        write(dir.path(), "schemas/finding.schema.json", FINDING_SCHEMA);
        let result = run(dir.path());
        assert!(!result.ok);
        assert_eq!(result.details, "No expected_report_*.json test vectors found");
    }

    #[test]
    fn unknown_ref_fails_compilation() {
        let engine = SchemaEngine::empty();
        let schema = serde_json::json!({"$ref": "https://example.invalid/nowhere.schema.json"});
        assert!(matches!(
            engine.compile("s", &schema),
            Err(SchemaValidationError::ValidatorBuildError { .. })
        ));
    }

    #[test]
    fn violations_carry_instance_paths() {
        let engine = SchemaEngine::empty();
        let schema = serde_json::json!({
            "type": "object",
            "properties": {"a": {"type": "object", "properties": {"b": {"type": "integer"}}}}
        });
        let err = engine
            .validate("s", &schema, &serde_json::json!({"a": {"b": "x"}}))
            .unwrap_err();
        let SchemaValidationError::ValidationFailed { violations, .. } = err else {
            panic!("expected ValidationFailed");
        };
        assert_eq!(violations.len(), 1);
        assert_eq!(violations.violations()[0].instance_path, "/a/b");
    }
}
