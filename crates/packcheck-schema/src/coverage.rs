//! # Placeholder Coverage
//!
//! A document schema lists the placeholders a template needs in its
//! top-level `required` array, as dotted paths (`"client.name"`). A
//! render-input payload covers a placeholder iff walking the path through
//! nested mappings reaches a value that is not `null`.
//!
//! This check is deliberately narrower than schema conformance: it answers
//! "can the template be filled", not "is the payload well-typed".

use std::fmt;

use serde_json::Value;

use packcheck_core::error::json_type_name;
use packcheck_core::ParseError;

/// A `.`-separated path into nested mappings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DottedPath {
    raw: String,
}

impl DottedPath {
    /// Parse a dotted path. Segments must be non-empty.
    pub fn parse(raw: &str) -> Result<Self, String> {
        if raw.is_empty() {
            return Err("empty path".to_string());
        }
        if raw.split('.').any(str::is_empty) {
            return Err(format!("empty segment in path {raw:?}"));
        }
        Ok(Self {
            raw: raw.to_string(),
        })
    }

    /// The path as written in the schema.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Mapping keys from the outermost inwards.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.raw.split('.')
    }

    /// The value at this path, if every segment names a key of a mapping.
    pub fn lookup<'v>(&self, value: &'v Value) -> Option<&'v Value> {
        self.segments()
            .try_fold(value, |current, segment| current.as_object()?.get(segment))
    }

    /// Whether the path reaches a non-null value.
    pub fn is_covered_by(&self, value: &Value) -> bool {
        self.lookup(value).is_some_and(|v| !v.is_null())
    }
}

impl fmt::Display for DottedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Result of a coverage check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageReport {
    /// Every required path.
    pub required: Vec<DottedPath>,
    /// Required paths the payload does not cover, in schema order.
    pub missing: Vec<DottedPath>,
}

impl CoverageReport {
    /// Whether every required path is covered.
    pub fn is_covered(&self) -> bool {
        self.missing.is_empty()
    }
}

/// The dotted paths listed in a schema's top-level `required` array.
///
/// # Errors
///
/// `NotAMapping` if the schema is not an object; `WrongType` if `required`
/// is not an array of non-empty dotted strings.
pub fn required_paths(schema: &Value) -> Result<Vec<DottedPath>, ParseError> {
    let map = schema.as_object().ok_or_else(|| ParseError::NotAMapping {
        context: "schema".to_string(),
    })?;
    let items = match map.get("required") {
        None => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(ParseError::WrongType {
                field: "required".to_string(),
                expected: "array",
                found: json_type_name(other),
            })
        }
    };
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let wrong = |found| ParseError::WrongType {
                field: format!("required[{i}]"),
                expected: "dotted path string",
                found,
            };
            let raw = item.as_str().ok_or_else(|| wrong(json_type_name(item)))?;
            DottedPath::parse(raw).map_err(|_| wrong("malformed string"))
        })
        .collect()
}

/// Check which of the schema's required paths `payload` covers.
pub fn coverage(schema: &Value, payload: &Value) -> Result<CoverageReport, ParseError> {
    let required = required_paths(schema)?;
    let missing = required
        .iter()
        .filter(|path| !path.is_covered_by(payload))
        .cloned()
        .collect();
    Ok(CoverageReport { required, missing })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn paths(report: &CoverageReport) -> Vec<&str> {
        report.missing.iter().map(DottedPath::as_str).collect()
    }

    #[test]
    fn reports_exactly_the_uncovered_paths() {
        let schema = json!({"required": ["a.b", "c"]});
        let report = coverage(&schema, &json!({"a": {"b": 1}})).unwrap();
        assert_eq!(paths(&report), vec!["c"]);
        assert!(!report.is_covered());
    }

    #[test]
    fn null_counts_as_uncovered() {
        let schema = json!({"required": ["a", "b.c"]});
        let report = coverage(&schema, &json!({"a": null, "b": {"c": null}})).unwrap();
        assert_eq!(paths(&report), vec!["a", "b.c"]);
    }

    #[test]
    fn falsy_values_are_covered() {
        let schema = json!({"required": ["a", "b", "c", "d"]});
        let payload = json!({"a": false, "b": 0, "c": "", "d": []});
        assert!(coverage(&schema, &payload).unwrap().is_covered());
    }

    #[test]
    fn traversal_stops_at_non_mappings() {
        let schema = json!({"required": ["a.b", "list.0"]});
        let payload = json!({"a": "scalar", "list": [1]});
        let report = coverage(&schema, &payload).unwrap();
        assert_eq!(paths(&report), vec!["a.b", "list.0"]);
    }

    #[test]
    fn absent_required_means_nothing_to_cover() {
        let report = coverage(&json!({"type": "object"}), &json!({})).unwrap();
        assert!(report.required.is_empty() && report.is_covered());
    }

    #[test]
    fn required_must_be_array_of_strings() {
        let err = required_paths(&json!({"required": "a"})).unwrap_err();
        assert_eq!(err.to_string(), "required: expected array, found string");
        let err = required_paths(&json!({"required": ["a", 3]})).unwrap_err();
        assert_eq!(err.to_string(), "required[1]: expected dotted path string, found number");
        assert!(required_paths(&json!({"required": ["a..b"]})).is_err());
        assert!(required_paths(&json!([])).is_err());
    }

    proptest! {
        #[test]
        fn nested_payload_built_from_path_covers_it(
            segments in prop::collection::vec("[a-z_]{1,8}", 1..5)
        ) {
            let raw = segments.join(".");
            let path = DottedPath::parse(&raw).unwrap();
            let payload = segments
                .iter()
                .rev()
                .fold(json!("x"), |inner, key| {
                    let mut map = serde_json::Map::new();
                    map.insert(key.clone(), inner);
                    Value::Object(map)
                });
            prop_assert!(path.is_covered_by(&payload));
            let empty = json!({});
            prop_assert!(!path.is_covered_by(&empty));
        }
    }
}
