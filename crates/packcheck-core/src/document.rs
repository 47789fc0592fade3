//! # Document Decoding
//!
//! The YAML/JSON decode primitive. Every document in a pack is decoded into
//! a `serde_json::Value`, whatever its source format, so that schema
//! validation and reference resolution operate on one value model.
//!
//! YAML has a richer type system than JSON (tags, non-string keys, NaN).
//! Pack documents use only the JSON-compatible subset; anything else is a
//! [`ParseError::Unsupported`].

use std::path::Path;

use serde_json::Value;

use crate::error::ParseError;

/// Source format of a document, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// `.yaml` / `.yml`
    Yaml,
    /// Anything else is decoded as JSON.
    Json,
}

impl DocumentFormat {
    /// Pick the format from a path's extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::Yaml,
            _ => Self::Json,
        }
    }
}

/// Decode a YAML document.
pub fn load_yaml(path: &Path) -> Result<Value, ParseError> {
    let content = read(path)?;
    let yaml: serde_yaml::Value =
        serde_yaml::from_str(&content).map_err(|e| ParseError::InvalidYaml {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    yaml_to_json_value(&yaml).map_err(|reason| ParseError::Unsupported {
        path: path.to_path_buf(),
        reason,
    })
}

/// Decode a JSON document.
pub fn load_json(path: &Path) -> Result<Value, ParseError> {
    let content = read(path)?;
    serde_json::from_str(&content).map_err(|e| ParseError::InvalidJson {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Decode a document, choosing YAML or JSON by extension.
pub fn load_document(path: &Path) -> Result<Value, ParseError> {
    match DocumentFormat::from_path(path) {
        DocumentFormat::Yaml => load_yaml(path),
        DocumentFormat::Json => load_json(path),
    }
}

fn read(path: &Path) -> Result<String, ParseError> {
    std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Convert a `serde_yaml::Value` to a `serde_json::Value`.
///
/// Tags are dropped and the tagged value converted. Non-string scalar keys
/// are stringified; sequence and mapping keys are rejected.
pub fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value, String> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Number(serde_json::Number::from(i)))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::Number(serde_json::Number::from(u)))
            } else if let Some(f) = n.as_f64() {
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| format!("cannot represent float {f} in JSON"))
            } else {
                Err(format!("unsupported YAML number: {n:?}"))
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::String(s.clone())),
        serde_yaml::Value::Sequence(seq) => {
            let items: Result<Vec<Value>, String> = seq.iter().map(yaml_to_json_value).collect();
            Ok(Value::Array(items?))
        }
        serde_yaml::Value::Mapping(map) => {
            let mut json_map = serde_json::Map::new();
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    other => return Err(format!("unsupported YAML map key type: {other:?}")),
                };
                json_map.insert(key, yaml_to_json_value(v)?);
            }
            Ok(Value::Object(json_map))
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json_value(&tagged.value),
    }
}
