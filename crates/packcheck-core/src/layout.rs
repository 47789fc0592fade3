//! # Pack Layout Configuration
//!
//! `PackLayout` names every file and directory convention the verification
//! stages rely on. Defaults describe the standard pack format; a YAML file
//! may override any subset of fields.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Directory names skipped by default at the top level of a pack.
pub const DEFAULT_EXCLUDED_DIRS: [&str; 5] = [".git", ".venv", "venv", "__pycache__", ".vscode"];

/// File and directory conventions of a pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackLayout {
    /// Manifest filename at the pack root. Never listed in the manifest.
    pub manifest_file: String,
    /// Top-level directory names excluded from scans.
    pub excluded_dirs: BTreeSet<String>,
    /// Subtree searched for schema documents.
    pub schema_root: PathBuf,
    /// Filename suffix identifying schema documents.
    pub schema_suffix: String,
    /// Directory holding per-template render-input schemas.
    pub document_schema_dir: PathBuf,
    /// Schema filename that report test vectors are validated against.
    pub report_schema: String,
    /// Filename prefix of report test vectors.
    pub report_vector_prefix: String,
    /// Filename suffix of report test vectors.
    pub report_vector_suffix: String,
    /// Directory of preset documents.
    pub preset_dir: PathBuf,
    /// Library of task pools.
    pub task_pool_dir: PathBuf,
    /// Library of profiles.
    pub profile_dir: PathBuf,
    /// Library of calendar logic documents.
    pub calendar_dir: PathBuf,
}

impl Default for PackLayout {
    fn default() -> Self {
        Self {
            manifest_file: "manifest.yaml".to_string(),
            excluded_dirs: DEFAULT_EXCLUDED_DIRS.iter().map(|s| s.to_string()).collect(),
            schema_root: PathBuf::from("."),
            schema_suffix: ".schema.json".to_string(),
            document_schema_dir: PathBuf::from("schemas/documents"),
            report_schema: "report_result.schema.json".to_string(),
            report_vector_prefix: "expected_report_".to_string(),
            report_vector_suffix: ".json".to_string(),
            preset_dir: PathBuf::from("libraries/preset_library"),
            task_pool_dir: PathBuf::from("libraries/task_pool"),
            profile_dir: PathBuf::from("libraries/profile_library"),
            calendar_dir: PathBuf::from("libraries/calendar"),
        }
    }
}

impl PackLayout {
    /// Load a layout from a YAML file; absent fields keep their defaults.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigurationError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigurationError::ConfigFile {
                path: path.to_path_buf(),
                reason: format!("cannot read: {e}"),
            })?;
        serde_yaml::from_str(&content).map_err(|e| ConfigurationError::ConfigFile {
            path: path.to_path_buf(),
            reason: format!("invalid YAML: {e}"),
        })
    }

    /// Load from `path` if given, otherwise use defaults.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigurationError> {
        match path {
            Some(p) => {
                let layout = Self::from_yaml_file(p)?;
                tracing::debug!(config = %p.display(), "loaded pack layout");
                Ok(layout)
            }
            None => Ok(Self::default()),
        }
    }

    /// Whether a filename names a report test vector.
    pub fn is_report_vector(&self, file_name: &str) -> bool {
        file_name.len() >= self.report_vector_prefix.len() + self.report_vector_suffix.len()
            && file_name.starts_with(&self.report_vector_prefix)
            && file_name.ends_with(&self.report_vector_suffix)
    }

    /// Schema filename for a template, by convention `<stem>.schema.json`.
    pub fn schema_name_for_template(&self, template: &str) -> String {
        let file_name = Path::new(template)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(template);
        let stem = match file_name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => file_name,
        };
        format!("{stem}{}", self.schema_suffix)
    }
}
