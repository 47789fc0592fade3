//! # Pack Manifest
//!
//! The authoritative record of a pack's expected contents:
//!
//! ```yaml
//! manifest_version: v1.0.1
//! pack:
//!   name: Example_Pack
//!   pack_version: v1.0.1
//!   created_at_utc: "2025-01-15T12:00:00Z"
//!   hash_algorithm: sha256
//!   root: .
//! files:
//!   - path: libraries/task_pool/tp.yaml
//!     sha256: 2cf24dba...
//!     bytes: 5
//! ```
//!
//! ## Invariants
//!
//! - `files` is sorted by path and contains no duplicate paths.
//! - Paths are pack-root-relative and forward-slash separated.
//! - The manifest never lists itself.
//!
//! A manifest is created fresh by [`Manifest::generate`] or loaded
//! read-only by [`Manifest::load`]; it is never mutated in place.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use packcheck_core::{ConfigurationError, DigestAlgorithm, HexDigest, RelativePath, Timestamp};

/// Format version written into generated manifests.
pub const MANIFEST_FORMAT_VERSION: &str = "v1.0.1";

/// One file's recorded fingerprint. Identity is `path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Pack-relative path.
    pub path: RelativePath,
    /// Content digest.
    #[serde(rename = "sha256")]
    pub digest: HexDigest,
    /// Size in bytes. Optional in loaded manifests; always set by scans.
    #[serde(rename = "bytes", default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
}

/// Pack-level metadata recorded alongside the file list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackMetadata {
    /// Pack name.
    pub name: String,
    /// Pack version string.
    pub pack_version: String,
    /// When the manifest was generated.
    pub created_at_utc: Timestamp,
    /// Digest algorithm used for every entry.
    pub hash_algorithm: DigestAlgorithm,
    /// Root of the recorded paths, relative to the manifest. Always `.`.
    #[serde(default = "default_root")]
    pub root: String,
}

fn default_root() -> String {
    ".".to_string()
}

/// A complete manifest document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Manifest format version.
    pub manifest_version: String,
    /// Pack metadata.
    pub pack: PackMetadata,
    /// File entries, sorted by path.
    pub files: Vec<FileEntry>,
}

impl Manifest {
    /// Build a manifest from scanned entries.
    ///
    /// Entries are sorted by path. Entries named `manifest_file` are dropped
    /// so the manifest can never record itself.
    pub fn generate(pack: PackMetadata, entries: Vec<FileEntry>, manifest_file: &str) -> Self {
        let mut files: Vec<FileEntry> = entries
            .into_iter()
            .filter(|e| e.path.as_str() != manifest_file)
            .collect();
        files.sort_by(|a, b| a.path.cmp(&b.path));
        files.dedup_by(|a, b| a.path == b.path);
        Self {
            manifest_version: MANIFEST_FORMAT_VERSION.to_string(),
            pack,
            files,
        }
    }

    /// Load and validate a manifest.
    ///
    /// # Errors
    ///
    /// `ManifestMissing` if the file does not exist; `ManifestInvalid` if it
    /// cannot be read, does not parse, or violates a manifest invariant.
    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        if !path.is_file() {
            return Err(ConfigurationError::ManifestMissing(path.to_path_buf()));
        }
        let invalid = |reason: String| ConfigurationError::ManifestInvalid {
            path: path.to_path_buf(),
            reason,
        };
        let content = std::fs::read_to_string(path).map_err(|e| invalid(format!("cannot read: {e}")))?;
        let manifest: Manifest =
            serde_yaml::from_str(&content).map_err(|e| invalid(format!("failed to parse: {e}")))?;
        let manifest_file = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        manifest.check_invariants(manifest_file).map_err(invalid)?;
        tracing::debug!(
            path = %path.display(),
            entries = manifest.files.len(),
            "loaded manifest"
        );
        Ok(manifest)
    }

    /// Check the manifest invariants: no duplicates, no self-entry.
    ///
    /// Entries need not be sorted on disk; verification sorts its output.
    pub fn check_invariants(&self, manifest_file: &str) -> Result<(), String> {
        if self.pack.root != "." {
            return Err(format!("pack.root must be \".\", got {:?}", self.pack.root));
        }
        let mut seen = BTreeSet::new();
        for entry in &self.files {
            if entry.path.as_str() == manifest_file {
                return Err(format!("manifest lists itself: {}", entry.path));
            }
            if !seen.insert(entry.path.as_str()) {
                return Err(format!("duplicate path: {}", entry.path));
            }
        }
        Ok(())
    }

    /// Serialize to YAML, keys in document order.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Write to `path` as YAML.
    pub fn write(&self, path: &Path) -> std::io::Result<()> {
        let yaml = self
            .to_yaml()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, yaml)
    }

    /// Whether two manifests record the same files (metadata ignored).
    pub fn same_entries(&self, other: &Manifest) -> bool {
        self.files.len() == other.files.len()
            && self.files.iter().zip(&other.files).all(|(a, b)| {
                a.path == b.path && a.digest.matches(&b.digest) && a.size_bytes == b.size_bytes
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use packcheck_core::sha256_bytes;

    fn metadata() -> PackMetadata {
        PackMetadata {
            name: "Example_Pack".to_string(),
            pack_version: "v1.0.1".to_string(),
            created_at_utc: Timestamp::parse("2025-01-15T12:00:00Z").unwrap(),
            hash_algorithm: DigestAlgorithm::Sha256,
            root: ".".to_string(),
        }
    }

    fn entry(path: &str, content: &[u8]) -> FileEntry {
        FileEntry {
            path: RelativePath::parse(path).unwrap(),
            digest: sha256_bytes(content),
            size_bytes: Some(content.len() as u64),
        }
    }

    #[test]
    fn generate_sorts_and_drops_self() {
        let m = Manifest::generate(
            metadata(),
            vec![entry("b.yaml", b"b"), entry("manifest.yaml", b"m"), entry("a.yaml", b"a")],
            "manifest.yaml",
        );
        let paths: Vec<&str> = m.files.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["a.yaml", "b.yaml"]);
        assert_eq!(m.manifest_version, MANIFEST_FORMAT_VERSION);
    }

    #[test]
    fn yaml_key_order_and_names() {
        let m = Manifest::generate(metadata(), vec![entry("x.yaml", b"hello")], "manifest.yaml");
        let yaml = m.to_yaml().unwrap();
        let mv = yaml.find("manifest_version").unwrap();
        let pack = yaml.find("pack:").unwrap();
        let files = yaml.find("files:").unwrap();
        assert!(mv < pack && pack < files);
        assert!(yaml.contains("hash_algorithm: sha256"));
        assert!(yaml.contains("2025-01-15T12:00:00Z"));
        assert!(yaml.contains(
            "sha256: 2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        ));
        assert!(yaml.contains("bytes: 5"));
    }

    #[test]
    fn write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.yaml");
        let m = Manifest::generate(metadata(), vec![entry("x.yaml", b"hello")], "manifest.yaml");
        m.write(&path).unwrap();
        let loaded = Manifest::load(&path).unwrap();
        assert_eq!(loaded, m);
    }

    #[test]
    fn load_missing_is_manifest_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = Manifest::load(&dir.path().join("manifest.yaml")).unwrap_err();
        assert!(matches!(err, ConfigurationError::ManifestMissing(_)));
    }

    fn load_str(yaml: &str) -> Result<Manifest, ConfigurationError> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.yaml");
        std::fs::write(&path, yaml).unwrap();
        Manifest::load(&path)
    }

    const HEADER: &str = "manifest_version: v1.0.1\npack:\n  name: P\n  pack_version: v1\n  created_at_utc: \"2025-01-15T12:00:00Z\"\n  hash_algorithm: sha256\n  root: .\n";
    const HELLO: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    #[test]
    fn load_accepts_entry_without_bytes() {
        let m = load_str(&format!("{HEADER}files:\n  - path: x.yaml\n    sha256: {HELLO}\n")).unwrap();
        assert_eq!(m.files[0].size_bytes, None);
    }

    #[test]
    fn load_rejects_duplicates() {
        let yaml = format!(
            "{HEADER}files:\n  - path: x.yaml\n    sha256: {HELLO}\n  - path: x.yaml\n    sha256: {HELLO}\n"
        );
        let err = load_str(&yaml).unwrap_err();
        assert!(err.to_string().contains("duplicate path"), "{err}");
    }

    #[test]
    fn load_rejects_self_reference() {
        let yaml = format!("{HEADER}files:\n  - path: manifest.yaml\n    sha256: {HELLO}\n");
        let err = load_str(&yaml).unwrap_err();
        assert!(err.to_string().contains("lists itself"), "{err}");
    }

    #[test]
    fn load_rejects_malformed_fields() {
        for files in [
            "files:\n  - path: x.yaml\n    sha256: nothex\n",
            "files:\n  - path: ../x.yaml\n    sha256: HELLO\n",
            "files:\n  - sha256: HELLO\n",
            "files: not-a-list\n",
            "",
        ] {
            let yaml = format!("{HEADER}{}", files.replace("HELLO", HELLO));
            assert!(
                matches!(load_str(&yaml), Err(ConfigurationError::ManifestInvalid { .. })),
                "should reject: {files:?}"
            );
        }
    }

    #[test]
    fn load_rejects_unknown_algorithm_and_offset_timestamp() {
        let md5 = HEADER.replace("sha256", "md5");
        assert!(load_str(&format!("{md5}files: []\n")).is_err());
        let offset = HEADER.replace("12:00:00Z", "12:00:00+01:00");
        assert!(load_str(&format!("{offset}files: []\n")).is_err());
    }

    #[test]
    fn same_entries_ignores_metadata_and_digest_case() {
        let a = Manifest::generate(metadata(), vec![entry("x.yaml", b"hello")], "manifest.yaml");
        let mut b = a.clone();
        b.pack.name = "Other".to_string();
        b.files[0].digest = HexDigest::parse(&HELLO.to_uppercase()).unwrap();
        assert!(a.same_entries(&b));
        let c = Manifest::generate(metadata(), vec![entry("x.yaml", b"hellp")], "manifest.yaml");
        assert!(!a.same_entries(&c));
    }
}
