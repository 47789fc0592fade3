//! # Pack-Relative Paths
//!
//! `RelativePath` is the identity of a file within a pack. It is always
//! forward-slash separated, never absolute, never empty, and contains no
//! `.`/`..` segments, so that the same file has one spelling on every
//! platform and in every manifest.

use std::fmt;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

/// A normalized path relative to the pack root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RelativePath(String);

impl RelativePath {
    /// Parse a manifest-style path string.
    ///
    /// # Errors
    ///
    /// Rejects empty paths, absolute paths, backslashes, and empty, `.` or
    /// `..` segments.
    pub fn parse(s: &str) -> Result<Self, String> {
        if s.is_empty() {
            return Err("path is empty".to_string());
        }
        if s.contains('\\') {
            return Err(format!("path must use forward slashes: {s:?}"));
        }
        if s.starts_with('/') {
            return Err(format!("path must be relative to the pack root: {s:?}"));
        }
        for segment in s.split('/') {
            match segment {
                "" => return Err(format!("path has an empty segment: {s:?}")),
                "." | ".." => return Err(format!("path has a {segment:?} segment: {s:?}")),
                _ => {}
            }
        }
        Ok(Self(s.to_string()))
    }

    /// Build from a filesystem path below `root`.
    ///
    /// Returns `None` if `path` is not under `root`, is the root itself, or
    /// has a component that is not valid UTF-8.
    pub fn from_fs(root: &Path, path: &Path) -> Option<Self> {
        let rel = path.strip_prefix(root).ok()?;
        let mut segments = Vec::new();
        for component in rel.components() {
            match component {
                Component::Normal(s) => segments.push(s.to_str()?),
                Component::CurDir => {}
                _ => return None,
            }
        }
        if segments.is_empty() {
            return None;
        }
        Some(Self(segments.join("/")))
    }

    /// The path string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The final path segment.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl TryFrom<String> for RelativePath {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RelativePath> for String {
    fn from(value: RelativePath) -> Self {
        value.0
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::path::PathBuf;

    #[test]
    fn parse_accepts_nested_paths() {
        let p = RelativePath::parse("libraries/task_pool/a.yaml").unwrap();
        assert_eq!(p.file_name(), "a.yaml");
    }

    #[test]
    fn parse_rejects_non_normalized() {
        for bad in ["", "/abs", "a//b", "a/../b", "./a", "a\\b", "a/"] {
            assert!(RelativePath::parse(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn from_fs_uses_forward_slashes() {
        let root = PathBuf::from("/pack");
        let path = root.join("schemas").join("documents").join("x.schema.json");
        let rel = RelativePath::from_fs(&root, &path).unwrap();
        assert_eq!(rel.as_str(), "schemas/documents/x.schema.json");
    }

    #[test]
    fn from_fs_rejects_root_and_outside() {
        let root = PathBuf::from("/pack");
        assert!(RelativePath::from_fs(&root, &root).is_none());
        assert!(RelativePath::from_fs(&root, Path::new("/elsewhere/a")).is_none());
    }

    #[test]
    fn ordering_is_lexicographic() {
        let mut paths = vec![
            RelativePath::parse("b.yaml").unwrap(),
            RelativePath::parse("a/z.yaml").unwrap(),
            RelativePath::parse("a.yaml").unwrap(),
        ];
        paths.sort();
        let names: Vec<&str> = paths.iter().map(RelativePath::as_str).collect();
        assert_eq!(names, vec!["a.yaml", "a/z.yaml", "b.yaml"]);
    }

    proptest! {
        #[test]
        fn parse_round_trips_valid_segments(segs in proptest::collection::vec("[a-z0-9_]{1,8}", 1..5)) {
            let s = segs.join("/");
            let p = RelativePath::parse(&s).unwrap();
            prop_assert_eq!(p.as_str(), s.as_str());
            prop_assert_eq!(p.file_name(), segs[segs.len() - 1].as_str());
        }
    }
}
