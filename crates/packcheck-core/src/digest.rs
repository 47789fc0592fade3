//! # Content Digest — File Fingerprints
//!
//! Defines `DigestAlgorithm` and `HexDigest`, and the SHA-256 primitives
//! used to fingerprint every file in a pack.
//!
//! ## Streaming Invariant
//!
//! File digests are computed over bounded reads of [`CHUNK_SIZE`] bytes.
//! A single file's digest is always computed by one reader from start to
//! end; it is never split across workers.

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Read size used when streaming file contents into the hasher.
pub const CHUNK_SIZE: usize = 1024 * 1024;

/// The hash algorithm recorded in a manifest.
///
/// Packs currently use SHA-256 exclusively. The tag is still carried in
/// the manifest so that a future algorithm is detected instead of silently
/// compared against SHA-256 output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// SHA-256, rendered as 64 lowercase hex characters.
    Sha256,
}

impl DigestAlgorithm {
    /// Returns the algorithm identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A SHA-256 digest rendered as hex.
///
/// The recorded spelling is preserved for reporting; equality via
/// [`HexDigest::matches`] is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexDigest(String);

impl HexDigest {
    /// Parse a hex digest, accepting upper or lower case.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem if the string is not exactly
    /// 64 hex characters.
    pub fn parse(s: &str) -> Result<Self, String> {
        if s.len() != 64 {
            return Err(format!(
                "sha256 digest must be 64 hex characters, got {} characters",
                s.len()
            ));
        }
        if !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("sha256 digest contains non-hex characters: {s:?}"));
        }
        Ok(Self(s.to_string()))
    }

    fn from_bytes(bytes: &[u8]) -> Self {
        Self(bytes.iter().map(|b| format!("{b:02x}")).collect())
    }

    /// The digest as recorded.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison of two digests.
    pub fn matches(&self, other: &HexDigest) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl TryFrom<String> for HexDigest {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<HexDigest> for String {
    fn from(value: HexDigest) -> Self {
        value.0
    }
}

impl fmt::Display for HexDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// SHA-256 of an in-memory byte slice.
pub fn sha256_bytes(data: &[u8]) -> HexDigest {
    HexDigest::from_bytes(&Sha256::digest(data))
}

/// SHA-256 of everything a reader yields, plus the number of bytes read.
///
/// Reads in [`CHUNK_SIZE`] pieces; memory use does not grow with input size.
pub fn sha256_reader<R: Read>(mut reader: R) -> io::Result<(HexDigest, u64)> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut total: u64 = 0;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
        total += n as u64;
    }
    Ok((HexDigest::from_bytes(&hasher.finalize()), total))
}

/// SHA-256 and byte size of a file on disk.
///
/// # Errors
///
/// Propagates any I/O error from opening or reading the file.
pub fn sha256_file(path: &Path) -> io::Result<(HexDigest, u64)> {
    let file = File::open(path)?;
    sha256_reader(file)
}
