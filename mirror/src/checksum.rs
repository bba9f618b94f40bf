//! MD5 digests and the "already mirrored" check.
//!
//! The forge publishes an MD5 hex digest for every release archive. A local
//! file counts as mirrored when it exists and hashes to that digest; there is
//! no separate index, so the check re-reads the whole file on every run.

use camino::Utf8Path;
use log::{debug, trace};
use md5::{Digest, Md5};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::io::{self, Read};
use std::path::Path;

/// Expected length of a hex-encoded MD5 digest.
const DIGEST_HEX_LEN: usize = 32;

/// Errors arising from invalid digest strings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DigestError {
    /// The value is not a 32-character hexadecimal string.
    #[error("invalid MD5 digest \"{value}\": {reason}")]
    InvalidMd5 {
        /// The rejected digest string.
        value: String,
        /// Description of the validation failure.
        reason: String,
    },
}

/// A validated, lowercase hex-encoded MD5 digest.
///
/// Uppercase input is accepted and normalised, so comparisons between
/// digests are case-insensitive with respect to the original strings.
///
/// # Examples
///
/// ```
/// use forge_mirror::checksum::Md5Digest;
///
/// let digest = Md5Digest::try_from("D41D8CD98F00B204E9800998ECF8427E").unwrap();
/// assert_eq!(digest.as_str(), "d41d8cd98f00b204e9800998ecf8427e");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Md5Digest(String);

impl Md5Digest {
    /// Compute the digest of an in-memory buffer.
    #[must_use]
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self(format!("{:x}", Md5::digest(bytes)))
    }

    /// Return the digest as a lowercase hex string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for Md5Digest {
    type Error = DigestError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        validate_md5(value)?;
        Ok(Self(value.to_ascii_lowercase()))
    }
}

impl TryFrom<String> for Md5Digest {
    type Error = DigestError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl AsRef<str> for Md5Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Md5Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn validate_md5(value: &str) -> Result<(), DigestError> {
    if value.len() != DIGEST_HEX_LEN {
        return Err(DigestError::InvalidMd5 {
            value: value.to_owned(),
            reason: format!(
                "expected {DIGEST_HEX_LEN} hex characters, got {}",
                value.len()
            ),
        });
    }
    if let Some(bad) = value.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(DigestError::InvalidMd5 {
            value: value.to_owned(),
            reason: format!("non-hex character '{bad}'"),
        });
    }
    Ok(())
}

/// Compute the MD5 digest of a file, reading it in chunks.
///
/// # Errors
///
/// Returns the underlying I/O error if the file cannot be opened or read.
pub fn compute_md5(path: &Path) -> io::Result<Md5Digest> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Md5::new();
    let mut buffer = [0u8; 8192];
    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }
    Ok(Md5Digest(format!("{:x}", hasher.finalize())))
}

/// Decide whether the artifact at `path` is already mirrored.
///
/// Returns `true` only when the file exists, can be read, and its MD5 digest
/// equals `expected`. Any other state means the caller should download.
#[must_use]
pub fn should_skip(path: &Utf8Path, expected: &Md5Digest) -> bool {
    match compute_md5(path.as_std_path()) {
        Ok(actual) if actual == *expected => {
            trace!("{path} matches {expected}");
            true
        }
        Ok(actual) => {
            debug!("{path} has digest {actual}, forge publishes {expected}");
            false
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => false,
        Err(err) => {
            debug!("cannot hash {path}: {err}");
            false
        }
    }
}
