//! Release size policy.

use crate::release::ReleaseRecord;
use std::fmt;

/// Number of bytes in one megabyte as used by `--max-size`.
pub const BYTES_PER_MEGABYTE: u64 = 1_048_576;

/// Default `--max-size` in megabytes.
pub const DEFAULT_MAX_SIZE_MB: u64 = 20;

/// Accepts releases whose published size does not exceed a limit.
///
/// # Examples
///
/// ```
/// use forge_mirror::filter::SizePolicy;
///
/// let policy = SizePolicy::from_megabytes(20).expect("no overflow");
/// assert_eq!(policy.max_size_bytes(), 20 * 1_048_576);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizePolicy {
    max_size_bytes: u64,
}

impl SizePolicy {
    /// Create a policy with an exact byte limit.
    #[must_use]
    pub const fn new(max_size_bytes: u64) -> Self {
        Self { max_size_bytes }
    }

    /// Create a policy from a megabyte count, or `None` if the byte limit
    /// would overflow.
    #[must_use]
    pub const fn from_megabytes(megabytes: u64) -> Option<Self> {
        match megabytes.checked_mul(BYTES_PER_MEGABYTE) {
            Some(max_size_bytes) => Some(Self { max_size_bytes }),
            None => None,
        }
    }

    /// The largest accepted `file_size`.
    #[must_use]
    pub const fn max_size_bytes(&self) -> u64 {
        self.max_size_bytes
    }

    /// Return whether `record` may be mirrored under this policy.
    #[must_use]
    pub const fn accept(&self, record: &ReleaseRecord) -> bool {
        self.accepts_size(record.file_size())
    }

    /// Return whether an artifact of `file_size` bytes is within the limit.
    #[must_use]
    pub const fn accepts_size(&self, file_size: u64) -> bool {
        file_size <= self.max_size_bytes
    }
}

impl Default for SizePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SIZE_MB * BYTES_PER_MEGABYTE)
    }
}

impl fmt::Display for SizePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "releases up to {} bytes", self.max_size_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn default_is_twenty_megabytes() {
        assert_eq!(SizePolicy::default().max_size_bytes(), 20_971_520);
    }

    #[rstest]
    #[case::well_under(0, true)]
    #[case::exactly_at_limit(BYTES_PER_MEGABYTE, true)]
    #[case::one_byte_over(BYTES_PER_MEGABYTE + 1, false)]
    fn size_boundary(#[case] file_size: u64, #[case] accepted: bool) {
        let policy = SizePolicy::from_megabytes(1).expect("no overflow");
        assert_eq!(policy.accepts_size(file_size), accepted);
    }

    #[test]
    fn zero_megabytes_only_accepts_empty_archives() {
        let policy = SizePolicy::from_megabytes(0).expect("no overflow");
        assert!(policy.accepts_size(0));
        assert!(!policy.accepts_size(1));
    }

    #[test]
    fn overflowing_megabytes_are_rejected() {
        assert_eq!(SizePolicy::from_megabytes(u64::MAX), None);
    }
}
