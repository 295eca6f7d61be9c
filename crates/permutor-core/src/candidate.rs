//! The candidate type: a bounded byte sequence awaiting expansion.
//!
//! Candidates are immutable once constructed. Every rearrangement the
//! engine derives from one is a fresh, independent buffer.

use std::fmt;

use bytes::Bytes;

use crate::error::{CoreError, Result};

/// A bounded-length byte sequence being expanded into rearrangements.
///
/// Lengths up to [`Candidate::MAX_LEN`] are accepted, including zero.
/// The bound keeps the permutation fan-out representable: the arrangement
/// count of a 32-byte candidate still fits in a `u128`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Candidate(Vec<u8>);

impl Candidate {
    /// Maximum supported candidate length in bytes.
    pub const MAX_LEN: usize = 32;

    /// Create a candidate from raw bytes.
    ///
    /// Returns [`CoreError::CandidateTooLong`] if the input exceeds
    /// [`Candidate::MAX_LEN`].
    pub fn new(bytes: Vec<u8>) -> Result<Self> {
        if bytes.len() > Self::MAX_LEN {
            return Err(CoreError::CandidateTooLong {
                len: bytes.len(),
                max: Self::MAX_LEN,
            });
        }
        Ok(Self(bytes))
    }

    /// Construct without a length check.
    ///
    /// Only for engine output, which always preserves the input length.
    pub(crate) fn from_rearranged(bytes: Vec<u8>) -> Self {
        debug_assert!(bytes.len() <= Self::MAX_LEN);
        Self(bytes)
    }

    /// The candidate's bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Number of bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the candidate is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume into a payload buffer for publishing.
    pub fn into_bytes(self) -> Bytes {
        Bytes::from(self.0)
    }

    /// Hex rendering, used in logs and progress events.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Debug for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Candidate({})", self.to_hex())
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl AsRef<[u8]> for Candidate {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<&[u8]> for Candidate {
    type Error = CoreError;

    fn try_from(slice: &[u8]) -> Result<Self> {
        Self::new(slice.to_vec())
    }
}
