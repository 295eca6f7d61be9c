//! Proptest generators for property-based testing.

use proptest::prelude::*;

use permutor_core::Candidate;

/// Generate candidate payload bytes up to the given length.
pub fn candidate_bytes(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len.min(Candidate::MAX_LEN))
}

/// Generate a candidate of any supported length.
pub fn candidate() -> impl Strategy<Value = Candidate> {
    candidate_bytes(Candidate::MAX_LEN)
        .prop_map(|bytes| Candidate::new(bytes).expect("length bounded by strategy"))
}

/// Generate a candidate small enough to fully expand in a test.
///
/// Length is capped at 6 (720 arrangements worst case).
pub fn small_candidate() -> impl Strategy<Value = Candidate> {
    candidate_bytes(6)
        .prop_map(|bytes| Candidate::new(bytes).expect("length bounded by strategy"))
}

/// Generate a stream name.
pub fn stream_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,31}".prop_map(String::from)
}
