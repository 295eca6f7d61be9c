//! The expansion engine: candidate in, lazy sequence of variants out.
//!
//! Two strategies exist because two downstream uses exist:
//!
//! - [`Permutations`] (the default) yields every distinct linear
//!   arrangement of the input byte multiset, each exactly once. The byte
//!   multiset of every output equals the input's — repeated values are
//!   never collapsed or dropped.
//! - [`Substitutions`] yields single-position near-variants: for each
//!   cursor position, every other position overwritten with the cursor's
//!   value. Outputs generally do *not* preserve the multiset.
//!
//! Both are finite, deterministic, and allocation-per-item: each yielded
//! [`Candidate`] is a fresh buffer, independent of the source and of every
//! other output.

use serde::{Deserialize, Serialize};

use crate::candidate::Candidate;

/// Which expansion strategy the worker runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpandMode {
    /// Full permutation expansion (every distinct rearrangement).
    #[default]
    Permute,
    /// Single-position substitution producing near-variants.
    Substitute,
}

/// Expand a candidate with the given mode.
pub fn expand(candidate: &Candidate, mode: ExpandMode) -> Expansion {
    match mode {
        ExpandMode::Permute => Expansion::Permute(permutations(candidate)),
        ExpandMode::Substitute => Expansion::Substitute(substitutions(candidate)),
    }
}

/// A mode-selected expansion in progress.
pub enum Expansion {
    Permute(Permutations),
    Substitute(Substitutions),
}

impl Iterator for Expansion {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        match self {
            Expansion::Permute(inner) => inner.next(),
            Expansion::Substitute(inner) => inner.next(),
        }
    }
}

/// Lazy iterator over every distinct arrangement of a candidate's bytes.
///
/// Walks arrangements in lexicographic order starting from the sorted
/// input, advancing with the classic successor step. Selecting the next
/// head by position (never by value equality) is what keeps repeated
/// bytes present in every output; collapsing "remaining" elements by
/// value would silently shrink the combinatorial space.
///
/// Yields exactly `n! / (m_1! * m_2! * ...)` items, where `m_i` are the
/// multiplicities of the distinct byte values. An empty input yields
/// exactly one empty arrangement.
pub struct Permutations {
    current: Vec<u8>,
    exhausted: bool,
}

/// Expand a candidate into all of its distinct rearrangements.
///
/// Re-invoking with the same input produces the same sequence.
pub fn permutations(candidate: &Candidate) -> Permutations {
    let mut current = candidate.as_slice().to_vec();
    current.sort_unstable();
    Permutations {
        current,
        exhausted: false,
    }
}

impl Iterator for Permutations {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        if self.exhausted {
            return None;
        }
        let out = Candidate::from_rearranged(self.current.clone());
        if !next_arrangement(&mut self.current) {
            self.exhausted = true;
        }
        Some(out)
    }
}

/// Advance `buf` to its lexicographic successor in place.
///
/// Returns false when `buf` is already the final (non-increasing)
/// arrangement.
fn next_arrangement(buf: &mut [u8]) -> bool {
    if buf.len() < 2 {
        return false;
    }
    // Rightmost ascent: buf[pivot] < buf[pivot + 1].
    let mut pivot = buf.len() - 1;
    while pivot > 0 && buf[pivot - 1] >= buf[pivot] {
        pivot -= 1;
    }
    if pivot == 0 {
        return false;
    }
    let pivot = pivot - 1;
    // Smallest element right of the pivot that is still larger than it.
    let mut swap = buf.len() - 1;
    while buf[swap] <= buf[pivot] {
        swap -= 1;
    }
    buf.swap(pivot, swap);
    buf[pivot + 1..].reverse();
    true
}

/// Lazy iterator over single-position substitutions of a candidate.
///
/// For each cursor position, every position holding a *different* value
/// is overwritten with the cursor's value in a fresh copy of the source.
pub struct Substitutions {
    source: Vec<u8>,
    cursor: usize,
    pos: usize,
}

/// Expand a candidate into its single-position near-variants.
pub fn substitutions(candidate: &Candidate) -> Substitutions {
    Substitutions {
        source: candidate.as_slice().to_vec(),
        cursor: 0,
        pos: 0,
    }
}

impl Iterator for Substitutions {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        let n = self.source.len();
        while self.cursor < n {
            if self.pos >= n {
                self.pos = 0;
                self.cursor += 1;
                continue;
            }
            let pos = self.pos;
            self.pos += 1;
            if self.source[pos] != self.source[self.cursor] {
                let mut variant = self.source.clone();
                variant[pos] = self.source[self.cursor];
                return Some(Candidate::from_rearranged(variant));
            }
        }
        None
    }
}

/// Count the distinct linear arrangements of a byte multiset.
///
/// Multinomial coefficient `n! / (m_1! * m_2! * ...)`. Exact for all
/// lengths up to [`Candidate::MAX_LEN`] (32! < 2^128).
pub fn distinct_arrangements(bytes: &[u8]) -> u128 {
    let mut counts = [0u32; 256];
    for &b in bytes {
        counts[b as usize] += 1;
    }
    let mut total = factorial(bytes.len() as u32);
    for count in counts {
        if count > 1 {
            total /= factorial(count);
        }
    }
    total
}

fn factorial(n: u32) -> u128 {
    (1..=u128::from(n)).product()
}
