//! # Permutor Core
//!
//! Pure primitives for permutor: candidates and the expansion engine.
//!
//! This crate contains no I/O and no state beyond its inputs. It is pure
//! computation over byte sequences.
//!
//! ## Key Types
//!
//! - [`Candidate`] - A bounded byte sequence being expanded
//! - [`ExpandMode`] - Which expansion strategy to run
//! - [`Permutations`] - Lazy iterator over every distinct rearrangement
//! - [`Substitutions`] - Lazy iterator over single-position near-variants
//!
//! ## Expansion
//!
//! ```rust
//! use permutor_core::{expand, Candidate, ExpandMode};
//!
//! let candidate = Candidate::new(vec![1, 2, 3]).unwrap();
//! let outputs: Vec<Candidate> = expand(&candidate, ExpandMode::Permute).collect();
//! assert_eq!(outputs.len(), 6);
//! ```

pub mod candidate;
pub mod engine;
pub mod error;

pub use candidate::Candidate;
pub use engine::{
    distinct_arrangements, expand, permutations, substitutions, Expansion, ExpandMode,
    Permutations, Substitutions,
};
pub use error::CoreError;
