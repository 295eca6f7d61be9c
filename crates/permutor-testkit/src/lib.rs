//! # Permutor Testkit
//!
//! Testing utilities for permutor.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Generators**: Proptest strategies for candidates and stream names
//! - **Fixtures**: Helpers for setting up seeded in-memory queues
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use permutor_testkit::generators::small_candidate;
//!
//! proptest! {
//!     #[test]
//!     fn expansion_is_finite(candidate in small_candidate()) {
//!         let _ = permutor_core::permutations(&candidate).count();
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use permutor_testkit::fixtures::QueueFixture;
//!
//! async fn example() {
//!     let fixture = QueueFixture::new("candidates");
//!     let _ids = fixture.seed(&[&[1, 2, 3]]).await;
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::QueueFixture;
pub use generators::{candidate, candidate_bytes, small_candidate, stream_name};
