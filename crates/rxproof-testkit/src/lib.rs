//! # rxproof Testkit
//!
//! Testing utilities for rxproof.
//!
//! ## Overview
//!
//! - **Golden vectors**: known inputs with published digests, so any build
//!   can confirm it hashes exactly like every other
//! - **Generators**: proptest strategies for digests, identities, and files
//! - **Fixtures**: a registry, an identity, and a scratch directory in one
//!
//! ## Golden Vectors
//!
//! ```rust
//! use rxproof_testkit::vectors::verify_all_vectors;
//!
//! for (name, ok, hex) in verify_all_vectors() {
//!     assert!(ok, "{name}: got {hex}");
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use rxproof_testkit::fixtures::{sample_prescription, TestFixture};
//!
//! let fixture = TestFixture::new();
//! let path = fixture.write_file("rx.pdf", &sample_prescription("amoxicillin"));
//! assert!(path.exists());
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{flip_bit, multi_party_fixtures, sample_prescription, TestFixture};
pub use generators::{SubmissionParams, submission_from_params};
pub use vectors::{all_vectors, verify_all_vectors, GoldenVector};
