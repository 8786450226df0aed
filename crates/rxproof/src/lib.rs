//! # rxproof
//!
//! Fingerprint a document and record or verify that fingerprint against an
//! append-only presence registry.
//!
//! ## Overview
//!
//! - **Digest Producer**: file bytes in, 32-byte digest out. Deterministic,
//!   bounded, and the only place content is hashed.
//! - **Registry**: remembers which digests have been recorded. `record` is
//!   idempotent, `is_recorded` is a pure read, and each new record emits one
//!   notification.
//! - **Client**: holds an identity, fingerprints files, signs submissions.
//!
//! Only digests cross the client boundary. A record proves that some caller
//! saw this exact content; it does not prove who authored it.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use rxproof::{Client, DigestProducer, Registry, RegistryConfig};
//! use rxproof::core::Keypair;
//! use rxproof::ledger::SqliteLedger;
//!
//! async fn example() {
//!     let ledger = SqliteLedger::open("rxproof.db").unwrap();
//!     let registry = Arc::new(Registry::new(ledger, RegistryConfig::default()));
//!     let client = Client::new(Keypair::generate(), registry, DigestProducer::default());
//!
//!     client.record_file("prescription.pdf").await.unwrap();
//!     assert!(client.verify_file("prescription.pdf").await.unwrap().recorded);
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `rxproof::core` - digests, identities, submissions, notifications
//! - `rxproof::ledger` - ledger trait with SQLite and in-memory backends

pub mod client;
pub mod config;
pub mod error;
pub mod producer;
pub mod registry;
pub mod upload;

pub use rxproof_core as core;
pub use rxproof_ledger as ledger;

pub use client::{fingerprint_file, Client, Verification};
pub use config::{ConfigError, RxConfig};
pub use error::{ClientError, InputError, RegistryError, Result};
pub use producer::{DigestProducer, DEFAULT_MAX_BYTES};
pub use registry::{
    RecordReceipt, RecordStatus, Registry, RegistryConfig, DEFAULT_NOTIFY_CAPACITY,
    MAX_NOTIFY_CAPACITY,
};
pub use upload::UploadPolicy;

pub use rxproof_core::{CallerId, Digest, DigestAlgorithm, Keypair, Notification, Submission};
