//! # rxproof Core
//!
//! Pure primitives for rxproof: document digests, caller identities, signed
//! record submissions, and the notifications a registry emits.
//!
//! This crate contains no I/O, no storage, no networking. Everything here is
//! deterministic computation over fixed-length byte values.
//!
//! ## Key Types
//!
//! - [`Digest`] - 32-byte fingerprint of a document, the registry key
//! - [`DigestAlgorithm`] - Which hash function produced a digest
//! - [`CallerId`] - Ed25519 public key of whoever submits a record
//! - [`Submission`] - A signed request to record a digest
//! - [`Notification`] - Audit record emitted when a digest is first recorded
//! - [`AccessPolicy`] - Capability set governing who may call what
//!
//! ## Canonicalization
//!
//! Notifications are encoded using deterministic CBOR. See [`canonical`] module.

pub mod canonical;
pub mod crypto;
pub mod digest;
pub mod error;
pub mod notification;
pub mod policy;
pub mod submission;

pub use canonical::{canonical_notification_bytes, decode_notification};
pub use crypto::{CallerId, Keypair, Signature};
pub use digest::{Digest, DigestAlgorithm, DigestHasher};
pub use error::CoreError;
pub use notification::Notification;
pub use policy::{AccessPolicy, Capability, Principal, Rule};
pub use submission::{Submission, RECORD_DOMAIN};
