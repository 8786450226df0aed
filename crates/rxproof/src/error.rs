//! Error types for the registry and client.

use rxproof_core::{CallerId, Capability};
use rxproof_ledger::LedgerError;
use thiserror::Error;

/// Input rejected before hashing. Never reaches the registry.
#[derive(Debug, Error)]
pub enum InputError {
    /// The file could not be opened or read.
    #[error("cannot read input: {0}")]
    Unreadable(#[from] std::io::Error),

    /// The path exists but is not a regular file.
    #[error("not a regular file: {0}")]
    NotAFile(String),

    /// The input exceeds the size bound.
    #[error("input exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },

    /// The sniffed content type is not on the allow-list.
    #[error("content type {0} is not accepted")]
    UnsupportedType(String),
}

/// Errors surfaced by [`crate::Registry`].
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A `record` call did not commit. No state changed; retrying with the
    /// same digest is safe.
    #[error("submission rejected: {reason}")]
    SubmissionRejected { reason: String },

    /// The access policy does not grant this capability.
    #[error("{capability:?} not permitted for {caller}")]
    NotPermitted {
        caller: String,
        capability: Capability,
    },

    /// The ledger failed while answering a read.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

impl RegistryError {
    pub(crate) fn not_permitted(caller: Option<&CallerId>, capability: Capability) -> Self {
        RegistryError::NotPermitted {
            caller: caller
                .map(|c| c.to_hex())
                .unwrap_or_else(|| "anonymous caller".to_string()),
            capability,
        }
    }
}

/// Errors surfaced by [`crate::Client`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// The file was rejected before hashing.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputError),

    /// The record was not committed. Verification was not recorded; the
    /// same file may be submitted again.
    #[error("submission rejected: {reason}")]
    SubmissionRejected { reason: String },

    /// A read against the registry failed.
    #[error("registry error: {0}")]
    Registry(RegistryError),
}

impl From<RegistryError> for ClientError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::SubmissionRejected { reason } => ClientError::SubmissionRejected { reason },
            other => ClientError::Registry(other),
        }
    }
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
