//! Error types for rxproof core.

use thiserror::Error;

/// Core errors that can occur while handling digests and submissions.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    #[error("unknown digest algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("decoding error: {0}")]
    DecodingError(String),
}
