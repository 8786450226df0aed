//! Error types for the ledger module.

use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Stored notification failed to decode.
    #[error("serialization error: {0}")]
    Serialization(#[from] rxproof_core::CoreError),

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// A lock guarding ledger state was poisoned by a panicking writer.
    #[error("ledger lock poisoned: {0}")]
    Poisoned(String),

    /// Blocking task failed to complete.
    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
