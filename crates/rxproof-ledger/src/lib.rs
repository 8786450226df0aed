//! # rxproof Ledger
//!
//! Durable, ordered storage for the presence registry. The [`Ledger`] trait
//! is the registry's execution substrate: it commits presence and the
//! matching notification as one atomic unit, and answers presence queries.
//!
//! ## Key Types
//!
//! - [`Ledger`] - The async trait every backend implements
//! - [`SqliteLedger`] - SQLite-based persistent ledger
//! - [`MemoryLedger`] - In-memory ledger for tests
//! - [`CommitOutcome`] - Whether a commit changed state
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rxproof_core::{CallerId, Digest};
//! use rxproof_ledger::{CommitOutcome, Ledger, SqliteLedger};
//!
//! async fn example() {
//!     let ledger = SqliteLedger::open("rxproof.db").unwrap();
//!     let digest = Digest::sha256(b"prescription bytes");
//!     let caller = CallerId::from_bytes([0x01; 32]);
//!
//!     let outcome = ledger.commit_record(&digest, &caller, 1_700_000_000_000).await.unwrap();
//!     assert!(matches!(outcome, CommitOutcome::Committed(_)));
//!     assert!(ledger.is_present(&digest).await.unwrap());
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Append-only**: no backend exposes update or delete; SQLite enforces it with triggers
//! - **Idempotent commits**: a second commit of a present digest returns `AlreadyPresent`
//! - **No enumeration**: digests can be tested, never listed, through the presence API
//! - **Audit log**: notifications are readable in sequence order for indexers

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{LedgerError, Result};
pub use memory::MemoryLedger;
pub use sqlite::SqliteLedger;
pub use traits::{CommitOutcome, Ledger};
