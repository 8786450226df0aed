//! Ledger trait: the abstract interface for presence persistence.
//!
//! The registry is storage-agnostic. Backends include SQLite (durable) and
//! in-memory (tests). All ordering and atomicity come from the backend.

use std::sync::Arc;

use async_trait::async_trait;
use rxproof_core::{CallerId, Digest, Notification};

use crate::error::Result;

/// Result of committing a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The digest was absent and is now present.
    Committed(Notification),
    /// The digest was already present; nothing changed.
    AlreadyPresent {
        /// The notification from the commit that made it present.
        first: Notification,
    },
}

impl CommitOutcome {
    /// The notification for the first commit of this digest.
    pub fn notification(&self) -> &Notification {
        match self {
            CommitOutcome::Committed(n) => n,
            CommitOutcome::AlreadyPresent { first } => first,
        }
    }

    /// Whether this call changed ledger state.
    pub fn is_new(&self) -> bool {
        matches!(self, CommitOutcome::Committed(_))
    }
}

/// The Ledger trait: async interface for presence persistence.
///
/// # Design Notes
///
/// - **Atomic**: `commit_record` either makes the digest present and appends
///   its notification, or changes nothing.
/// - **Idempotent**: committing a present digest returns `AlreadyPresent`.
/// - **Serialized**: concurrent commits of the same digest resolve to one
///   `Committed` and any number of `AlreadyPresent`.
/// - **Total reads**: `is_present` answers `false` for any unknown digest.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Mark `digest` present on behalf of `caller` at time `recorded_at` (Unix ms).
    async fn commit_record(
        &self,
        digest: &Digest,
        caller: &CallerId,
        recorded_at: i64,
    ) -> Result<CommitOutcome>;

    /// Whether `digest` has ever been committed.
    async fn is_present(&self, digest: &Digest) -> Result<bool>;

    /// Notifications with `seq > after_seq`, ascending, at most `limit`.
    async fn notifications_since(&self, after_seq: u64, limit: usize) -> Result<Vec<Notification>>;

    /// Total number of notifications (equals the number of present digests).
    async fn notification_count(&self) -> Result<u64>;
}

#[async_trait]
impl<L: Ledger + ?Sized> Ledger for Arc<L> {
    async fn commit_record(
        &self,
        digest: &Digest,
        caller: &CallerId,
        recorded_at: i64,
    ) -> Result<CommitOutcome> {
        (**self).commit_record(digest, caller, recorded_at).await
    }

    async fn is_present(&self, digest: &Digest) -> Result<bool> {
        (**self).is_present(digest).await
    }

    async fn notifications_since(&self, after_seq: u64, limit: usize) -> Result<Vec<Notification>> {
        (**self).notifications_since(after_seq, limit).await
    }

    async fn notification_count(&self) -> Result<u64> {
        (**self).notification_count().await
    }
}
