//! In-memory implementation of the Ledger trait.
//!
//! Same semantics as SQLite with no persistence. Used by tests and by
//! throwaway registries.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use rxproof_core::{CallerId, Digest, Notification};

use crate::error::{LedgerError, Result};
use crate::traits::{CommitOutcome, Ledger};

/// In-memory ledger.
///
/// All data is lost when dropped. Thread-safe via RwLock; the write lock
/// serializes commits.
#[derive(Default)]
pub struct MemoryLedger {
    inner: RwLock<MemoryLedgerInner>,
}

#[derive(Default)]
struct MemoryLedgerInner {
    /// Present digests -> index into `log`.
    present: HashMap<Digest, usize>,

    /// Notification log in commit order.
    log: Vec<Notification>,
}

impl MemoryLedger {
    /// Create a new empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryLedgerInner>> {
        self.inner
            .read()
            .map_err(|e| LedgerError::Poisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryLedgerInner>> {
        self.inner
            .write()
            .map_err(|e| LedgerError::Poisoned(e.to_string()))
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn commit_record(
        &self,
        digest: &Digest,
        caller: &CallerId,
        recorded_at: i64,
    ) -> Result<CommitOutcome> {
        let mut inner = self.write()?;

        if let Some(&idx) = inner.present.get(digest) {
            return Ok(CommitOutcome::AlreadyPresent {
                first: inner.log[idx].clone(),
            });
        }

        let seq = inner.log.len() as u64 + 1;
        let notification = Notification::new(seq, *digest, *caller, recorded_at);
        let idx = inner.log.len();
        inner.log.push(notification.clone());
        inner.present.insert(*digest, idx);

        Ok(CommitOutcome::Committed(notification))
    }

    async fn is_present(&self, digest: &Digest) -> Result<bool> {
        Ok(self.read()?.present.contains_key(digest))
    }

    async fn notifications_since(&self, after_seq: u64, limit: usize) -> Result<Vec<Notification>> {
        let inner = self.read()?;
        // seq n lives at index n - 1
        let start = usize::try_from(after_seq).unwrap_or(usize::MAX);
        Ok(inner.log.iter().skip(start).take(limit).cloned().collect())
    }

    async fn notification_count(&self) -> Result<u64> {
        Ok(self.read()?.log.len() as u64)
    }
}
