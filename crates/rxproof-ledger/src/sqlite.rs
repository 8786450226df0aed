//! SQLite implementation of the Ledger trait.
//!
//! The durable backend for rxproof. Uses rusqlite with bundled SQLite,
//! wrapped in async via `tokio::task::spawn_blocking`. Every commit runs in
//! an immediate transaction, so presence and its notification land together
//! or not at all.
//!
//! File-backed ledgers keep a second, read-only connection. Under WAL a
//! reader sees the last committed snapshot, so queries never queue behind
//! a commit holding the writer.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, TransactionBehavior};
use tracing::debug;

use rxproof_core::{canonical_notification_bytes, decode_notification, CallerId, Digest, Notification};

use crate::error::{LedgerError, Result};
use crate::migration;
use crate::traits::{CommitOutcome, Ledger};

/// SQLite-based ledger.
///
/// Thread-safe via internal Mutexes. Operations run on the blocking pool.
#[derive(Clone)]
pub struct SqliteLedger {
    writer: Arc<Mutex<Connection>>,
    /// Same handle as `writer` for in-memory databases.
    reader: Arc<Mutex<Connection>>,
}

impl SqliteLedger {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut conn = Connection::open(path)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migration::migrate(&mut conn)?;

        let reader = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        debug!(path = %path.display(), "opened sqlite ledger");
        Ok(Self {
            writer: Arc::new(Mutex::new(conn)),
            reader: Arc::new(Mutex::new(reader)),
        })
    }

    /// Open an in-memory SQLite database.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migration::migrate(&mut conn)?;
        let conn = Arc::new(Mutex::new(conn));
        Ok(Self {
            writer: Arc::clone(&conn),
            reader: conn,
        })
    }

    /// Run `f` against the writer connection on the blocking pool.
    async fn with_writer<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        Self::run_blocking(Arc::clone(&self.writer), f).await
    }

    /// Run `f` against the read-only connection on the blocking pool.
    async fn with_reader<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        Self::run_blocking(Arc::clone(&self.reader), f).await
    }

    async fn run_blocking<F, T>(conn: Arc<Mutex<Connection>>, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| LedgerError::Poisoned(e.to_string()))?;
            f(&mut conn)
        })
        .await?
    }
}

/// Load the notification that made `digest` present, if any.
fn first_notification(conn: &Connection, digest: &Digest) -> Result<Option<Notification>> {
    let bytes: Option<Vec<u8>> = conn
        .query_row(
            "SELECT n.canonical_bytes FROM digests d
             JOIN notifications n ON n.seq = d.first_seq
             WHERE d.digest = ?1",
            params![digest.as_bytes().as_slice()],
            |row| row.get(0),
        )
        .optional()?;

    bytes
        .map(|b| decode_notification(&b).map_err(LedgerError::from))
        .transpose()
}

fn seq_to_sql(seq: u64) -> Result<i64> {
    i64::try_from(seq).map_err(|_| LedgerError::InvalidData(format!("seq {} out of range", seq)))
}

#[async_trait]
impl Ledger for SqliteLedger {
    async fn commit_record(
        &self,
        digest: &Digest,
        caller: &CallerId,
        recorded_at: i64,
    ) -> Result<CommitOutcome> {
        let digest = *digest;
        let caller = *caller;

        self.with_writer(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            if let Some(first) = first_notification(&tx, &digest)? {
                return Ok(CommitOutcome::AlreadyPresent { first });
            }

            let last: i64 = tx.query_row(
                "SELECT COALESCE(MAX(seq), 0) FROM notifications",
                [],
                |row| row.get(0),
            )?;
            let seq = u64::try_from(last)
                .map_err(|_| LedgerError::InvalidData(format!("negative seq {}", last)))?
                + 1;

            let notification = Notification::new(seq, digest, caller, recorded_at);
            let canonical = canonical_notification_bytes(&notification);

            tx.execute(
                "INSERT INTO notifications (seq, digest, recorded_by, recorded_at, canonical_bytes)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    seq_to_sql(seq)?,
                    digest.as_bytes().as_slice(),
                    caller.as_bytes().as_slice(),
                    recorded_at,
                    canonical,
                ],
            )?;
            tx.execute(
                "INSERT INTO digests (digest, first_seq) VALUES (?1, ?2)",
                params![digest.as_bytes().as_slice(), seq_to_sql(seq)?],
            )?;

            tx.commit()?;
            Ok(CommitOutcome::Committed(notification))
        })
        .await
    }

    async fn is_present(&self, digest: &Digest) -> Result<bool> {
        let digest = *digest;

        self.with_reader(move |conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM digests WHERE digest = ?1",
                    params![digest.as_bytes().as_slice()],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
        .await
    }

    async fn notifications_since(&self, after_seq: u64, limit: usize) -> Result<Vec<Notification>> {
        // Clamp both to SQLite's signed range.
        let after = i64::try_from(after_seq).unwrap_or(i64::MAX);
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        self.with_reader(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT canonical_bytes FROM notifications
                 WHERE seq > ?1
                 ORDER BY seq
                 LIMIT ?2",
            )?;

            let rows = stmt
                .query_map(params![after, limit], |row| row.get::<_, Vec<u8>>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            rows.iter()
                .map(|b| decode_notification(b).map_err(LedgerError::from))
                .collect()
        })
        .await
    }

    async fn notification_count(&self) -> Result<u64> {
        self.with_reader(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM notifications", [], |row| row.get(0))?;
            u64::try_from(count)
                .map_err(|_| LedgerError::InvalidData(format!("negative count {}", count)))
        })
        .await
    }
}

/// Get current time in milliseconds.
pub(crate) fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(b: u8) -> CallerId {
        CallerId::from_bytes([b; 32])
    }

    #[tokio::test]
    async fn test_commit_and_query() {
        let ledger = SqliteLedger::open_memory().unwrap();
        let digest = Digest::sha256(b"file A");

        assert!(!ledger.is_present(&digest).await.unwrap());

        let outcome = ledger.commit_record(&digest, &caller(1), 42).await.unwrap();
        assert_eq!(
            outcome,
            CommitOutcome::Committed(Notification::new(1, digest, caller(1), 42))
        );
        assert!(ledger.is_present(&digest).await.unwrap());
    }

    #[tokio::test]
    async fn test_idempotent_commit() {
        let ledger = SqliteLedger::open_memory().unwrap();
        let digest = Digest::sha256(b"file A");

        let first = ledger.commit_record(&digest, &caller(1), 10).await.unwrap();
        let second = ledger.commit_record(&digest, &caller(2), 20).await.unwrap();

        assert!(first.is_new());
        assert!(!second.is_new());
        assert_eq!(second.notification(), first.notification());
        assert_eq!(ledger.notification_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unknown_digest_is_absent() {
        let ledger = SqliteLedger::open_memory().unwrap();
        ledger
            .commit_record(&Digest::sha256(b"A"), &caller(1), 1)
            .await
            .unwrap();
        assert!(!ledger.is_present(&Digest::sha256(b"B")).await.unwrap());
        assert!(!ledger.is_present(&Digest::from_bytes([0; 32])).await.unwrap());
    }

    #[tokio::test]
    async fn test_notification_paging() {
        let ledger = SqliteLedger::open_memory().unwrap();
        for i in 0..4u8 {
            ledger
                .commit_record(&Digest::sha256(&[i]), &caller(i), i as i64)
                .await
                .unwrap();
        }

        let all = ledger.notifications_since(0, 100).await.unwrap();
        assert_eq!(all.len(), 4);
        assert!(all.windows(2).all(|w| w[0].seq + 1 == w[1].seq));

        let tail = ledger.notifications_since(3, 100).await.unwrap();
        assert_eq!(tail.len(), 1);
        assert_eq!(tail[0].digest, Digest::sha256(&[3]));
        assert!(ledger.notifications_since(u64::MAX, 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.db");
        let digest = Digest::sha256(b"durable");

        {
            let ledger = SqliteLedger::open(&path).unwrap();
            ledger.commit_record(&digest, &caller(7), 99).await.unwrap();
        }

        let reopened = SqliteLedger::open(&path).unwrap();
        assert!(reopened.is_present(&digest).await.unwrap());
        let log = reopened.notifications_since(0, 10).await.unwrap();
        assert_eq!(log[0].recorded_by, caller(7));
        assert_eq!(log[0].recorded_at, 99);
    }

    #[tokio::test]
    async fn test_concurrent_commits_of_same_digest() {
        let ledger = SqliteLedger::open_memory().unwrap();
        let digest = Digest::sha256(b"race");

        let mut handles = Vec::new();
        for i in 0..8u8 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move {
                ledger.commit_record(&digest, &caller(i), i as i64).await
            }));
        }

        let mut committed = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap().is_new() {
                committed += 1;
            }
        }

        assert_eq!(committed, 1);
        assert_eq!(ledger.notification_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_reads_do_not_wait_for_writer() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = SqliteLedger::open(dir.path().join("ledger.db")).unwrap();
        let digest = Digest::sha256(b"busy");
        ledger.commit_record(&digest, &caller(1), 1).await.unwrap();

        let _held = ledger.writer.lock().unwrap();
        let present = tokio::time::timeout(
            std::time::Duration::from_secs(2),
            ledger.is_present(&digest),
        )
        .await
        .expect("read blocked behind writer")
        .unwrap();
        assert!(present);

        let count = tokio::time::timeout(
            std::time::Duration::from_secs(2),
            ledger.notification_count(),
        )
        .await
        .expect("read blocked behind writer")
        .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_reader_sees_each_commit() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = SqliteLedger::open(dir.path().join("ledger.db")).unwrap();

        for i in 0..3u8 {
            let digest = Digest::sha256(&[i]);
            assert!(!ledger.is_present(&digest).await.unwrap());
            ledger.commit_record(&digest, &caller(i), i as i64).await.unwrap();
            assert!(ledger.is_present(&digest).await.unwrap());
            assert_eq!(ledger.notification_count().await.unwrap(), u64::from(i) + 1);
        }
        assert_eq!(ledger.notifications_since(1, 10).await.unwrap().len(), 2);
    }

    mod props {
        use super::*;
        use crate::memory::MemoryLedger;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(32))]

            #[test]
            fn backends_agree(picks in prop::collection::vec(0u8..8, 1..24)) {
                let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
                rt.block_on(async {
                    let sqlite = SqliteLedger::open_memory().unwrap();
                    let memory = MemoryLedger::new();

                    for (i, pick) in picks.iter().enumerate() {
                        let digest = Digest::sha256(&[*pick]);
                        let a = sqlite.commit_record(&digest, &caller(*pick), i as i64).await.unwrap();
                        let b = memory.commit_record(&digest, &caller(*pick), i as i64).await.unwrap();
                        prop_assert_eq!(a, b);
                    }

                    prop_assert_eq!(
                        sqlite.notifications_since(0, 100).await.unwrap(),
                        memory.notifications_since(0, 100).await.unwrap()
                    );
                    Ok::<(), TestCaseError>(())
                })?;
            }
        }
    }
}
