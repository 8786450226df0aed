//! Database schema migrations for SQLite.
//!
//! Versioned migrations: each one transforms the schema from version N to
//! N+1 and is recorded in `schema_migrations`.

use rusqlite::Connection;
use tracing::debug;

use crate::error::{LedgerError, Result};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// Idempotent: safe to call on every open.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current > CURRENT_VERSION {
        return Err(LedgerError::Migration(format!(
            "database schema version {} is newer than supported version {}",
            current, CURRENT_VERSION
        )));
    }

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            debug!(version, "applying ledger migration");
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, crate::sqlite::now_millis()],
            )?;
        }

        tx.commit()?;
    }

    Ok(())
}

fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(LedgerError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: presence set and notification log.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Notification log: one row per digest that became present
        CREATE TABLE notifications (
            seq INTEGER PRIMARY KEY,          -- 1-based, gapless
            digest BLOB NOT NULL UNIQUE,      -- 32 bytes
            recorded_by BLOB NOT NULL,        -- 32 bytes, Ed25519 public key
            recorded_at INTEGER NOT NULL,     -- commit time (Unix ms)
            canonical_bytes BLOB NOT NULL     -- canonical CBOR of the notification
        );

        -- Presence set: membership by exact digest only
        CREATE TABLE digests (
            digest BLOB PRIMARY KEY,          -- 32 bytes
            first_seq INTEGER NOT NULL REFERENCES notifications(seq)
        ) WITHOUT ROWID;

        -- Append-only: history can never be rewritten
        CREATE TRIGGER digests_no_update BEFORE UPDATE ON digests
        BEGIN SELECT RAISE(ABORT, 'digests are append-only'); END;

        CREATE TRIGGER digests_no_delete BEFORE DELETE ON digests
        BEGIN SELECT RAISE(ABORT, 'digests are append-only'); END;

        CREATE TRIGGER notifications_no_update BEFORE UPDATE ON notifications
        BEGIN SELECT RAISE(ABORT, 'notifications are append-only'); END;

        CREATE TRIGGER notifications_no_delete BEFORE DELETE ON notifications
        BEGIN SELECT RAISE(ABORT, 'notifications are append-only'); END;
        "#,
    )?;

    Ok(())
}
