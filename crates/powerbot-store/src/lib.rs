//! Embedded relational storage shared by every component: connection
//! opening, idempotent schema migration hook, and the `begin_immediate`
//! transaction primitive that serializes Identity/Economy writes.

pub mod error;

use std::path::Path;

use rusqlite::{Connection, TransactionBehavior};

pub use error::{Result, StoreError};

/// Opens (creating if absent) the embedded database at `path`. Fails with
/// `NotWritable` if the parent directory doesn't exist and can't be
/// created — that's a fatal error for the calling worker.
pub fn open(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| StoreError::NotWritable(format!("{}: {e}", parent.display())))?;
    }
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

/// Opens an in-memory database, used by every component's unit tests.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

/// Runs `body` inside a `BEGIN IMMEDIATE` transaction: the write lock is
/// acquired up front rather than on first write, so two concurrent callers
/// never interleave a multi-statement mutation. On any `Err` the
/// transaction rolls back and none of `body`'s effects are visible.
///
/// This layer does not retry on `SQLITE_BUSY` (§4.1) — callers see
/// `StoreError::StorageBusy` (wrapped into their own error type) and decide
/// whether to retry.
///
/// Generic over the caller's error type `E` rather than fixed to
/// `StoreError`, so a component's own fallible operations (`EconomyError`,
/// `IdentityError`, ...) can run as `body` directly without an intermediate
/// mapping step.
pub fn begin_immediate<T, E, F>(conn: &mut Connection, body: F) -> std::result::Result<T, E>
where
    E: From<StoreError>,
    F: FnOnce(&rusqlite::Transaction) -> std::result::Result<T, E>,
{
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|e| match e {
            rusqlite::Error::SqliteFailure(err, _) if err.code == rusqlite::ErrorCode::DatabaseBusy => {
                StoreError::StorageBusy("begin_immediate".to_string())
            }
            other => StoreError::Database(other),
        })
        .map_err(E::from)?;
    let result = body(&tx)?;
    tx.commit().map_err(StoreError::from).map_err(E::from)?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_immediate_commits_on_success() {
        let mut conn = open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (v INTEGER)").unwrap();
        begin_immediate(&mut conn, |tx| {
            tx.execute("INSERT INTO t (v) VALUES (1)", [])?;
            Ok(())
        })
        .unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM t", [], |r| r.get(0)).unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn begin_immediate_rolls_back_on_error() {
        let mut conn = open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (v INTEGER)").unwrap();
        let result = begin_immediate(&mut conn, |tx| {
            tx.execute("INSERT INTO t (v) VALUES (1)", [])?;
            Err::<(), _>(StoreError::StorageBusy("forced".to_string()))
        });
        assert!(result.is_err());
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM t", [], |r| r.get(0)).unwrap();
        assert_eq!(count, 0);
    }
}
