//! Database handle and engine error translation.
//!
//! The store runs on SQLite through a single shared connection guarded by a
//! mutex. Every engine-native error is translated into the [`StoreError`]
//! taxonomy here; nothing above this module sees `rusqlite` error types.

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::{Connection, Transaction};

use flightctl_core::{Result, StoreError};

/// Shared handle to the relational store.
///
/// Cloning is cheap; all clones share one connection. Callers never hold the
/// connection across await points because every store operation is
/// synchronous and releases the lock before returning.
#[derive(Clone)]
pub struct Db {
    conn: Arc<Mutex<Connection>>,
}

impl Db {
    /// Open or create a database file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path).map_err(db_err)?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(db_err)?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(db_err)?;
        Ok(Self::from_connection(conn))
    }

    /// Open a fresh in-memory database. Used by tests and ephemeral setups.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Run a closure against the connection.
    pub(crate) fn with<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.conn.lock();
        f(&conn)
    }

    /// Run a closure inside a transaction.
    ///
    /// The transaction commits when the closure returns `Ok` and rolls back
    /// when it returns `Err`.
    pub(crate) fn transaction<T>(
        &self,
        f: impl FnOnce(&Transaction<'_>) -> Result<T>,
    ) -> Result<T> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(db_err)?;
        let value = f(&tx)?;
        tx.commit().map_err(db_err)?;
        Ok(value)
    }
}

/// Translate an engine-native error into the store taxonomy.
pub(crate) fn db_err(err: rusqlite::Error) -> StoreError {
    match err {
        rusqlite::Error::QueryReturnedNoRows => StoreError::ResourceNotFound,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            StoreError::DuplicateName
        }
        other => StoreError::Database(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_violation_translates_to_duplicate_name() {
        let db = Db::open_in_memory().unwrap();
        db.with(|conn| {
            conn.execute_batch("CREATE TABLE t (id TEXT PRIMARY KEY)")
                .map_err(db_err)
        })
        .unwrap();

        let insert = |db: &Db| {
            db.with(|conn| {
                conn.execute("INSERT INTO t (id) VALUES ('a')", [])
                    .map_err(db_err)
            })
        };
        insert(&db).unwrap();
        assert!(matches!(insert(&db), Err(StoreError::DuplicateName)));
    }

    #[test]
    fn open_creates_the_database_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("store.db");
        let db = Db::open(&path).unwrap();
        db.with(|conn| {
            conn.execute_batch("CREATE TABLE t (id TEXT PRIMARY KEY)")
                .map_err(db_err)
        })
        .unwrap();
        assert!(path.exists());
    }

    #[test]
    fn transaction_rolls_back_on_error() {
        let db = Db::open_in_memory().unwrap();
        db.with(|conn| {
            conn.execute_batch("CREATE TABLE t (id TEXT PRIMARY KEY)")
                .map_err(db_err)
        })
        .unwrap();

        let result: Result<()> = db.transaction(|tx| {
            tx.execute("INSERT INTO t (id) VALUES ('a')", [])
                .map_err(db_err)?;
            Err(StoreError::ResourceNotFound)
        });
        assert!(result.is_err());

        let count: i64 = db
            .with(|conn| {
                conn.query_row("SELECT COUNT(*) FROM t", [], |row| row.get(0))
                    .map_err(db_err)
            })
            .unwrap();
        assert_eq!(count, 0);
    }
}
