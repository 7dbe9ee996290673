//! Checkpoint store facade.
//!
//! Internal bookkeeping for background consumers: each consumer persists
//! opaque progress values under its own keys. Not exposed over HTTP.

use chrono::Utc;
use rusqlite::params;

use flightctl_core::Result;

use crate::db::{db_err, Db};
use crate::model::fmt_timestamp;

/// Store for consumer checkpoints.
pub struct CheckpointStore {
    db: Db,
}

impl CheckpointStore {
    /// Create the facade over a database handle.
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Create the backing table.
    ///
    /// # Errors
    ///
    /// Returns a database error if the DDL fails.
    pub fn initial_migration(&self) -> Result<()> {
        self.db.with(|conn| {
            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS checkpoints (\n\
                 \tconsumer TEXT NOT NULL,\n\
                 \tcheckpoint_key TEXT NOT NULL,\n\
                 \tvalue BLOB NOT NULL,\n\
                 \tcreated_at TEXT NOT NULL,\n\
                 \tupdated_at TEXT NOT NULL,\n\
                 \tPRIMARY KEY (consumer, checkpoint_key)\n\
                 );",
            )
            .map_err(db_err)
        })
    }

    /// Write a checkpoint value, overwriting any previous one.
    ///
    /// # Errors
    ///
    /// Returns a database error if the write fails.
    pub fn set(&self, consumer: &str, key: &str, value: &[u8]) -> Result<()> {
        let now = fmt_timestamp(Utc::now());
        self.db.with(|conn| {
            conn.execute(
                "INSERT INTO checkpoints (consumer, checkpoint_key, value, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?4) \
                 ON CONFLICT (consumer, checkpoint_key) \
                 DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![consumer, key, value, now],
            )
            .map_err(db_err)?;
            Ok(())
        })
    }

    /// Read a checkpoint value, `None` when the consumer has not written
    /// one yet.
    ///
    /// # Errors
    ///
    /// Returns a database error if the read fails.
    pub fn get(&self, consumer: &str, key: &str) -> Result<Option<Vec<u8>>> {
        self.db.with(|conn| {
            match conn.query_row(
                "SELECT value FROM checkpoints WHERE consumer = ?1 AND checkpoint_key = ?2",
                params![consumer, key],
                |row| row.get(0),
            ) {
                Ok(value) => Ok(Some(value)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(err) => Err(db_err(err)),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkpoint_set_get_overwrite() {
        let store = CheckpointStore::new(Db::open_in_memory().unwrap());
        store.initial_migration().unwrap();

        assert_eq!(store.get("renderer", "cursor").unwrap(), None);

        store.set("renderer", "cursor", b"42").unwrap();
        assert_eq!(store.get("renderer", "cursor").unwrap(), Some(b"42".to_vec()));

        store.set("renderer", "cursor", b"43").unwrap();
        assert_eq!(store.get("renderer", "cursor").unwrap(), Some(b"43".to_vec()));
    }
}
