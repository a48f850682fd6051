//! SQLite-backed durable store.
//!
//! # Responsibility
//! - Persist JSON values in the `kv_entries` table.
//! - Keep SQL details inside the storage boundary.
//!
//! # Invariants
//! - The owned connection is migrated to `latest_version()` before use.
//! - Values are stored as compact JSON text and must parse on read.

use super::{DurableStore, KvError, KvResult};
use crate::db::migrations::latest_version;
use crate::db::{open_db, open_db_in_memory, schema_state, schema_version, SchemaState};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;

/// Key-value store over one SQLite connection.
pub struct SqliteKvStore {
    conn: Connection,
}

impl SqliteKvStore {
    /// Opens (and migrates) a database file.
    pub fn open(path: impl AsRef<Path>) -> KvResult<Self> {
        Self::try_new(open_db(path)?)
    }

    /// Opens (and migrates) a private in-memory database.
    pub fn open_in_memory() -> KvResult<Self> {
        Self::try_new(open_db_in_memory()?)
    }

    /// Wraps an already-open connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations have not been applied.
    pub fn try_new(conn: Connection) -> KvResult<Self> {
        if schema_state(&conn)? != SchemaState::Current {
            return Err(KvError::UninitializedConnection {
                expected_version: latest_version(),
                actual_version: schema_version(&conn)?,
            });
        }
        Ok(Self { conn })
    }
}

impl DurableStore for SqliteKvStore {
    fn get(&self, key: &str) -> KvResult<Option<Value>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [key],
                |row| row.get(0),
            )
            .optional()?;

        raw.map(|text| {
            serde_json::from_str(&text).map_err(|err| KvError::InvalidData {
                key: key.to_string(),
                message: err.to_string(),
            })
        })
        .transpose()
    }

    fn set(&self, key: &str, value: &Value) -> KvResult<()> {
        let text = serde_json::to_string(value).map_err(KvError::Encode)?;
        self.conn.execute(
            "INSERT INTO kv_entries (key, value, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, text],
        )?;
        Ok(())
    }
}
