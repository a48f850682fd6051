//! Schema management for the `kv_entries` database behind `SqliteKvStore`.
//!
//! # Responsibility
//! - Open connections ready for key-value access (`open_db*`).
//! - Classify a connection's schema against this binary (`schema_state`).
//!
//! # Invariants
//! - Schema version lives in `PRAGMA user_version` and only grows.
//! - A file written by a newer binary is never migrated or read.

use rusqlite::Connection;
use std::cmp::Ordering;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The task file was written by a newer release of this store.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "task store file uses schema {db_version}; this build reads up to {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Where a connection's schema stands against `migrations::latest_version()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaState {
    /// Fully migrated; `kv_entries` is usable.
    Current,
    /// Older schema; `apply_migrations` will bring it forward.
    Pending { from: u32, to: u32 },
    /// Written by a newer binary.
    Newer { db_version: u32, latest_supported: u32 },
}

/// Reads `PRAGMA user_version`.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

/// Classifies `conn` without modifying it.
pub fn schema_state(conn: &Connection) -> DbResult<SchemaState> {
    let current = schema_version(conn)?;
    let latest = migrations::latest_version();
    Ok(match current.cmp(&latest) {
        Ordering::Equal => SchemaState::Current,
        Ordering::Less => SchemaState::Pending {
            from: current,
            to: latest,
        },
        Ordering::Greater => SchemaState::Newer {
            db_version: current,
            latest_supported: latest,
        },
    })
}
