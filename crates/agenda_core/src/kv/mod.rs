//! Durable key-value store contract and implementations.
//!
//! # Responsibility
//! - Define the `get`/`set` contract the task store persists through.
//! - Keep storage engines free of task semantics: values are opaque JSON.
//!
//! # Invariants
//! - `get` on a key that was never written returns `Ok(None)`.
//! - `set` replaces the whole value stored under a key.

use crate::db::DbError;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod memory;
pub mod sqlite;
pub mod write_behind;

pub use memory::MemoryKvStore;
pub use sqlite::SqliteKvStore;
pub use write_behind::WriteBehindStore;

pub type KvResult<T> = Result<T, KvError>;

/// Storage-layer error.
#[derive(Debug)]
pub enum KvError {
    Db(DbError),
    /// Value could not be encoded for storage.
    Encode(serde_json::Error),
    /// Stored bytes are not valid JSON.
    InvalidData { key: String, message: String },
    /// Connection was not migrated to the schema this binary expects.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Backend cannot serve requests (poisoned lock, stopped writer thread).
    Unavailable(String),
}

impl Display for KvError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode value: {err}"),
            Self::InvalidData { key, message } => {
                write!(f, "invalid stored value for key `{key}`: {message}")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::Unavailable(message) => write!(f, "store unavailable: {message}"),
        }
    }
}

impl Error for KvError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Encode(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for KvError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for KvError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Durable key-value persistence consumed by `TaskStore`.
pub trait DurableStore {
    fn get(&self, key: &str) -> KvResult<Option<Value>>;
    fn set(&self, key: &str, value: &Value) -> KvResult<()>;
}

impl<S: DurableStore + ?Sized> DurableStore for Box<S> {
    fn get(&self, key: &str) -> KvResult<Option<Value>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &Value) -> KvResult<()> {
        (**self).set(key, value)
    }
}
