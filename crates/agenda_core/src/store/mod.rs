//! Authoritative in-memory task collection.
//!
//! # Responsibility
//! - Own the ordered task sequence and every mutation of it.
//! - Persist each mutation through the durable store.
//! - Drive reminder side effects and broadcast snapshots to subscribers.
//!
//! # Invariants
//! - In-memory state changes before persistence is issued.
//! - Persistence and reminder failures never fail a mutation.
//! - Only `TaskStore` writes the tasks key.

use crate::codec::CodecError;
use crate::kv::KvError;
use crate::model::task::TaskValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod subscription;
mod task_store;

pub use subscription::TaskSubscription;
pub use task_store::{TaskStore, TASKS_KEY};

pub type TaskResult<T> = Result<T, TaskError>;

/// Task store error.
///
/// Not-found ids are not errors: they surface as `None` / `false`.
#[derive(Debug)]
pub enum TaskError {
    Validation(TaskValidationError),
    Import(CodecError),
    /// Durable store failure while loading.
    Store(KvError),
    IndexOutOfRange { index: usize, len: usize },
}

impl Display for TaskError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Import(err) => write!(f, "import failed: {err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::IndexOutOfRange { index, len } => {
                write!(f, "index {index} is out of range for {len} task(s)")
            }
        }
    }
}

impl Error for TaskError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Import(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::IndexOutOfRange { .. } => None,
        }
    }
}

impl From<TaskValidationError> for TaskError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<CodecError> for TaskError {
    fn from(value: CodecError) -> Self {
        Self::Import(value)
    }
}

impl From<KvError> for TaskError {
    fn from(value: KvError) -> Self {
        Self::Store(value)
    }
}
