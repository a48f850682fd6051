use crate::model::task::{generate_task_id, Task, TaskValidationError, TaskWire};
use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Import/export failure.
#[derive(Debug)]
pub enum CodecError {
    /// Input text is not JSON.
    Parse(serde_json::Error),
    /// Top-level JSON value is not an array.
    NotAnArray,
    /// Array element at `index` is not an object.
    NotAnObject { index: usize },
    /// Element at `index` has a field of the wrong type or value.
    MalformedRecord {
        index: usize,
        source: serde_json::Error,
    },
    /// Element at `index` breaks a record invariant.
    InvalidRecord {
        index: usize,
        source: TaskValidationError,
    },
    /// Collection could not be encoded.
    Encode(serde_json::Error),
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "import is not valid JSON: {err}"),
            Self::NotAnArray => write!(f, "import must be a JSON array of tasks"),
            Self::NotAnObject { index } => write!(f, "task #{index} is not a JSON object"),
            Self::MalformedRecord { index, source } => write!(f, "task #{index}: {source}"),
            Self::InvalidRecord { index, source } => write!(f, "task #{index}: {source}"),
            Self::Encode(err) => write!(f, "failed to encode tasks: {err}"),
        }
    }
}

impl Error for CodecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) | Self::Encode(err) => Some(err),
            Self::MalformedRecord { source, .. } => Some(source),
            Self::InvalidRecord { source, .. } => Some(source),
            Self::NotAnArray | Self::NotAnObject { .. } => None,
        }
    }
}

/// How imported records combine with the current collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImportMode {
    /// Imported records become the whole collection.
    Replace,
    /// Imported records are placed before the existing ones.
    #[default]
    Merge,
}

impl ImportMode {
    pub fn from_replace_flag(replace: bool) -> Self {
        if replace {
            Self::Replace
        } else {
            Self::Merge
        }
    }
}

/// Import outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Records contained in the input, not the resulting collection size.
    #[serde(rename = "insertadas")]
    pub inserted: usize,
}

/// Serializes `tasks` as a 2-space indented JSON array.
pub fn export_tasks(tasks: &[Task]) -> Result<String, CodecError> {
    serde_json::to_string_pretty(tasks).map_err(CodecError::Encode)
}

/// Encodes `tasks` as a JSON value for the durable store.
pub fn encode_tasks(tasks: &[Task]) -> Result<Value, CodecError> {
    serde_json::to_value(tasks).map_err(CodecError::Encode)
}

/// Parses an import payload into validated records.
///
/// Records without an `id` (or with a blank one) receive a fresh id.
///
/// # Errors
/// - `Parse` / `NotAnArray` for structurally wrong payloads.
/// - `NotAnObject`, `MalformedRecord`, `InvalidRecord` with the index of the
///   first offending element. Nothing is imported in that case.
pub fn decode_tasks(json: &str) -> Result<Vec<Task>, CodecError> {
    let value: Value = serde_json::from_str(json).map_err(CodecError::Parse)?;
    let Value::Array(items) = value else {
        return Err(CodecError::NotAnArray);
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| decode_record(index, item))
        .collect()
}

/// Decodes one array element at `index`.
pub fn decode_record(index: usize, value: Value) -> Result<Task, CodecError> {
    if !value.is_object() {
        return Err(CodecError::NotAnObject { index });
    }

    let mut wire: TaskWire = serde_json::from_value(value)
        .map_err(|source| CodecError::MalformedRecord { index, source })?;
    let id = wire
        .id
        .take()
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(generate_task_id);

    wire.into_task(id)
        .map_err(|source| CodecError::InvalidRecord { index, source })
}

/// Combines `imported` with `existing` according to `mode`.
pub fn merge_imported(existing: &[Task], imported: Vec<Task>, mode: ImportMode) -> Vec<Task> {
    match mode {
        ImportMode::Replace => imported,
        ImportMode::Merge => {
            let mut merged = imported;
            merged.extend_from_slice(existing);
            merged
        }
    }
}
