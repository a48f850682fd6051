//! Task domain model.
//!
//! # Responsibility
//! - Define the task record, its enums and the partial-update shape.
//! - Keep the persisted/exported JSON field names stable.
//!
//! # Invariants
//! - `id` is non-empty and never reassigned after creation.
//! - `completed()` always equals `status == TaskStatus::Completed`.
//! - `due_at` and `reminder_at` start with a zero-padded `YYYY-MM-DD` date,
//!   so lexicographic comparison matches chronological order.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

static ISO_TIMESTAMP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}(T\d{2}:\d{2}(:\d{2}(\.\d{1,9})?)?(Z|[+-]\d{2}:?\d{2})?)?$")
        .expect("valid timestamp regex")
});

/// Length of the `YYYY-MM-DD` prefix of an ISO-8601 timestamp.
pub const ISO_DATE_LEN: usize = 10;

/// Opaque task identifier.
///
/// Imported records may carry any non-empty string, so this is not a UUID.
pub type TaskId = String;

/// Task urgency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    #[serde(rename = "baja")]
    Low,
    #[default]
    #[serde(rename = "media")]
    Medium,
    #[serde(rename = "alta")]
    High,
}

/// Task lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    /// Created but not started.
    #[default]
    #[serde(rename = "inicial")]
    Initial,
    /// Work has started, or a completed task was reopened.
    #[serde(rename = "en_ejecucion")]
    InProgress,
    /// Done. The only status for which `completed()` is true.
    #[serde(rename = "finalizada")]
    Completed,
}

/// Life area a task belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[default]
    #[serde(rename = "personal")]
    Personal,
    #[serde(rename = "trabajo")]
    Work,
    #[serde(rename = "social")]
    Social,
}

impl Priority {
    /// Stable wire value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "baja",
            Self::Medium => "media",
            Self::High => "alta",
        }
    }

    /// Parses a wire value or its English alias.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "baja" | "low" => Some(Self::Low),
            "media" | "medium" => Some(Self::Medium),
            "alta" | "high" => Some(Self::High),
            _ => None,
        }
    }
}

impl TaskStatus {
    /// Stable wire value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initial => "inicial",
            Self::InProgress => "en_ejecucion",
            Self::Completed => "finalizada",
        }
    }

    /// Parses a wire value or its English alias.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "inicial" | "initial" => Some(Self::Initial),
            "en_ejecucion" | "in_progress" | "in-progress" => Some(Self::InProgress),
            "finalizada" | "completed" | "done" => Some(Self::Completed),
            _ => None,
        }
    }

    /// Status implied by setting the completed flag directly.
    ///
    /// Reopening a task yields `InProgress`, never `Initial`.
    pub fn from_completed(completed: bool) -> Self {
        if completed {
            Self::Completed
        } else {
            Self::InProgress
        }
    }
}

impl Category {
    /// Stable wire value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Personal => "personal",
            Self::Work => "trabajo",
            Self::Social => "social",
        }
    }

    /// Parses a wire value or its English alias.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "personal" => Some(Self::Personal),
            "trabajo" | "work" => Some(Self::Work),
            "social" => Some(Self::Social),
            _ => None,
        }
    }
}

/// Record validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    /// Identifier is missing or blank.
    MissingId,
    /// Title is missing or blank after trimming.
    EmptyTitle,
    /// Timestamp field does not start with a zero-padded ISO-8601 date.
    InvalidTimestamp { field: &'static str, value: String },
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingId => write!(f, "task id must not be empty"),
            Self::EmptyTitle => write!(f, "task title must not be empty"),
            Self::InvalidTimestamp { field, value } => {
                write!(f, "{field} is not an ISO-8601 timestamp: `{value}`")
            }
        }
    }
}

impl Error for TaskValidationError {}

/// Canonical task record.
///
/// Serialized with the field names of the original mobile app
/// (`titulo`, `fechaHora`, ...) so exports stay interchangeable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "TaskWire", try_from = "TaskWire")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    /// Due date-time, ISO-8601.
    pub due_at: Option<String>,
    pub priority: Priority,
    pub status: TaskStatus,
    pub category: Category,
    pub notes: Option<String>,
    /// Reminder date-time, ISO-8601. Presence means a notification is due.
    pub reminder_at: Option<String>,
}

impl Task {
    /// Builds a task from creation input with a caller-provided id.
    ///
    /// Used by tests and import paths where identity already exists.
    ///
    /// # Errors
    /// - `MissingId` when `id` is blank.
    /// - Any error from [`Task::validate`].
    pub fn from_new(id: impl Into<TaskId>, new: NewTask) -> Result<Self, TaskValidationError> {
        let task = Self {
            id: id.into(),
            title: new.title,
            description: normalize_optional(new.description),
            due_at: normalize_optional(new.due_at),
            priority: new.priority,
            status: new.status,
            category: new.category,
            notes: normalize_optional(new.notes),
            reminder_at: normalize_optional(new.reminder_at),
        };
        task.validate()?;
        Ok(task)
    }

    /// Derived completion flag.
    pub fn completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// Checks record invariants.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.id.trim().is_empty() {
            return Err(TaskValidationError::MissingId);
        }
        if self.title.trim().is_empty() {
            return Err(TaskValidationError::EmptyTitle);
        }
        validate_timestamp("fechaHora", self.due_at.as_deref())?;
        validate_timestamp("recordatorio", self.reminder_at.as_deref())?;
        Ok(())
    }

    /// Date portion (`YYYY-MM-DD`) of the due timestamp.
    pub fn due_date(&self) -> Option<&str> {
        self.due_at
            .as_deref()
            .and_then(|value| value.get(..ISO_DATE_LEN))
    }

    /// Lowercased `title description notes` text used by free-text search.
    pub fn search_haystack(&self) -> String {
        format!(
            "{} {} {}",
            self.title,
            self.description.as_deref().unwrap_or(""),
            self.notes.as_deref().unwrap_or("")
        )
        .to_lowercase()
    }
}

/// Creation input: every field except `id` and `completed`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub due_at: Option<String>,
    pub priority: Priority,
    pub status: TaskStatus,
    pub category: Category,
    pub notes: Option<String>,
    pub reminder_at: Option<String>,
}

impl NewTask {
    /// Creation input with form defaults (`media`, `inicial`, `personal`).
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_due_at(mut self, due_at: impl Into<String>) -> Self {
        self.due_at = Some(due_at.into());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_reminder_at(mut self, reminder_at: impl Into<String>) -> Self {
        self.reminder_at = Some(reminder_at.into());
        self
    }
}

/// Partial update.
///
/// Outer `None` leaves a field untouched; `Some(None)` clears an optional
/// field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub due_at: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub status: Option<TaskStatus>,
    pub category: Option<Category>,
    pub notes: Option<Option<String>>,
    /// Setting the flag directly rewrites `status`; `status` wins when both
    /// are present.
    pub completed: Option<bool>,
    pub reminder_at: Option<Option<String>>,
}

impl TaskPatch {
    /// Patch that only changes the status.
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Patch that only sets or clears the due timestamp.
    pub fn due_at(due_at: Option<String>) -> Self {
        Self {
            due_at: Some(due_at),
            ..Self::default()
        }
    }

    /// Checks that the patch cannot break record invariants.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(TaskValidationError::EmptyTitle);
            }
        }
        if let Some(due_at) = &self.due_at {
            validate_timestamp("fechaHora", non_blank(due_at.as_deref()))?;
        }
        if let Some(reminder_at) = &self.reminder_at {
            validate_timestamp("recordatorio", non_blank(reminder_at.as_deref()))?;
        }
        Ok(())
    }

    /// Merges this patch onto `task`, keeping `completed` and `status` in sync.
    pub(crate) fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = normalize_optional(description.clone());
        }
        if let Some(due_at) = &self.due_at {
            task.due_at = normalize_optional(due_at.clone());
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(category) = self.category {
            task.category = category;
        }
        if let Some(notes) = &self.notes {
            task.notes = normalize_optional(notes.clone());
        }
        if let Some(reminder_at) = &self.reminder_at {
            task.reminder_at = normalize_optional(reminder_at.clone());
        }

        match (self.status, self.completed) {
            (Some(status), _) => task.status = status,
            (None, Some(completed)) if completed != task.completed() => {
                task.status = TaskStatus::from_completed(completed);
            }
            _ => {}
        }
    }
}

/// Generates a fresh random task identifier.
pub fn generate_task_id() -> TaskId {
    Uuid::new_v4().to_string()
}

/// Returns whether `value` starts with a zero-padded ISO-8601 date.
pub fn is_iso_timestamp(value: &str) -> bool {
    ISO_TIMESTAMP_RE.is_match(value)
}

/// Serialized record shape.
///
/// Every field is optional on the way in so import can apply defaults and
/// report precise errors; `Task` always fills them on the way out.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct TaskWire {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "titulo")]
    pub title: Option<String>,
    #[serde(rename = "descripcion", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "fechaHora", skip_serializing_if = "Option::is_none")]
    pub due_at: Option<String>,
    #[serde(rename = "prioridad")]
    pub priority: Option<Priority>,
    #[serde(rename = "estado")]
    pub status: Option<TaskStatus>,
    #[serde(rename = "categoria")]
    pub category: Option<Category>,
    #[serde(rename = "notas", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(rename = "completada")]
    pub completed: Option<bool>,
    #[serde(rename = "recordatorio", skip_serializing_if = "Option::is_none")]
    pub reminder_at: Option<String>,
}

impl TaskWire {
    /// Normalizes a wire record into a validated task with the given id.
    ///
    /// Missing enums fall back to creation defaults; a missing `estado`
    /// with `completada: true` becomes `finalizada`.
    pub(crate) fn into_task(self, id: TaskId) -> Result<Task, TaskValidationError> {
        let status = match (self.status, self.completed) {
            (Some(status), _) => status,
            (None, Some(true)) => TaskStatus::Completed,
            (None, _) => TaskStatus::default(),
        };
        let task = Task {
            id,
            title: self.title.unwrap_or_default(),
            description: normalize_optional(self.description),
            due_at: normalize_optional(self.due_at),
            priority: self.priority.unwrap_or_default(),
            status,
            category: self.category.unwrap_or_default(),
            notes: normalize_optional(self.notes),
            reminder_at: normalize_optional(self.reminder_at),
        };
        task.validate()?;
        Ok(task)
    }
}

impl From<Task> for TaskWire {
    fn from(task: Task) -> Self {
        let completed = task.completed();
        Self {
            id: Some(task.id),
            title: Some(task.title),
            description: task.description,
            due_at: task.due_at,
            priority: Some(task.priority),
            status: Some(task.status),
            category: Some(task.category),
            notes: task.notes,
            completed: Some(completed),
            reminder_at: task.reminder_at,
        }
    }
}

impl TryFrom<TaskWire> for Task {
    type Error = TaskValidationError;

    fn try_from(mut wire: TaskWire) -> Result<Self, Self::Error> {
        let id = wire.id.take().unwrap_or_default();
        wire.into_task(id)
    }
}

fn validate_timestamp(field: &'static str, value: Option<&str>) -> Result<(), TaskValidationError> {
    match value {
        Some(value) if !is_iso_timestamp(value) => Err(TaskValidationError::InvalidTimestamp {
            field,
            value: value.to_string(),
        }),
        _ => Ok(()),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}

/// Blank optional text is treated as absent, matching form submission.
fn normalize_optional(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}
