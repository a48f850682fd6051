//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level task functions to Dart via FRB.
//! - Translate core errors into plain response envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Each call runs open, load, mutate and persist under one process-wide
//!   lock, so concurrent callers never lose each other's writes.
//! - Enum values cross the boundary as their exchange strings
//!   (`baja|media|alta`, `inicial|en_ejecucion|finalizada`,
//!   `personal|trabajo|social`).

use agenda_core::{
    core_version as core_version_inner, day_view, init_logging as init_logging_inner,
    ping as ping_inner, Category, ImportMode, NewTask, NoopReminders, Priority, SqliteKvStore,
    Task, TaskFilters, TaskPatch, TaskStatus, TaskStore,
};
use log::warn;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock, PoisonError};

const DB_FILE_NAME: &str = "agenda.sqlite3";
const DB_PATH_ENV: &str = "AGENDA_DB_PATH";
static DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static STORE_LOCK: Mutex<()> = Mutex::new(());

type FfiStore = TaskStore<SqliteKvStore, NoopReminders>;

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Flat task projection for Dart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    /// ISO-8601 due timestamp.
    pub due_at: Option<String>,
    pub priority: String,
    pub status: String,
    pub category: String,
    pub notes: Option<String>,
    /// Always equal to `status == "finalizada"`.
    pub completed: bool,
    pub reminder_at: Option<String>,
}

impl From<&Task> for TaskItem {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            title: task.title.clone(),
            description: task.description.clone(),
            due_at: task.due_at.clone(),
            priority: task.priority.as_str().to_string(),
            status: task.status.as_str().to_string(),
            category: task.category.as_str().to_string(),
            notes: task.notes.clone(),
            completed: task.completed(),
            reminder_at: task.reminder_at.clone(),
        }
    }
}

/// List response envelope for filtered and day views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskListResponse {
    pub ok: bool,
    /// Matching tasks in display order; empty on failure.
    pub items: Vec<TaskItem>,
    /// Human-readable response message for diagnostics.
    pub message: String,
}

impl TaskListResponse {
    fn success(tasks: &[Task]) -> Self {
        let items = tasks.iter().map(TaskItem::from).collect::<Vec<_>>();
        let message = if items.is_empty() {
            "No tasks.".to_string()
        } else {
            format!("Found {} task(s).", items.len())
        };
        Self {
            ok: true,
            items,
            message,
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            items: Vec::new(),
            message: message.into(),
        }
    }
}

/// Generic action response envelope for single-task commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Task state after the operation, when one exists.
    pub task: Option<TaskItem>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl TaskActionResponse {
    fn success(message: impl Into<String>, task: Option<&Task>) -> Self {
        Self {
            ok: true,
            task: task.map(TaskItem::from),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            task: None,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskExportResponse {
    pub ok: bool,
    /// Pretty-printed JSON array; empty on failure.
    pub json: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskImportResponse {
    pub ok: bool,
    /// Number of records in the imported file.
    pub inserted: u32,
    pub message: String,
}

/// Lists tasks matching every supplied selection.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - `None` or blank selections impose no constraint.
/// - Unknown enum strings return `ok=false`.
#[flutter_rust_bridge::frb(sync)]
pub fn task_list(
    category: Option<String>,
    priority: Option<String>,
    status: Option<String>,
    search: Option<String>,
) -> TaskListResponse {
    let filters = match build_filters(category, priority, status, search) {
        Ok(filters) => filters,
        Err(err) => return TaskListResponse::failure(format!("task_list failed: {err}")),
    };
    match with_task_store(|store| Ok(filters.apply(store.list()))) {
        Ok(tasks) => TaskListResponse::success(&tasks),
        Err(err) => TaskListResponse::failure(format!("task_list failed: {err}")),
    }
}

/// Tasks due on `date` (`YYYY-MM-DD`).
#[flutter_rust_bridge::frb(sync)]
pub fn tasks_day_view(date: String) -> TaskListResponse {
    match with_task_store(|store| Ok(day_view(store.list(), &date))) {
        Ok(tasks) => TaskListResponse::success(&tasks),
        Err(err) => TaskListResponse::failure(format!("tasks_day_view failed: {err}")),
    }
}

/// Creates a task and places it first.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Missing enums fall back to `media`, `inicial` and `personal`.
/// - Never panics; returns the created task on success.
#[flutter_rust_bridge::frb(sync)]
pub fn task_create(
    title: String,
    description: Option<String>,
    due_at: Option<String>,
    priority: Option<String>,
    category: Option<String>,
    notes: Option<String>,
    reminder_at: Option<String>,
) -> TaskActionResponse {
    let new_task = match build_new_task(
        title,
        description,
        due_at,
        priority,
        category,
        notes,
        reminder_at,
    ) {
        Ok(new_task) => new_task,
        Err(err) => return TaskActionResponse::failure(format!("task_create failed: {err}")),
    };
    match with_task_store(|store| store.create(new_task).map_err(|err| err.to_string())) {
        Ok(task) => TaskActionResponse::success("Task created.", Some(&task)),
        Err(err) => TaskActionResponse::failure(format!("task_create failed: {err}")),
    }
}

/// Sets the workflow status; `completed` follows.
#[flutter_rust_bridge::frb(sync)]
pub fn task_update_status(id: String, status: String) -> TaskActionResponse {
    let Some(status) = TaskStatus::parse(&status) else {
        return TaskActionResponse::failure(format!(
            "task_update_status failed: unknown status `{status}`"
        ));
    };
    let result = with_task_store(|store| {
        store
            .update(id.trim(), TaskPatch::status(status))
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(Some(task)) => TaskActionResponse::success("Task updated.", Some(&task)),
        Ok(None) => TaskActionResponse::failure("task_update_status failed: task not found"),
        Err(err) => TaskActionResponse::failure(format!("task_update_status failed: {err}")),
    }
}

/// Edits any subset of a task's fields.
///
/// Input semantics:
/// - `None` leaves a field unchanged.
/// - A blank string clears `description`, `due_at`, `notes` and
///   `reminder_at`; a blank enum string leaves that enum unchanged.
/// - A blank `title` is rejected.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics; returns the updated task on success.
#[allow(clippy::too_many_arguments)]
#[flutter_rust_bridge::frb(sync)]
pub fn task_update(
    id: String,
    title: Option<String>,
    description: Option<String>,
    due_at: Option<String>,
    priority: Option<String>,
    status: Option<String>,
    category: Option<String>,
    notes: Option<String>,
    reminder_at: Option<String>,
) -> TaskActionResponse {
    let patch = match build_patch(
        title,
        description,
        due_at,
        priority,
        status,
        category,
        notes,
        reminder_at,
    ) {
        Ok(patch) => patch,
        Err(err) => return TaskActionResponse::failure(format!("task_update failed: {err}")),
    };
    let result =
        with_task_store(|store| store.update(id.trim(), patch).map_err(|err| err.to_string()));
    match result {
        Ok(Some(task)) => TaskActionResponse::success("Task updated.", Some(&task)),
        Ok(None) => TaskActionResponse::failure("task_update failed: task not found"),
        Err(err) => TaskActionResponse::failure(format!("task_update failed: {err}")),
    }
}

/// Sets the due timestamp; `None` or blank clears it.
#[flutter_rust_bridge::frb(sync)]
pub fn task_reschedule(id: String, due_at: Option<String>) -> TaskActionResponse {
    let due_at = clearable(due_at).flatten();
    let result = with_task_store(|store| {
        store
            .reschedule(id.trim(), due_at)
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(Some(task)) => TaskActionResponse::success("Task rescheduled.", Some(&task)),
        Ok(None) => TaskActionResponse::failure("task_reschedule failed: task not found"),
        Err(err) => TaskActionResponse::failure(format!("task_reschedule failed: {err}")),
    }
}

/// Flips the completed flag of one task.
#[flutter_rust_bridge::frb(sync)]
pub fn task_toggle(id: String) -> TaskActionResponse {
    match with_task_store(|store| Ok(store.toggle_completed(id.trim()))) {
        Ok(Some(task)) => TaskActionResponse::success("Task toggled.", Some(&task)),
        Ok(None) => TaskActionResponse::failure("task_toggle failed: task not found"),
        Err(err) => TaskActionResponse::failure(format!("task_toggle failed: {err}")),
    }
}

/// Deletes one task. Deleting an unknown id still succeeds.
#[flutter_rust_bridge::frb(sync)]
pub fn task_delete(id: String) -> TaskActionResponse {
    match with_task_store(|store| Ok(store.delete(id.trim()))) {
        Ok(true) => TaskActionResponse::success("Task deleted.", None),
        Ok(false) => TaskActionResponse::success("Task not found.", None),
        Err(err) => TaskActionResponse::failure(format!("task_delete failed: {err}")),
    }
}

/// Moves the task at `from` to position `to`.
#[flutter_rust_bridge::frb(sync)]
pub fn task_reorder(from: u32, to: u32) -> TaskActionResponse {
    let result = with_task_store(|store| {
        store
            .reorder(from as usize, to as usize)
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(()) => TaskActionResponse::success("Task moved.", None),
        Err(err) => TaskActionResponse::failure(format!("task_reorder failed: {err}")),
    }
}

/// Exports the whole collection as pretty JSON.
#[flutter_rust_bridge::frb(sync)]
pub fn tasks_export() -> TaskExportResponse {
    match with_task_store(|store| store.export().map_err(|err| err.to_string())) {
        Ok(json) => TaskExportResponse {
            ok: true,
            json,
            message: "Tasks exported.".to_string(),
        },
        Err(err) => TaskExportResponse {
            ok: false,
            json: String::new(),
            message: format!("tasks_export failed: {err}"),
        },
    }
}

/// Imports a JSON array of tasks.
///
/// # FFI contract
/// - `replace=true` swaps the collection; otherwise records are prepended.
/// - An invalid file leaves the collection unchanged and returns `ok=false`.
#[flutter_rust_bridge::frb(sync)]
pub fn tasks_import(json: String, replace: bool) -> TaskImportResponse {
    let mode = ImportMode::from_replace_flag(replace);
    match with_task_store(|store| store.import(&json, mode).map_err(|err| err.to_string())) {
        Ok(summary) => TaskImportResponse {
            ok: true,
            inserted: u32::try_from(summary.inserted).unwrap_or(u32::MAX),
            message: format!("Imported {} task(s).", summary.inserted),
        },
        Err(err) => TaskImportResponse {
            ok: false,
            inserted: 0,
            message: format!("tasks_import failed: {err}"),
        },
    }
}

fn build_filters(
    category: Option<String>,
    priority: Option<String>,
    status: Option<String>,
    search: Option<String>,
) -> Result<TaskFilters, String> {
    Ok(TaskFilters {
        category: parse_optional(category, Category::parse, "category")?,
        priority: parse_optional(priority, Priority::parse, "priority")?,
        status: parse_optional(status, TaskStatus::parse, "status")?,
        term: search.unwrap_or_default(),
    })
}

#[allow(clippy::too_many_arguments)]
fn build_patch(
    title: Option<String>,
    description: Option<String>,
    due_at: Option<String>,
    priority: Option<String>,
    status: Option<String>,
    category: Option<String>,
    notes: Option<String>,
    reminder_at: Option<String>,
) -> Result<TaskPatch, String> {
    Ok(TaskPatch {
        title: title.map(|title| title.trim().to_string()),
        description: clearable(description),
        due_at: clearable(due_at),
        priority: parse_optional(priority, Priority::parse, "priority")?,
        status: parse_optional(status, TaskStatus::parse, "status")?,
        category: parse_optional(category, Category::parse, "category")?,
        notes: clearable(notes),
        reminder_at: clearable(reminder_at),
        ..TaskPatch::default()
    })
}

/// `None` keeps the field, blank clears it.
fn clearable(raw: Option<String>) -> Option<Option<String>> {
    raw.map(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn build_new_task(
    title: String,
    description: Option<String>,
    due_at: Option<String>,
    priority: Option<String>,
    category: Option<String>,
    notes: Option<String>,
    reminder_at: Option<String>,
) -> Result<NewTask, String> {
    let mut new_task = NewTask::new(title.trim());
    new_task.description = description;
    new_task.due_at = due_at;
    new_task.notes = notes;
    new_task.reminder_at = reminder_at;
    if let Some(priority) = parse_optional(priority, Priority::parse, "priority")? {
        new_task.priority = priority;
    }
    if let Some(category) = parse_optional(category, Category::parse, "category")? {
        new_task.category = category;
    }
    Ok(new_task)
}

fn parse_optional<T>(
    raw: Option<String>,
    parse: fn(&str) -> Option<T>,
    field: &str,
) -> Result<Option<T>, String> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse(value)
            .map(Some)
            .ok_or_else(|| format!("unknown {field} `{value}`")),
    }
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(DB_FILE_NAME)
        })
        .clone()
}

fn with_task_store<T>(f: impl FnOnce(&mut FfiStore) -> Result<T, String>) -> Result<T, String> {
    let _guard = STORE_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    let db_path = resolve_db_path();
    let kv = SqliteKvStore::open(&db_path).map_err(|err| {
        warn!("event=ffi_store_open module=ffi status=error error={err}");
        format!("task DB open failed: {err}")
    })?;
    let mut store =
        TaskStore::open(kv, NoopReminders).map_err(|err| format!("task store load failed: {err}"))?;
    f(&mut store)
}
