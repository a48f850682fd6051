//! Core domain logic for Agenda.
//! This crate is the single source of truth for task invariants.

pub mod codec;
pub mod db;
pub mod filter;
pub mod kv;
pub mod logging;
pub mod model;
pub mod reminder;
pub mod store;

pub use codec::{CodecError, ImportMode, ImportSummary};
pub use filter::{day_view, search_tasks, FilterPipeline, TaskFilters, TaskQuery};
pub use kv::{DurableStore, KvError, KvResult, MemoryKvStore, SqliteKvStore, WriteBehindStore};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::task::{
    generate_task_id, Category, NewTask, Priority, Task, TaskId, TaskPatch, TaskStatus,
    TaskValidationError,
};
pub use reminder::{
    notification_id, NoopReminders, NotificationBackend, ReminderError, ReminderRequest,
    ReminderScheduler, ReminderService,
};
pub use store::{TaskError, TaskResult, TaskStore, TaskSubscription, TASKS_KEY};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
