//! Task store use-cases.
//!
//! # Invariants
//! - New tasks are prepended; every other operation keeps relative order
//!   except `reorder`.
//! - `completed` follows `status` after every mutation (see `TaskPatch`).
//! - A task with `reminder_at` is (re)scheduled after create/update/import;
//!   a task without one has its reminder cancelled on update, delete and
//!   replace import.

use super::subscription::{SnapshotBroadcaster, TaskSubscription};
use super::{TaskError, TaskResult};
use crate::codec::{self, ImportMode, ImportSummary};
use crate::filter::{search_tasks, TaskQuery};
use crate::kv::DurableStore;
use crate::model::task::{generate_task_id, NewTask, Task, TaskPatch, TaskStatus};
use crate::reminder::ReminderScheduler;
use log::{debug, info, warn};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

/// Durable store key holding the task array.
pub const TASKS_KEY: &str = "tareas";

/// Owner of the task collection.
///
/// Takes its durable store and reminder scheduler explicitly; a value of
/// this type has always completed `load`.
pub struct TaskStore<S: DurableStore, R: ReminderScheduler> {
    kv: S,
    reminders: R,
    tasks: Vec<Task>,
    loaded: bool,
    broadcaster: SnapshotBroadcaster,
}

impl<S: DurableStore, R: ReminderScheduler> TaskStore<S, R> {
    /// Creates a store and loads the persisted collection.
    ///
    /// # Errors
    /// - `TaskError::Store` when the durable store cannot be read.
    pub fn open(kv: S, reminders: R) -> TaskResult<Self> {
        let mut store = Self {
            kv,
            reminders,
            tasks: Vec::new(),
            loaded: false,
            broadcaster: SnapshotBroadcaster::default(),
        };
        store.load()?;
        Ok(store)
    }

    /// Reads the persisted collection once.
    ///
    /// A missing or non-array value loads as empty; entries that fail record
    /// validation are skipped. Later calls are no-ops. On read failure the
    /// store stays unloaded so the call can be retried.
    pub fn load(&mut self) -> TaskResult<()> {
        if self.loaded {
            debug!("event=tasks_load module=store status=skip reason=already_loaded");
            return Ok(());
        }

        self.tasks = match self.kv.get(TASKS_KEY)? {
            Some(Value::Array(items)) => decode_persisted(items),
            Some(_) => {
                warn!("event=tasks_load module=store status=error error_code=not_an_array");
                Vec::new()
            }
            None => Vec::new(),
        };
        self.loaded = true;
        self.publish();
        info!(
            "event=tasks_load module=store status=ok count={}",
            self.tasks.len()
        );
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Current collection in display order.
    pub fn list(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn reminders(&self) -> &R {
        &self.reminders
    }

    /// Subscribes to collection snapshots, starting with the current one.
    pub fn subscribe(&mut self) -> TaskSubscription {
        let current = self.snapshot();
        self.broadcaster.subscribe(current)
    }

    /// Number of live subscriptions as of the last publish.
    pub fn subscriber_count(&self) -> usize {
        self.broadcaster.len()
    }

    /// Creates a task with a fresh id and puts it first.
    pub fn create(&mut self, new: NewTask) -> TaskResult<Task> {
        let task = Task::from_new(generate_task_id(), new)?;
        self.tasks.insert(0, task.clone());
        self.commit("task_create");
        self.schedule_reminder(&task);
        Ok(task)
    }

    /// Applies `patch` to the task with `id`.
    ///
    /// Returns `Ok(None)` when no task has that id.
    pub fn update(&mut self, id: &str, patch: TaskPatch) -> TaskResult<Option<Task>> {
        patch.validate()?;
        Ok(self.apply_patch(id, &patch))
    }

    /// Flips the completed flag; reopened tasks become `InProgress`.
    pub fn toggle_completed(&mut self, id: &str) -> Option<Task> {
        let completed = !self.get(id)?.completed();
        let patch = TaskPatch {
            completed: Some(completed),
            status: Some(TaskStatus::from_completed(completed)),
            ..TaskPatch::default()
        };
        self.apply_patch(id, &patch)
    }

    /// Sets or clears the due timestamp.
    pub fn reschedule(&mut self, id: &str, due_at: Option<String>) -> TaskResult<Option<Task>> {
        self.update(id, TaskPatch::due_at(due_at))
    }

    /// Removes the task with `id`. Its reminder is cancelled either way.
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        let removed = self.tasks.len() < before;
        if removed {
            self.commit("task_delete");
        } else {
            debug!("event=task_delete module=store status=skip reason=not_found");
        }
        self.cancel_reminder(id);
        removed
    }

    /// Moves the task at `from` to position `to`.
    ///
    /// # Errors
    /// - `IndexOutOfRange` when either index is outside the collection; the
    ///   collection is left unchanged.
    pub fn reorder(&mut self, from: usize, to: usize) -> TaskResult<()> {
        let len = self.tasks.len();
        for index in [from, to] {
            if index >= len {
                return Err(TaskError::IndexOutOfRange { index, len });
            }
        }

        let moved = self.tasks.remove(from);
        self.tasks.insert(to, moved);
        self.commit("task_reorder");
        Ok(())
    }

    /// Tasks matching every criterion of `query`, in display order.
    pub fn filter(&self, query: &TaskQuery) -> Vec<Task> {
        query.apply(&self.tasks)
    }

    /// Case-insensitive search over title, description and notes.
    pub fn search(&self, term: &str) -> Vec<Task> {
        search_tasks(&self.tasks, term)
    }

    /// Pretty JSON snapshot of the whole collection.
    pub fn export(&self) -> TaskResult<String> {
        Ok(codec::export_tasks(&self.tasks)?)
    }

    /// Imports a JSON array of tasks.
    ///
    /// Returns the number of records in `json`, not the resulting size.
    ///
    /// # Errors
    /// - `TaskError::Import` when the payload or any record is invalid; the
    ///   collection is left unchanged.
    pub fn import(&mut self, json: &str, mode: ImportMode) -> TaskResult<ImportSummary> {
        let imported = codec::decode_tasks(json)?;
        let inserted = imported.len();

        if mode == ImportMode::Replace {
            // Replaced records keep a reminder only if their imported copy has one.
            let rescheduled: HashSet<&str> = imported
                .iter()
                .filter(|task| task.reminder_at.is_some())
                .map(|task| task.id.as_str())
                .collect();
            for task in self
                .tasks
                .iter()
                .filter(|task| !rescheduled.contains(task.id.as_str()))
            {
                self.cancel_reminder(&task.id);
            }
        }
        for task in &imported {
            self.schedule_reminder(task);
        }

        self.tasks = codec::merge_imported(&self.tasks, imported, mode);
        self.commit("tasks_import");
        info!("event=tasks_import module=store status=ok mode={mode:?} inserted={inserted}");
        Ok(ImportSummary { inserted })
    }

    fn apply_patch(&mut self, id: &str, patch: &TaskPatch) -> Option<Task> {
        let Some(index) = self.tasks.iter().position(|task| task.id == id) else {
            debug!("event=task_update module=store status=skip reason=not_found");
            return None;
        };

        patch.apply_to(&mut self.tasks[index]);
        let updated = self.tasks[index].clone();
        self.commit("task_update");
        if updated.reminder_at.is_some() {
            self.schedule_reminder(&updated);
        } else {
            self.cancel_reminder(&updated.id);
        }
        Some(updated)
    }

    /// Publishes the new state, then issues persistence.
    fn commit(&mut self, event: &'static str) {
        self.publish();
        self.persist(event);
    }

    fn publish(&mut self) {
        let snapshot = self.snapshot();
        self.broadcaster.publish(snapshot);
    }

    fn snapshot(&self) -> Arc<[Task]> {
        Arc::from(self.tasks.as_slice())
    }

    fn persist(&self, event: &'static str) {
        let result = codec::encode_tasks(&self.tasks)
            .map_err(TaskError::from)
            .and_then(|value| self.kv.set(TASKS_KEY, &value).map_err(TaskError::from));
        match result {
            Ok(()) => debug!(
                "event={event} module=store status=ok count={}",
                self.tasks.len()
            ),
            Err(err) => warn!(
                "event={event} module=store status=error error_code=persist_failed error={err}"
            ),
        }
    }

    fn schedule_reminder(&self, task: &Task) {
        if task.reminder_at.is_none() {
            return;
        }
        if let Err(err) = self.reminders.schedule(task) {
            warn!("event=reminder_schedule module=store status=error error={err}");
        }
    }

    fn cancel_reminder(&self, id: &str) {
        if let Err(err) = self.reminders.cancel(id) {
            warn!("event=reminder_cancel module=store status=error error={err}");
        }
    }
}

fn decode_persisted(items: Vec<Value>) -> Vec<Task> {
    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match codec::decode_record(index, item) {
            Ok(task) => Some(task),
            Err(err) => {
                warn!("event=tasks_load module=store status=skip index={index} error={err}");
                None
            }
        })
        .collect()
}
