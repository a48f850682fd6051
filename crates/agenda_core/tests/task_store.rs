use agenda_core::{
    DurableStore, ImportMode, KvError, KvResult, MemoryKvStore, NewTask, NoopReminders,
    Priority, ReminderError, ReminderScheduler, Task, TaskError, TaskPatch, TaskStatus,
    TaskStore, TaskValidationError, TASKS_KEY,
};
use serde_json::{json, Value};
use std::cell::RefCell;

#[derive(Debug, Clone, PartialEq, Eq)]
enum ReminderCall {
    Schedule(String),
    Cancel(String),
}

#[derive(Default)]
struct RecordingReminders {
    calls: RefCell<Vec<ReminderCall>>,
}

impl RecordingReminders {
    fn take(&self) -> Vec<ReminderCall> {
        self.calls.borrow_mut().drain(..).collect()
    }
}

impl ReminderScheduler for RecordingReminders {
    fn schedule(&self, task: &Task) -> Result<(), ReminderError> {
        self.calls
            .borrow_mut()
            .push(ReminderCall::Schedule(task.id.clone()));
        Ok(())
    }

    fn cancel(&self, task_id: &str) -> Result<(), ReminderError> {
        self.calls
            .borrow_mut()
            .push(ReminderCall::Cancel(task_id.to_string()));
        Ok(())
    }
}

struct FailingWrites;

impl DurableStore for FailingWrites {
    fn get(&self, _key: &str) -> KvResult<Option<Value>> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: &Value) -> KvResult<()> {
        Err(KvError::Unavailable("disk full".to_string()))
    }
}

fn store_with(tasks: Value) -> TaskStore<MemoryKvStore, RecordingReminders> {
    let kv = MemoryKvStore::with_entry(TASKS_KEY, tasks);
    TaskStore::open(kv, RecordingReminders::default()).unwrap()
}

fn ids(tasks: &[Task]) -> Vec<&str> {
    tasks.iter().map(|task| task.id.as_str()).collect()
}

#[test]
fn create_prepends_and_persists() {
    let kv = MemoryKvStore::new();
    let mut store = TaskStore::open(kv.clone(), NoopReminders).unwrap();
    store.create(NewTask::new("first")).unwrap();

    let created = store
        .create(NewTask::new("second").with_status(TaskStatus::Completed))
        .unwrap();

    assert_eq!(store.len(), 2);
    assert_eq!(store.list()[0], created);
    assert!(created.completed());
    assert!(!created.id.is_empty());

    let persisted = kv.get(TASKS_KEY).unwrap().unwrap();
    assert_eq!(persisted[0]["id"], json!(created.id));
    assert_eq!(persisted[0]["completada"], json!(true));
    assert_eq!(persisted.as_array().unwrap().len(), 2);
}

#[test]
fn create_rejects_blank_title_and_bad_timestamps() {
    let mut store = TaskStore::open(MemoryKvStore::new(), NoopReminders).unwrap();

    let err = store.create(NewTask::new("   ")).unwrap_err();
    assert!(matches!(
        err,
        TaskError::Validation(TaskValidationError::EmptyTitle)
    ));

    let err = store
        .create(NewTask::new("x").with_due_at("tomorrow"))
        .unwrap_err();
    assert!(matches!(
        err,
        TaskError::Validation(TaskValidationError::InvalidTimestamp { .. })
    ));
    assert!(store.is_empty());
}

#[test]
fn update_status_keeps_completed_in_sync() {
    let mut store = store_with(json!([
        {"id": "a", "titulo": "Buy milk", "estado": "inicial", "prioridad": "media", "categoria": "personal", "completada": false}
    ]));

    let updated = store
        .update("a", TaskPatch::status(TaskStatus::Completed))
        .unwrap()
        .unwrap();
    assert!(updated.completed());
    assert_eq!(updated.status, TaskStatus::Completed);

    let reopened = store
        .update("a", TaskPatch::status(TaskStatus::Initial))
        .unwrap()
        .unwrap();
    assert!(!reopened.completed());
}

#[test]
fn update_unknown_id_is_a_silent_miss() {
    let mut store = store_with(json!([{"id": "a", "titulo": "x"}]));
    let result = store
        .update("missing", TaskPatch::status(TaskStatus::Completed))
        .unwrap();
    assert!(result.is_none());
    assert!(store.reminders().take().is_empty());
}

#[test]
fn update_schedules_or_cancels_reminder() {
    let mut store = store_with(json!([{"id": "a", "titulo": "x"}]));

    let with_reminder = TaskPatch {
        reminder_at: Some(Some("2025-11-11T08:00:00.000Z".to_string())),
        ..TaskPatch::default()
    };
    store.update("a", with_reminder).unwrap();
    assert_eq!(
        store.reminders().take(),
        vec![ReminderCall::Schedule("a".to_string())]
    );

    let cleared = TaskPatch {
        reminder_at: Some(None),
        priority: Some(Priority::High),
        ..TaskPatch::default()
    };
    let updated = store.update("a", cleared).unwrap().unwrap();
    assert_eq!(updated.reminder_at, None);
    assert_eq!(updated.priority, Priority::High);
    assert_eq!(
        store.reminders().take(),
        vec![ReminderCall::Cancel("a".to_string())]
    );
}

#[test]
fn create_with_reminder_schedules_it() {
    let mut store = TaskStore::open(MemoryKvStore::new(), RecordingReminders::default()).unwrap();
    let plain = store.create(NewTask::new("plain")).unwrap();
    let reminded = store
        .create(NewTask::new("call").with_reminder_at("2025-11-11T08:00"))
        .unwrap();

    let calls = store.reminders().take();
    assert_eq!(calls, vec![ReminderCall::Schedule(reminded.id)]);
    assert!(!calls.contains(&ReminderCall::Schedule(plain.id)));
}

#[test]
fn delete_is_idempotent_and_always_cancels() {
    let kv = MemoryKvStore::with_entry(
        TASKS_KEY,
        json!([{"id": "a", "titulo": "x"}, {"id": "b", "titulo": "y"}]),
    );
    let mut store = TaskStore::open(kv.clone(), RecordingReminders::default()).unwrap();

    assert!(store.delete("a"));
    assert!(!store.delete("a"));
    assert_eq!(ids(store.list()), vec!["b"]);
    assert_eq!(
        store.reminders().take(),
        vec![
            ReminderCall::Cancel("a".to_string()),
            ReminderCall::Cancel("a".to_string()),
        ]
    );
    assert_eq!(kv.get(TASKS_KEY).unwrap().unwrap().as_array().unwrap().len(), 1);
}

#[test]
fn toggle_completed_is_its_own_inverse_after_first_start() {
    let mut store = store_with(json!([{"id": "a", "titulo": "x", "estado": "en_ejecucion"}]));

    let done = store.toggle_completed("a").unwrap();
    assert!(done.completed());
    assert_eq!(done.status, TaskStatus::Completed);

    let reopened = store.toggle_completed("a").unwrap();
    assert!(!reopened.completed());
    assert_eq!(reopened.status, TaskStatus::InProgress);

    assert!(store.toggle_completed("missing").is_none());
}

#[test]
fn toggle_never_reverts_to_initial() {
    let mut store = store_with(json!([{"id": "a", "titulo": "x"}]));
    store.toggle_completed("a").unwrap();
    let reopened = store.toggle_completed("a").unwrap();
    assert_eq!(reopened.status, TaskStatus::InProgress);
}

#[test]
fn reschedule_sets_and_clears_due_date() {
    let mut store = store_with(json!([{"id": "a", "titulo": "x"}]));

    let moved = store
        .reschedule("a", Some("2025-12-01T10:00:00.000Z".to_string()))
        .unwrap()
        .unwrap();
    assert_eq!(moved.due_date(), Some("2025-12-01"));

    let cleared = store.reschedule("a", None).unwrap().unwrap();
    assert_eq!(cleared.due_at, None);
}

#[test]
fn reorder_moves_last_to_front() {
    let mut store = store_with(json!([
        {"id": "x", "titulo": "X"},
        {"id": "y", "titulo": "Y"},
        {"id": "z", "titulo": "Z"}
    ]));

    store.reorder(2, 0).unwrap();
    assert_eq!(ids(store.list()), vec!["z", "x", "y"]);
    assert!(store.reminders().take().is_empty());
}

#[test]
fn reorder_rejects_out_of_range_indices() {
    let mut store = store_with(json!([{"id": "x", "titulo": "X"}]));
    let err = store.reorder(0, 3).unwrap_err();
    assert!(matches!(err, TaskError::IndexOutOfRange { index: 3, len: 1 }));
    assert_eq!(ids(store.list()), vec!["x"]);
}

#[test]
fn persistence_failures_do_not_fail_mutations() {
    let mut store = TaskStore::open(FailingWrites, NoopReminders).unwrap();
    let created = store.create(NewTask::new("still here")).unwrap();
    assert_eq!(store.get(&created.id), Some(&created));
    assert!(store.delete(&created.id));
}

#[test]
fn subscribers_see_current_snapshot_then_every_mutation() {
    let mut store = store_with(json!([{"id": "a", "titulo": "x"}]));
    let subscription = store.subscribe();

    assert_eq!(subscription.try_recv().unwrap().len(), 1);

    store.create(NewTask::new("new")).unwrap();
    store.delete("a");

    assert_eq!(subscription.try_recv().unwrap().len(), 2);
    let latest = subscription.try_recv().unwrap();
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].title, "new");
    assert!(subscription.try_recv().is_none());
}

#[test]
fn merge_import_schedules_imported_reminders() {
    let mut store = store_with(json!([{"id": "a", "titulo": "x"}]));

    store
        .import(
            r#"[{"id":"r","titulo":"call","recordatorio":"2025-11-11T08:00:00.000Z"},{"id":"p","titulo":"plain"}]"#,
            ImportMode::Merge,
        )
        .unwrap();

    assert_eq!(
        store.reminders().take(),
        vec![ReminderCall::Schedule("r".to_string())]
    );
}

#[test]
fn replace_import_cancels_reminders_of_removed_tasks() {
    let mut store = store_with(json!([
        {"id": "gone", "titulo": "old", "recordatorio": "2025-11-11T08:00:00.000Z"}
    ]));

    store
        .import(r#"[{"id":"new","titulo":"fresh"}]"#, ImportMode::Replace)
        .unwrap();

    let calls = store.reminders().take();
    assert!(calls.contains(&ReminderCall::Cancel("gone".to_string())));
    assert!(!calls.contains(&ReminderCall::Schedule("new".to_string())));
}

#[test]
fn replace_import_cancels_reminder_dropped_from_same_id() {
    let mut store = store_with(json!([
        {"id": "a", "titulo": "x", "recordatorio": "2025-11-11T08:00:00.000Z"}
    ]));

    store
        .import(r#"[{"id":"a","titulo":"x"}]"#, ImportMode::Replace)
        .unwrap();

    assert_eq!(store.get("a").unwrap().reminder_at, None);
    assert_eq!(
        store.reminders().take(),
        vec![ReminderCall::Cancel("a".to_string())]
    );
}

#[test]
fn replace_import_keeps_reminder_carried_by_imported_copy() {
    let mut store = store_with(json!([
        {"id": "a", "titulo": "x", "recordatorio": "2025-11-11T08:00:00.000Z"}
    ]));

    store
        .import(
            r#"[{"id":"a","titulo":"x","recordatorio":"2025-11-12T08:00:00.000Z"}]"#,
            ImportMode::Replace,
        )
        .unwrap();

    assert_eq!(
        store.reminders().take(),
        vec![ReminderCall::Schedule("a".to_string())]
    );
}
