//! Reminder scheduler over a platform notification backend.

use super::{notification_id, ReminderError, ReminderScheduler};
use crate::model::task::Task;
use log::{debug, warn};

/// Notification title shown for every task reminder.
pub const REMINDER_TITLE: &str = "Recordatorio";

/// One platform notification request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderRequest {
    pub notification_id: i32,
    pub title: String,
    /// Task title.
    pub body: String,
    /// ISO-8601 fire time.
    pub at: String,
}

impl ReminderRequest {
    /// Builds the request for `task`, or `None` when it has no reminder.
    pub fn for_task(task: &Task) -> Option<Self> {
        let at = task.reminder_at.as_ref()?;
        Some(Self {
            notification_id: notification_id(&task.id),
            title: REMINDER_TITLE.to_string(),
            body: task.title.clone(),
            at: at.clone(),
        })
    }
}

/// Platform local-notification plugin.
pub trait NotificationBackend {
    /// Whether the plugin exists and permission was granted.
    fn is_available(&self) -> bool;
    fn schedule(&self, request: &ReminderRequest) -> Result<(), ReminderError>;
    fn cancel(&self, notification_id: i32) -> Result<(), ReminderError>;
}

/// Best-effort [`ReminderScheduler`] over a [`NotificationBackend`].
///
/// Unavailable backends turn every call into a no-op; backend failures are
/// logged and swallowed.
pub struct ReminderService<B: NotificationBackend> {
    backend: B,
}

impl<B: NotificationBackend> ReminderService<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: NotificationBackend> ReminderScheduler for ReminderService<B> {
    fn schedule(&self, task: &Task) -> Result<(), ReminderError> {
        if !self.backend.is_available() {
            debug!("event=reminder_schedule module=reminder status=skip reason=unavailable");
            return Ok(());
        }
        let Some(request) = ReminderRequest::for_task(task) else {
            return Ok(());
        };

        if let Err(err) = self.backend.schedule(&request) {
            warn!(
                "event=reminder_schedule module=reminder status=error notification_id={} error={err}",
                request.notification_id
            );
        }
        Ok(())
    }

    fn cancel(&self, task_id: &str) -> Result<(), ReminderError> {
        if !self.backend.is_available() {
            return Ok(());
        }
        let id = notification_id(task_id);
        if let Err(err) = self.backend.cancel(id) {
            warn!("event=reminder_cancel module=reminder status=error notification_id={id} error={err}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{NotificationBackend, ReminderRequest, ReminderService, REMINDER_TITLE};
    use crate::model::task::{NewTask, Task};
    use crate::reminder::{notification_id, ReminderError, ReminderScheduler};
    use std::cell::RefCell;

    #[derive(Default)]
    struct FakeBackend {
        available: bool,
        fail: bool,
        scheduled: RefCell<Vec<ReminderRequest>>,
        cancelled: RefCell<Vec<i32>>,
    }

    impl NotificationBackend for FakeBackend {
        fn is_available(&self) -> bool {
            self.available
        }

        fn schedule(&self, request: &ReminderRequest) -> Result<(), ReminderError> {
            if self.fail {
                return Err(ReminderError::Platform("boom".to_string()));
            }
            self.scheduled.borrow_mut().push(request.clone());
            Ok(())
        }

        fn cancel(&self, notification_id: i32) -> Result<(), ReminderError> {
            self.cancelled.borrow_mut().push(notification_id);
            Ok(())
        }
    }

    fn task_with_reminder() -> Task {
        Task::from_new(
            "task-1",
            NewTask::new("call mom").with_reminder_at("2025-11-11T08:00:00.000Z"),
        )
        .expect("valid task")
    }

    #[test]
    fn schedule_builds_request_from_task() {
        let service = ReminderService::new(FakeBackend {
            available: true,
            ..FakeBackend::default()
        });

        service.schedule(&task_with_reminder()).expect("schedule should succeed");

        let scheduled = service.backend().scheduled.borrow();
        assert_eq!(scheduled.len(), 1);
        assert_eq!(scheduled[0].notification_id, notification_id("task-1"));
        assert_eq!(scheduled[0].title, REMINDER_TITLE);
        assert_eq!(scheduled[0].body, "call mom");
        assert_eq!(scheduled[0].at, "2025-11-11T08:00:00.000Z");
    }

    #[test]
    fn schedule_skips_tasks_without_reminder_and_unavailable_backend() {
        let available = ReminderService::new(FakeBackend {
            available: true,
            ..FakeBackend::default()
        });
        let plain = Task::from_new("task-2", NewTask::new("no reminder")).expect("valid task");
        available.schedule(&plain).expect("plain task schedule should be a no-op");
        assert!(available.backend().scheduled.borrow().is_empty());

        let unavailable = ReminderService::new(FakeBackend::default());
        unavailable.schedule(&task_with_reminder()).expect("unavailable backend should be skipped");
        unavailable.cancel("task-1").expect("unavailable backend should be skipped");
        assert!(unavailable.backend().scheduled.borrow().is_empty());
        assert!(unavailable.backend().cancelled.borrow().is_empty());
    }

    #[test]
    fn backend_failures_are_swallowed() {
        let service = ReminderService::new(FakeBackend {
            available: true,
            fail: true,
            ..FakeBackend::default()
        });
        assert!(service.schedule(&task_with_reminder()).is_ok());
    }
}
