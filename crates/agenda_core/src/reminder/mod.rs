//! Reminder scheduling contract.
//!
//! # Responsibility
//! - Define the best-effort schedule/cancel capability the task store drives.
//! - Derive stable platform notification ids from task ids.
//!
//! # Invariants
//! - `schedule` is a no-op for tasks without `reminder_at`.
//! - `cancel` is idempotent and safe for ids that were never scheduled.
//! - `notification_id` is deterministic and never negative.

use crate::model::task::Task;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod service;

pub use service::{NotificationBackend, ReminderRequest, ReminderService, REMINDER_TITLE};

/// Platform notification failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderError {
    /// Notification permission was not granted.
    PermissionDenied,
    /// Platform plugin rejected the request.
    Platform(String),
}

impl Display for ReminderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PermissionDenied => write!(f, "notification permission denied"),
            Self::Platform(message) => write!(f, "notification platform error: {message}"),
        }
    }
}

impl Error for ReminderError {}

/// Schedules and cancels one-shot task reminders.
pub trait ReminderScheduler {
    fn schedule(&self, task: &Task) -> Result<(), ReminderError>;
    fn cancel(&self, task_id: &str) -> Result<(), ReminderError>;
}

impl<R: ReminderScheduler + ?Sized> ReminderScheduler for Box<R> {
    fn schedule(&self, task: &Task) -> Result<(), ReminderError> {
        (**self).schedule(task)
    }

    fn cancel(&self, task_id: &str) -> Result<(), ReminderError> {
        (**self).cancel(task_id)
    }
}

/// Scheduler for platforms without local notifications.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReminders;

impl ReminderScheduler for NoopReminders {
    fn schedule(&self, _task: &Task) -> Result<(), ReminderError> {
        Ok(())
    }

    fn cancel(&self, _task_id: &str) -> Result<(), ReminderError> {
        Ok(())
    }
}

/// Folds a task id into a positive 32-bit notification id.
///
/// Uses the `h = h * 31 + unit` string hash over UTF-16 code units with
/// 32-bit wraparound, so ids match notifications scheduled by earlier app
/// versions.
pub fn notification_id(task_id: &str) -> i32 {
    let hash = task_id
        .encode_utf16()
        .fold(0_i32, |hash, unit| {
            hash.wrapping_mul(31).wrapping_add(i32::from(unit))
        });
    (hash % i32::MAX).abs()
}

#[cfg(test)]
mod tests {
    use super::notification_id;

    #[test]
    fn notification_id_matches_string_hash() {
        assert_eq!(notification_id(""), 0);
        assert_eq!(notification_id("a"), 97);
        assert_eq!(notification_id("ab"), 97 * 31 + 98);
    }

    #[test]
    fn notification_id_is_stable_and_non_negative() {
        let id = "m3k2p9-4f8a1c-long-identifier-with-overflow";
        assert_eq!(notification_id(id), notification_id(id));
        assert!(notification_id(id) >= 0);
        assert!(notification_id("0b6c1c2e-9d6f-4b7e-8a44-2f1f3c0d9e71") >= 0);
    }
}
