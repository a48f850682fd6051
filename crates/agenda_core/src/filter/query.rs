use crate::model::task::{Category, Priority, Task, TaskStatus};

/// Store-level filter criteria. Every `None` imposes no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    pub category: Option<Category>,
    pub priority: Option<Priority>,
    pub status: Option<TaskStatus>,
    /// Inclusive lower bound, ISO-8601 (`2025-11-01` or a full timestamp).
    pub due_from: Option<String>,
    /// Inclusive upper bound, ISO-8601.
    pub due_to: Option<String>,
}

impl TaskQuery {
    /// Returns whether `task` satisfies every supplied criterion.
    ///
    /// Tasks without a due timestamp are not constrained by the date range.
    pub fn matches(&self, task: &Task) -> bool {
        if self.category.is_some_and(|category| task.category != category) {
            return false;
        }
        if self.priority.is_some_and(|priority| task.priority != priority) {
            return false;
        }
        if self.status.is_some_and(|status| task.status != status) {
            return false;
        }
        if let Some(due) = task.due_at.as_deref() {
            if let Some(from) = self.due_from.as_deref() {
                if due_prefix(due, from) < from {
                    return false;
                }
            }
            if let Some(to) = self.due_to.as_deref() {
                if due_prefix(due, to) > to {
                    return false;
                }
            }
        }
        true
    }

    pub fn apply(&self, tasks: &[Task]) -> Vec<Task> {
        tasks
            .iter()
            .filter(|task| self.matches(task))
            .cloned()
            .collect()
    }
}

/// Case-insensitive substring search over title, description and notes.
///
/// A blank term returns every task.
pub fn search_tasks(tasks: &[Task], term: &str) -> Vec<Task> {
    let needle = normalize_term(term);
    tasks
        .iter()
        .filter(|task| matches_term(task, &needle))
        .cloned()
        .collect()
}

pub(crate) fn normalize_term(term: &str) -> String {
    term.trim().to_lowercase()
}

/// `needle` must already be normalized.
pub(crate) fn matches_term(task: &Task, needle: &str) -> bool {
    needle.is_empty() || task.search_haystack().contains(needle)
}

/// Prefix of `due` as long as `bound`, so a date bound covers the whole day.
fn due_prefix<'a>(due: &'a str, bound: &str) -> &'a str {
    due.get(..bound.len()).unwrap_or(due)
}

#[cfg(test)]
mod tests {
    use super::{search_tasks, TaskQuery};
    use crate::model::task::{Category, NewTask, Task};

    fn task(id: &str, due: Option<&str>) -> Task {
        let mut new = NewTask::new(id);
        new.due_at = due.map(str::to_string);
        Task::from_new(id, new).expect("valid task")
    }

    #[test]
    fn date_bounds_are_inclusive_by_day() {
        let tasks = vec![
            task("before", Some("2025-10-31T23:59:00.000Z")),
            task("first", Some("2025-11-01T00:00:00.000Z")),
            task("last", Some("2025-11-30T22:00:00.000Z")),
            task("after", Some("2025-12-01T08:00:00.000Z")),
            task("undated", None),
        ];
        let query = TaskQuery {
            due_from: Some("2025-11-01".to_string()),
            due_to: Some("2025-11-30".to_string()),
            ..TaskQuery::default()
        };

        let ids: Vec<_> = query.apply(&tasks).into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["first", "last", "undated"]);
    }

    #[test]
    fn criteria_combine_with_and() {
        let mut work = task("work", None);
        work.category = Category::Work;
        let tasks = vec![work, task("home", None)];
        let query = TaskQuery {
            category: Some(Category::Work),
            ..TaskQuery::default()
        };

        assert_eq!(query.apply(&tasks).len(), 1);
        assert_eq!(TaskQuery::default().apply(&tasks).len(), 2);
    }

    #[test]
    fn search_spans_fields_case_insensitively() {
        let mut with_notes = task("a", None);
        with_notes.title = "Groceries".to_string();
        with_notes.notes = Some("Oat MILK".to_string());
        let tasks = vec![with_notes, task("b", None)];

        assert_eq!(search_tasks(&tasks, "  milk ").len(), 1);
        assert_eq!(search_tasks(&tasks, "GROCER").len(), 1);
        assert_eq!(search_tasks(&tasks, "   ").len(), 2);
    }
}
