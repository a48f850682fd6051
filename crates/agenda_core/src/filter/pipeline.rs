use super::query::{matches_term, normalize_term};
use crate::model::task::{Category, Priority, Task, TaskStatus, ISO_DATE_LEN};
use crate::store::TaskSubscription;
use std::sync::Arc;

/// List-screen filter selections. Empty selections impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilters {
    pub category: Option<Category>,
    pub priority: Option<Priority>,
    pub status: Option<TaskStatus>,
    /// Free-text term; trimmed and lowercased before matching.
    pub term: String,
}

impl TaskFilters {
    pub fn is_empty(&self) -> bool {
        self.category.is_none()
            && self.priority.is_none()
            && self.status.is_none()
            && self.term.trim().is_empty()
    }

    /// Tasks passing every active selection, in source order.
    pub fn apply(&self, tasks: &[Task]) -> Vec<Task> {
        let needle = normalize_term(&self.term);
        tasks
            .iter()
            .filter(|task| {
                self.category.map_or(true, |category| task.category == category)
                    && self.priority.map_or(true, |priority| task.priority == priority)
                    && self.status.map_or(true, |status| task.status == status)
                    && matches_term(task, &needle)
            })
            .cloned()
            .collect()
    }
}

/// Tasks due on `date` (`YYYY-MM-DD`). Undated tasks are excluded.
pub fn day_view(tasks: &[Task], date: &str) -> Vec<Task> {
    let Some(date) = date.trim().get(..ISO_DATE_LEN) else {
        return Vec::new();
    };
    tasks
        .iter()
        .filter(|task| task.due_date() == Some(date))
        .cloned()
        .collect()
}

/// Reactive list state: the last collection snapshot plus the current
/// selections, with both derived views kept up to date.
///
/// Every input change recomputes from the full snapshot, never from the
/// previous view.
#[derive(Debug, Clone)]
pub struct FilterPipeline {
    source: Arc<[Task]>,
    filters: TaskFilters,
    selected_date: Option<String>,
    filtered: Vec<Task>,
    day: Vec<Task>,
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::new(Arc::from(Vec::new()))
    }
}

impl FilterPipeline {
    pub fn new(source: Arc<[Task]>) -> Self {
        let mut pipeline = Self {
            source,
            filters: TaskFilters::default(),
            selected_date: None,
            filtered: Vec::new(),
            day: Vec::new(),
        };
        pipeline.recompute();
        pipeline
    }

    /// Pulls the newest snapshot from `subscription`.
    ///
    /// Returns whether a snapshot was applied.
    pub fn follow(&mut self, subscription: &TaskSubscription) -> bool {
        match subscription.latest() {
            Some(snapshot) => {
                self.set_tasks(snapshot);
                true
            }
            None => false,
        }
    }

    pub fn set_tasks(&mut self, source: Arc<[Task]>) {
        self.source = source;
        self.recompute();
    }

    pub fn set_category(&mut self, category: Option<Category>) {
        self.filters.category = category;
        self.recompute();
    }

    pub fn set_priority(&mut self, priority: Option<Priority>) {
        self.filters.priority = priority;
        self.recompute();
    }

    pub fn set_status(&mut self, status: Option<TaskStatus>) {
        self.filters.status = status;
        self.recompute();
    }

    pub fn set_term(&mut self, term: impl Into<String>) {
        self.filters.term = term.into();
        self.recompute();
    }

    pub fn set_filters(&mut self, filters: TaskFilters) {
        self.filters = filters;
        self.recompute();
    }

    pub fn clear_filters(&mut self) {
        self.set_filters(TaskFilters::default());
    }

    /// Selects the calendar day for the day view; `None` empties it.
    pub fn select_date(&mut self, date: Option<String>) {
        self.selected_date = date;
        self.recompute();
    }

    pub fn filters(&self) -> &TaskFilters {
        &self.filters
    }

    pub fn selected_date(&self) -> Option<&str> {
        self.selected_date.as_deref()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.source
    }

    /// Combined category/priority/status/term view.
    pub fn filtered(&self) -> &[Task] {
        &self.filtered
    }

    /// Tasks due on the selected date.
    pub fn day(&self) -> &[Task] {
        &self.day
    }

    fn recompute(&mut self) {
        self.filtered = self.filters.apply(&self.source);
        self.day = match self.selected_date.as_deref() {
            Some(date) => day_view(&self.source, date),
            None => Vec::new(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::{day_view, FilterPipeline, TaskFilters};
    use crate::model::task::{Category, NewTask, Priority, Task};
    use std::sync::Arc;

    fn task(id: &str, category: Category, priority: Priority) -> Task {
        Task::from_new(
            id,
            NewTask::new(format!("task {id}"))
                .with_category(category)
                .with_priority(priority),
        )
        .expect("valid task")
    }

    #[test]
    fn empty_filters_keep_everything_in_order() {
        let tasks = vec![
            task("a", Category::Work, Priority::Low),
            task("b", Category::Social, Priority::High),
        ];
        assert!(TaskFilters::default().is_empty());
        assert_eq!(TaskFilters::default().apply(&tasks), tasks);
    }

    #[test]
    fn widening_a_filter_recomputes_from_the_full_snapshot() {
        let tasks: Arc<[Task]> = Arc::from(vec![
            task("a", Category::Work, Priority::High),
            task("b", Category::Work, Priority::Low),
            task("c", Category::Personal, Priority::High),
        ]);
        let mut pipeline = FilterPipeline::new(tasks);

        pipeline.set_category(Some(Category::Work));
        pipeline.set_priority(Some(Priority::High));
        assert_eq!(pipeline.filtered().len(), 1);

        pipeline.set_category(None);
        let ids: Vec<_> = pipeline.filtered().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn day_view_ignores_malformed_dates() {
        let mut dated = task("a", Category::Work, Priority::Low);
        dated.due_at = Some("2025-11-11T10:00:00.000Z".to_string());
        let tasks = vec![dated];

        assert_eq!(day_view(&tasks, "2025-11-11").len(), 1);
        assert_eq!(day_view(&tasks, "2025-11-11T00:00:00Z").len(), 1);
        assert!(day_view(&tasks, "2025").is_empty());
    }
}
