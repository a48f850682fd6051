//! Task filtering: query criteria, free-text search and the reactive views.
//!
//! # Responsibility
//! - Provide pure predicates over task records.
//! - Recompute the combined filter view and the day view from snapshots.
//!
//! # Invariants
//! - Every recomputation starts from the full source sequence.
//! - Source order is preserved in every derived view.
//! - Date comparisons are lexicographic over zero-padded ISO-8601 strings.

mod pipeline;
mod query;

pub use pipeline::{day_view, FilterPipeline, TaskFilters};
pub use query::{search_tasks, TaskQuery};
