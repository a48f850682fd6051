//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical task record shared by store, filters and codec.
//! - Own the wire shape used for persistence and import/export.
//!
//! # Invariants
//! - Every task is identified by a stable, non-empty `TaskId`.
//! - `completed` is derived from `status` and never stored separately.

pub mod task;
