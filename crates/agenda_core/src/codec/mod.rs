//! JSON import/export of task collections.
//!
//! # Responsibility
//! - Serialize collections to the pretty JSON exchange format.
//! - Parse untrusted JSON into validated records, filling missing ids.
//! - Combine imported records with an existing collection.
//!
//! # Invariants
//! - Export followed by import reproduces ids, field values and order.
//! - Import never overwrites an identifier that is present.
//! - Merge does not deduplicate; importing the same file twice duplicates.

mod json;

pub use json::{
    decode_record, decode_tasks, encode_tasks, export_tasks, merge_imported, CodecError,
    ImportMode, ImportSummary,
};
