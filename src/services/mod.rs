//! Services coordinating the repository with presentation state.

pub mod records;

pub use records::{ActionOutcome, ImportSummary, ListState, RecordListController, ReloadOutcome};
