//! Core domain types for batch image description.

mod checkpoint;
mod config;
mod outcome;
mod summary;
mod work_item;

pub use checkpoint::CheckpointSet;
pub use config::{RunConfig, DEFAULT_PROMPT};
pub use outcome::{ErrorClass, FailureKind, OutputRecord, Outcome, RECORD_SEPARATOR};
pub use summary::{RunStatus, RunSummary};
pub use work_item::WorkItem;
