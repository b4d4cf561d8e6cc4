//! Port definitions for hexagonal architecture.
//!
//! These traits define the boundaries between the pipeline and external
//! adapters: the description model, checkpoint persistence, result output
//! and progress reporting.

mod checkpoint_store;
mod description;
mod output_sink;
mod progress;

pub use checkpoint_store::CheckpointStore;
pub use description::DescriptionService;
pub use output_sink::OutputSink;
pub use progress::{NoopProgressSink, ProgressEvent, ProgressSink};
