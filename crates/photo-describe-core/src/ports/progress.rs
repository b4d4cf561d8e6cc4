//! Progress reporting port for UI integration.

use std::path::PathBuf;

use crate::domain::{Outcome, RunSummary};
use crate::tracker::ProgressSnapshot;

/// Events emitted while a batch runs.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Dispatch is about to begin.
    Started {
        /// Images pending in this run.
        total: usize,
        /// Images skipped because they were already checkpointed.
        already_done: usize,
        /// Worker threads in the pool.
        workers: usize,
    },
    /// Every image in the folder was already described.
    NothingToDo {
        /// Images found in the folder.
        found: usize,
    },
    /// One image finished, successfully or not.
    ItemCompleted {
        /// Identifier of the image.
        name: String,
        /// What happened to it.
        outcome: Outcome,
        /// Progress after this completion.
        snapshot: ProgressSnapshot,
    },
    /// The checkpoint was written.
    CheckpointSaved {
        /// Entries in the saved set.
        entries: usize,
    },
    /// A record or checkpoint write failed.
    PersistenceFailed {
        /// File that could not be written.
        location: PathBuf,
        /// Error text.
        reason: String,
    },
    /// The run is over.
    Finished {
        /// Final totals.
        summary: RunSummary,
    },
}

/// Port for receiving progress events.
pub trait ProgressSink: Send + Sync {
    /// Called when a progress event occurs.
    fn on_event(&self, event: ProgressEvent);
}

/// Sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgressSink;

impl ProgressSink for NoopProgressSink {
    fn on_event(&self, _event: ProgressEvent) {}
}
