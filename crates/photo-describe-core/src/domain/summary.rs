//! Run summary returned to the presentation layer.

use std::path::PathBuf;
use std::time::Duration;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every image in the folder was already checkpointed.
    NothingToDo,
    /// All pending images were processed. Individual items may have failed.
    Completed,
}

/// Totals for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub status: RunStatus,
    /// Images matching the extension allow-list.
    pub found: usize,
    /// Images skipped because the checkpoint already lists them.
    pub already_done: usize,
    /// Images dispatched in this run.
    pub pending: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Record appends or checkpoint saves that failed during the run.
    pub persistence_errors: usize,
    pub elapsed: Duration,
    /// Where results were written.
    pub output: PathBuf,
}

impl RunSummary {
    /// Whether any item failed in this run.
    #[must_use]
    pub const fn has_failures(&self) -> bool {
        self.failed > 0
    }
}
