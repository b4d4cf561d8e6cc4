//! Live progress read model.
//!
//! The coordinator owns the only [`ProgressTracker`] and is the single
//! writer. Any number of readers hold [`ProgressHandle`]s and poll
//! [`ProgressHandle::snapshot`]; the lock guarantees they never observe a
//! partially updated state.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use serde::Serialize;

/// Run-level state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    #[default]
    Idle,
    Enumerating,
    Dispatching,
    Finalizing,
}

/// Point-in-time view of run progress.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    pub phase: RunPhase,
    /// Items dispatched in this run.
    pub total_items: usize,
    /// Items completed, successfully or not.
    pub processed_items: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Time since dispatch began (frozen once the run finishes).
    pub elapsed: Duration,
    /// `elapsed / processed_items`, once anything has completed.
    pub average_per_item: Option<Duration>,
}

impl ProgressSnapshot {
    /// Completed fraction in `0.0..=1.0`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> f64 {
        if self.total_items == 0 {
            0.0
        } else {
            self.processed_items as f64 / self.total_items as f64
        }
    }
}

#[derive(Debug, Default)]
struct ProgressState {
    phase: RunPhase,
    total: usize,
    processed: usize,
    succeeded: usize,
    failed: usize,
    started: Option<Instant>,
    frozen_elapsed: Option<Duration>,
}

impl ProgressState {
    fn snapshot(&self) -> ProgressSnapshot {
        let elapsed = self
            .frozen_elapsed
            .or_else(|| self.started.map(|s| s.elapsed()))
            .unwrap_or_default();
        let average_per_item = u32::try_from(self.processed)
            .ok()
            .filter(|&n| n > 0)
            .map(|n| elapsed / n);

        ProgressSnapshot {
            phase: self.phase,
            total_items: self.total,
            processed_items: self.processed,
            succeeded: self.succeeded,
            failed: self.failed,
            elapsed,
            average_per_item,
        }
    }
}

/// Writer side of the progress read model.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    state: Arc<RwLock<ProgressState>>,
}

impl ProgressTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a read-only handle sharing this tracker's state.
    #[must_use]
    pub fn handle(&self) -> ProgressHandle {
        ProgressHandle {
            state: Arc::clone(&self.state),
        }
    }

    pub(crate) fn set_phase(&self, phase: RunPhase) {
        self.write(|s| s.phase = phase);
    }

    /// Drops the previous run's counters and clock.
    pub(crate) fn reset(&self, phase: RunPhase) {
        self.write(|s| {
            *s = ProgressState {
                phase,
                ..ProgressState::default()
            };
        });
    }

    /// Resets counters and starts the clock for a run of `total` items.
    pub(crate) fn begin(&self, total: usize) {
        self.write(|s| {
            *s = ProgressState {
                phase: RunPhase::Dispatching,
                total,
                started: Some(Instant::now()),
                ..ProgressState::default()
            };
        });
    }

    /// Counts one completed item and returns the updated snapshot.
    pub(crate) fn record(&self, success: bool) -> ProgressSnapshot {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.processed += 1;
        if success {
            state.succeeded += 1;
        } else {
            state.failed += 1;
        }
        state.snapshot()
    }

    /// Freezes the clock and returns to idle.
    pub(crate) fn finish(&self) -> ProgressSnapshot {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.frozen_elapsed = Some(state.started.map(|s| s.elapsed()).unwrap_or_default());
        state.phase = RunPhase::Idle;
        state.snapshot()
    }

    fn write(&self, f: impl FnOnce(&mut ProgressState)) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut state);
    }
}

/// Reader side of the progress read model. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ProgressHandle {
    state: Arc<RwLock<ProgressState>>,
}

impl ProgressHandle {
    /// Returns a consistent snapshot computed at the moment of the call.
    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot()
    }
}
