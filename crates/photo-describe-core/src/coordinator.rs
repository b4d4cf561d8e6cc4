//! Batch coordinator: enumeration, bounded dispatch and aggregation.
//!
//! Workers only run the [`ItemProcessor`] and send `(item, outcome)` pairs
//! back over a channel. The calling thread drains that channel and is the
//! only writer of the checkpoint set, the output sink and the progress
//! tracker, so none of them need fine-grained locking.

use std::any::Any;
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::domain::{
    CheckpointSet, FailureKind, Outcome, OutputRecord, RunConfig, RunStatus, RunSummary, WorkItem,
};
use crate::error::BatchError;
use crate::ports::{
    CheckpointStore, DescriptionService, NoopProgressSink, OutputSink, ProgressEvent, ProgressSink,
};
use crate::processor::ItemProcessor;
use crate::scan::{enumerate_folder, pending_items};
use crate::tracker::{ProgressHandle, ProgressTracker, RunPhase};

/// Drives one folder through the description pipeline.
pub struct BatchCoordinator {
    processor: ItemProcessor,
    checkpoint: Arc<dyn CheckpointStore>,
    sink: Arc<dyn OutputSink>,
    events: Arc<dyn ProgressSink>,
    tracker: ProgressTracker,
    parallelism: usize,
    run_lock: Mutex<()>,
}

/// Mutable bookkeeping owned by the coordinating thread during dispatch.
struct Aggregate {
    checkpoint: CheckpointSet,
    completed: usize,
    succeeded: usize,
    failed: usize,
    persistence_errors: usize,
}

impl BatchCoordinator {
    /// Creates a coordinator with no progress listener and the machine's
    /// available parallelism as the worker hint.
    #[must_use]
    pub fn new(
        service: Arc<dyn DescriptionService>,
        checkpoint: Arc<dyn CheckpointStore>,
        sink: Arc<dyn OutputSink>,
    ) -> Self {
        let parallelism = thread::available_parallelism().map_or(1, NonZeroUsize::get);
        Self {
            processor: ItemProcessor::new(service),
            checkpoint,
            sink,
            events: Arc::new(NoopProgressSink),
            tracker: ProgressTracker::new(),
            parallelism,
            run_lock: Mutex::new(()),
        }
    }

    /// Sets the listener for push-style progress events.
    #[must_use]
    pub fn with_progress_sink(mut self, events: Arc<dyn ProgressSink>) -> Self {
        self.events = events;
        self
    }

    /// Overrides the hardware concurrency hint used to size the pool.
    #[must_use]
    pub fn with_parallelism_hint(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism;
        self
    }

    /// Read-only handle for polling progress from other threads.
    #[must_use]
    pub fn progress(&self) -> ProgressHandle {
        self.tracker.handle()
    }

    /// Where results are written.
    #[must_use]
    pub fn output_location(&self) -> &Path {
        self.sink.location()
    }

    /// Where the checkpoint is stored.
    #[must_use]
    pub fn checkpoint_location(&self) -> &Path {
        self.checkpoint.location()
    }

    /// Describes every image in `folder` that the checkpoint does not list.
    ///
    /// Runs on one coordinator are serialized. Items that fail are written
    /// to the output and counted; they never abort the run.
    ///
    /// # Errors
    ///
    /// Fails before dispatch if the folder cannot be read, the checkpoint
    /// cannot be loaded or parsed, or the output cannot be initialized.
    /// Fails after dispatch only if the final checkpoint save fails.
    pub fn run(&self, folder: &Path, config: &RunConfig) -> Result<RunSummary, BatchError> {
        let _guard = self.run_lock.lock().unwrap_or_else(PoisonError::into_inner);

        self.tracker.reset(RunPhase::Enumerating);
        let prepared = self.prepare(folder);
        let (found, pending, checkpoint) = match prepared {
            Ok(p) => p,
            Err(e) => {
                self.tracker.set_phase(RunPhase::Idle);
                return Err(e);
            }
        };

        if pending.is_empty() {
            info!(
                "All {found} images in {} have already been processed",
                folder.display()
            );
            self.tracker.set_phase(RunPhase::Idle);
            self.events.on_event(ProgressEvent::NothingToDo { found });
            return Ok(RunSummary {
                status: RunStatus::NothingToDo,
                found,
                already_done: found,
                pending: 0,
                succeeded: 0,
                failed: 0,
                persistence_errors: 0,
                elapsed: Duration::ZERO,
                output: self.sink.location().to_path_buf(),
            });
        }

        if let Err(e) = self.sink.initialize() {
            self.tracker.set_phase(RunPhase::Idle);
            return Err(BatchError::SinkInit(e));
        }

        let total = pending.len();
        let workers = config.worker_count(self.parallelism).min(total);
        info!(
            "Processing {total} images from {} with {workers} workers ({} already done)",
            folder.display(),
            found - total
        );
        self.tracker.begin(total);
        self.events.on_event(ProgressEvent::Started {
            total,
            already_done: found - total,
            workers,
        });

        let mut agg = Aggregate {
            checkpoint,
            completed: 0,
            succeeded: 0,
            failed: 0,
            persistence_errors: 0,
        };
        self.dispatch(pending, workers, config, &mut agg);

        self.tracker.set_phase(RunPhase::Finalizing);
        let saved = self.checkpoint.save(&agg.checkpoint);
        let snapshot = self.tracker.finish();

        if let Err(e) = saved {
            error!("Final checkpoint save failed: {e}");
            self.events.on_event(ProgressEvent::PersistenceFailed {
                location: self.checkpoint.location().to_path_buf(),
                reason: e.to_string(),
            });
            return Err(BatchError::CheckpointSave(e));
        }
        info!(
            "Checkpoint saved with {} entries after {} images processed",
            agg.checkpoint.len(),
            agg.completed
        );
        self.events.on_event(ProgressEvent::CheckpointSaved {
            entries: agg.checkpoint.len(),
        });

        let summary = RunSummary {
            status: RunStatus::Completed,
            found,
            already_done: found - total,
            pending: total,
            succeeded: agg.succeeded,
            failed: agg.failed,
            persistence_errors: agg.persistence_errors,
            elapsed: snapshot.elapsed,
            output: self.sink.location().to_path_buf(),
        };
        info!(
            "Run finished: {} succeeded, {} failed in {:?}",
            summary.succeeded, summary.failed, summary.elapsed
        );
        self.events.on_event(ProgressEvent::Finished {
            summary: summary.clone(),
        });
        Ok(summary)
    }

    /// Enumerates the folder and subtracts the checkpoint.
    fn prepare(&self, folder: &Path) -> Result<(usize, Vec<WorkItem>, CheckpointSet), BatchError> {
        let items = enumerate_folder(folder).map_err(|source| BatchError::FolderUnreadable {
            path: folder.to_path_buf(),
            source,
        })?;
        let found = items.len();

        let checkpoint = self.checkpoint.load()?;
        debug!(
            "Loaded checkpoint with {} entries from {}",
            checkpoint.len(),
            self.checkpoint.location().display()
        );

        Ok((found, pending_items(items, &checkpoint), checkpoint))
    }

    /// Runs `pending` across `workers` threads and drains completions on the
    /// calling thread.
    fn dispatch(
        &self,
        pending: Vec<WorkItem>,
        workers: usize,
        config: &RunConfig,
        agg: &mut Aggregate,
    ) {
        let (job_tx, job_rx) = mpsc::channel::<WorkItem>();
        for item in pending {
            // The receiver is alive until the scope below ends.
            let _ = job_tx.send(item);
        }
        drop(job_tx);
        let job_rx = Mutex::new(job_rx);

        let (done_tx, done_rx) = mpsc::channel::<(WorkItem, Outcome)>();

        thread::scope(|scope| {
            for _ in 0..workers {
                let done_tx = done_tx.clone();
                let job_rx = &job_rx;
                let processor = &self.processor;
                scope.spawn(move || worker_loop(processor, job_rx, &done_tx, config));
            }
            drop(done_tx);

            for (item, outcome) in done_rx {
                self.complete(item, outcome, config, agg);
            }
        });
    }

    /// Routes one outcome to the sink, the checkpoint and the tracker.
    fn complete(&self, item: WorkItem, outcome: Outcome, config: &RunConfig, agg: &mut Aggregate) {
        let success = outcome.is_success();
        if let Outcome::Failure { kind, message } = &outcome {
            error!(
                "Error processing image: {}. Error: {}: {message}",
                item.name(),
                kind.label()
            );
        }

        let record = OutputRecord::new(item.name(), outcome.clone());
        let written = match self.sink.append(&record) {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to write record for {}: {e}", item.name());
                agg.persistence_errors += 1;
                self.events.on_event(ProgressEvent::PersistenceFailed {
                    location: self.sink.location().to_path_buf(),
                    reason: e.to_string(),
                });
                false
            }
        };

        // An unwritten result is not checkpointed so the next run redoes it.
        if success && written {
            agg.checkpoint.insert(item.name());
        }
        if success {
            agg.succeeded += 1;
        } else {
            agg.failed += 1;
        }
        agg.completed += 1;

        let snapshot = self.tracker.record(success);
        self.events.on_event(ProgressEvent::ItemCompleted {
            name: item.name().to_string(),
            outcome,
            snapshot,
        });

        if agg.completed % config.checkpoint_every() == 0 {
            self.save_periodic(agg);
        }
    }

    fn save_periodic(&self, agg: &mut Aggregate) {
        match self.checkpoint.save(&agg.checkpoint) {
            Ok(()) => {
                info!("Checkpoint saved at {} images processed", agg.completed);
                self.events.on_event(ProgressEvent::CheckpointSaved {
                    entries: agg.checkpoint.len(),
                });
            }
            Err(e) => {
                warn!("Checkpoint save at {} images failed: {e}", agg.completed);
                agg.persistence_errors += 1;
                self.events.on_event(ProgressEvent::PersistenceFailed {
                    location: self.checkpoint.location().to_path_buf(),
                    reason: e.to_string(),
                });
            }
        }
    }
}

/// Pulls items until the job queue is empty.
fn worker_loop(
    processor: &ItemProcessor,
    jobs: &Mutex<Receiver<WorkItem>>,
    done: &Sender<(WorkItem, Outcome)>,
    config: &RunConfig,
) {
    loop {
        let next = jobs.lock().unwrap_or_else(PoisonError::into_inner).recv();
        let Ok(item) = next else {
            break;
        };

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| processor.process(&item, config)))
            .unwrap_or_else(|payload| {
                let message = panic_message(payload.as_ref());
                error!("Unhandled exception for image {}: {message}", item.name());
                Outcome::failure(FailureKind::WorkerFault, message)
            });

        if done.send((item, outcome)).is_err() {
            break;
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "worker panicked".to_string())
}
