//! Run configuration.

use std::time::Duration;

/// Prompt sent with every image unless overridden.
pub const DEFAULT_PROMPT: &str =
    "Please generate a description of no more than 5 sentences of this image.";

/// Settings for one batch run. Immutable once the run starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Prompt sent to the description service alongside each image.
    pub prompt: String,
    /// Maximum attempts per image for transient errors.
    pub max_retries: u32,
    /// Fixed delay between attempts.
    pub retry_delay: Duration,
    /// Upper bound on a single service call.
    pub timeout: Duration,
    /// Cap on worker threads; the pool is also bounded by available parallelism.
    pub max_workers: usize,
    /// Save the checkpoint after this many completions.
    pub checkpoint_interval: usize,
}

impl RunConfig {
    pub const DEFAULT_MAX_RETRIES: u32 = 3;
    pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
    pub const DEFAULT_MAX_WORKERS: usize = 10;
    pub const DEFAULT_CHECKPOINT_INTERVAL: usize = 100;

    /// Number of attempts the processor makes, never less than one.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    /// Worker pool size: `min(max_workers, parallelism_hint)`, at least one.
    #[must_use]
    pub fn worker_count(&self, parallelism_hint: usize) -> usize {
        self.max_workers.min(parallelism_hint).max(1)
    }

    /// Checkpoint interval, never zero.
    #[must_use]
    pub fn checkpoint_every(&self) -> usize {
        self.checkpoint_interval.max(1)
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            max_retries: Self::DEFAULT_MAX_RETRIES,
            retry_delay: Self::DEFAULT_RETRY_DELAY,
            timeout: Self::DEFAULT_TIMEOUT,
            max_workers: Self::DEFAULT_MAX_WORKERS,
            checkpoint_interval: Self::DEFAULT_CHECKPOINT_INTERVAL,
        }
    }
}
