//! Mock implementations of core port traits.

use std::collections::{HashMap, HashSet, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use photo_describe_core::domain::{CheckpointSet, OutputRecord};
use photo_describe_core::error::{CheckpointError, ServiceError, SinkError};
use photo_describe_core::ports::{
    CheckpointStore, DescriptionService, OutputSink, ProgressEvent, ProgressSink,
};

/// Scripted response of [`MockDescriptionService`].
#[derive(Debug, Clone)]
pub enum Reply {
    /// Return this description.
    Ok(String),
    /// Fail with [`ServiceError::Rejected`].
    Reject(String),
    /// Fail with [`ServiceError::Transient`].
    Transient(String),
    /// Panic inside the service call.
    Panic(String),
}

impl Reply {
    #[must_use]
    pub fn ok(text: &str) -> Self {
        Self::Ok(text.to_string())
    }

    #[must_use]
    pub fn reject(text: &str) -> Self {
        Self::Reject(text.to_string())
    }

    #[must_use]
    pub fn transient(text: &str) -> Self {
        Self::Transient(text.to_string())
    }

    #[must_use]
    pub fn panic(text: &str) -> Self {
        Self::Panic(text.to_string())
    }
}

/// Mock implementation of `DescriptionService` for testing.
///
/// Replies are scripted per file name and consumed in order; once a
/// script runs out, the last reply repeats. Unscripted files get
/// `"Description of <name>"`. Every call is timestamped and the peak number
/// of concurrent calls is tracked.
pub struct MockDescriptionService {
    scripts: Mutex<HashMap<String, VecDeque<Reply>>>,
    fallback: Reply,
    latency: Duration,
    calls: Mutex<Vec<(String, Instant)>>,
    prompts: Mutex<Vec<String>>,
    timeouts: Mutex<Vec<Duration>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MockDescriptionService {
    /// Creates a service that describes every image successfully.
    #[must_use]
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            fallback: Reply::Ok(String::new()),
            latency: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
            prompts: Mutex::new(Vec::new()),
            timeouts: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// Scripts the replies for one file name.
    #[must_use]
    pub fn script(self, name: &str, replies: Vec<Reply>) -> Self {
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), replies.into());
        self
    }

    /// Reply used for files without a script.
    #[must_use]
    pub fn otherwise(mut self, reply: Reply) -> Self {
        self.fallback = reply;
        self
    }

    /// Makes every call take at least `latency`.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Total number of calls made.
    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Number of calls made for one file name.
    #[must_use]
    pub fn calls_for(&self, name: &str) -> usize {
        self.call_times(name).len()
    }

    /// Start instants of the calls made for one file name.
    #[must_use]
    pub fn call_times(&self, name: &str) -> Vec<Instant> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, t)| *t)
            .collect()
    }

    /// Prompts received, in call order.
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Timeouts received, in call order.
    #[must_use]
    pub fn timeouts(&self) -> Vec<Duration> {
        self.timeouts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Highest number of calls that were running at the same time.
    #[must_use]
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn next_reply(&self, name: &str) -> Reply {
        let mut scripts = self.scripts.lock().unwrap_or_else(PoisonError::into_inner);
        match scripts.get_mut(name) {
            Some(queue) if queue.len() > 1 => queue
                .pop_front()
                .unwrap_or_else(|| self.fallback.clone()),
            Some(queue) => queue
                .front()
                .cloned()
                .unwrap_or_else(|| self.fallback.clone()),
            None => match &self.fallback {
                Reply::Ok(text) if text.is_empty() => {
                    Reply::Ok(format!("Description of {name}"))
                }
                other => other.clone(),
            },
        }
    }
}

impl Default for MockDescriptionService {
    fn default() -> Self {
        Self::new()
    }
}

/// Decrements the in-flight counter even if the call panics.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl DescriptionService for MockDescriptionService {
    fn describe(
        &self,
        image: &Path,
        prompt: &str,
        timeout: Duration,
    ) -> Result<String, ServiceError> {
        let name = image
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlight(&self.in_flight);
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((name.clone(), Instant::now()));
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(prompt.to_string());
        self.timeouts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(timeout);

        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }

        match self.next_reply(&name) {
            Reply::Ok(text) => Ok(text),
            Reply::Reject(text) => Err(ServiceError::Rejected(text)),
            Reply::Transient(text) => Err(ServiceError::Transient(text)),
            Reply::Panic(text) => panic!("{text}"),
        }
    }
}

/// In-memory implementation of `CheckpointStore` for testing.
pub struct MemoryCheckpointStore {
    stored: Mutex<Option<CheckpointSet>>,
    corrupt: bool,
    fail_saves: bool,
    save_sizes: Mutex<Vec<usize>>,
    location: PathBuf,
}

impl MemoryCheckpointStore {
    /// Creates a store with no persisted checkpoint.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stored: Mutex::new(None),
            corrupt: false,
            fail_saves: false,
            save_sizes: Mutex::new(Vec::new()),
            location: PathBuf::from("memory://checkpoint"),
        }
    }

    /// Creates a store that already holds `names`.
    #[must_use]
    pub fn with_entries(names: &[&str]) -> Self {
        let store = Self::new();
        *store.stored.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(names.iter().copied().collect());
        store
    }

    /// Creates a store whose persisted data cannot be parsed.
    #[must_use]
    pub fn corrupt() -> Self {
        Self {
            corrupt: true,
            ..Self::new()
        }
    }

    /// Makes every save fail.
    #[must_use]
    pub fn failing_saves(mut self) -> Self {
        self.fail_saves = true;
        self
    }

    /// The persisted set, if any save or seed happened.
    #[must_use]
    pub fn stored(&self) -> Option<CheckpointSet> {
        self.stored
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of entries written by each save, in order.
    #[must_use]
    pub fn save_sizes(&self) -> Vec<usize> {
        self.save_sizes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for MemoryCheckpointStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn load(&self) -> Result<CheckpointSet, CheckpointError> {
        if self.corrupt {
            return Err(CheckpointError::Corrupt {
                path: self.location.clone(),
                reason: "expected a JSON array".to_string(),
            });
        }
        Ok(self.stored().unwrap_or_default())
    }

    fn save(&self, set: &CheckpointSet) -> Result<(), CheckpointError> {
        self.save_sizes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(set.len());
        if self.fail_saves {
            return Err(CheckpointError::Io {
                path: self.location.clone(),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only"),
            });
        }
        *self.stored.lock().unwrap_or_else(PoisonError::into_inner) = Some(set.clone());
        Ok(())
    }

    fn location(&self) -> &Path {
        &self.location
    }
}

/// Mock implementation of `OutputSink` for testing.
///
/// Captures records for later assertions.
pub struct MemoryOutputSink {
    records: Mutex<Vec<OutputRecord>>,
    init_count: AtomicUsize,
    fail_init: bool,
    fail_for: HashSet<String>,
    location: PathBuf,
}

impl MemoryOutputSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            init_count: AtomicUsize::new(0),
            fail_init: false,
            fail_for: HashSet::new(),
            location: PathBuf::from("memory://output"),
        }
    }

    /// Makes `initialize` fail.
    #[must_use]
    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    /// Makes appends for the given image name fail.
    #[must_use]
    pub fn failing_for(mut self, name: &str) -> Self {
        self.fail_for.insert(name.to_string());
        self
    }

    /// Returns all captured records.
    #[must_use]
    pub fn records(&self) -> Vec<OutputRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the captured records as they would appear in the output file.
    #[must_use]
    pub fn rendered(&self) -> String {
        self.records()
            .iter()
            .map(|r| format!("{r}\n"))
            .collect()
    }

    /// Number of times `initialize` was called.
    #[must_use]
    pub fn init_count(&self) -> usize {
        self.init_count.load(Ordering::SeqCst)
    }
}

impl Default for MemoryOutputSink {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputSink for MemoryOutputSink {
    fn initialize(&self) -> Result<(), SinkError> {
        self.init_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_init {
            return Err(SinkError::Io {
                path: self.location.clone(),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only"),
            });
        }
        Ok(())
    }

    fn append(&self, record: &OutputRecord) -> Result<(), SinkError> {
        if self.fail_for.contains(&record.name) {
            return Err(SinkError::Io {
                path: self.location.clone(),
                source: io::Error::new(io::ErrorKind::Other, "disk full"),
            });
        }
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }

    fn location(&self) -> &Path {
        &self.location
    }
}

/// Mock implementation of `ProgressSink` for testing.
///
/// Captures events for later assertions.
pub struct MockProgressSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl MockProgressSink {
    /// Creates a new mock progress sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    /// Returns all captured events.
    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of `ItemCompleted` events.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ProgressEvent::ItemCompleted { .. }))
            .count()
    }

    /// Returns the number of `CheckpointSaved` events.
    #[must_use]
    pub fn checkpoint_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ProgressEvent::CheckpointSaved { .. }))
            .count()
    }

    /// Returns the number of `PersistenceFailed` events.
    #[must_use]
    pub fn persistence_failures(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ProgressEvent::PersistenceFailed { .. }))
            .count()
    }

    /// Returns whether a `NothingToDo` event was received.
    #[must_use]
    pub fn was_nothing_to_do(&self) -> bool {
        self.events()
            .iter()
            .any(|e| matches!(e, ProgressEvent::NothingToDo { .. }))
    }

    /// Returns whether a `Finished` event was received.
    #[must_use]
    pub fn has_finished(&self) -> bool {
        self.events()
            .iter()
            .any(|e| matches!(e, ProgressEvent::Finished { .. }))
    }
}

impl Default for MockProgressSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for MockProgressSink {
    fn on_event(&self, event: ProgressEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
