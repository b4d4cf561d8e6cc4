//! Photo Describe Core - Domain logic and the resumable batch pipeline
//!
//! This crate contains the core domain types, the port traits adapters
//! implement, the per-image processor with its retry policy, and the batch
//! coordinator that drives a bounded worker pool over a folder of images.

pub mod coordinator;
pub mod domain;
pub mod error;
pub mod ports;
pub mod processor;
pub mod scan;
pub mod tracker;

pub use coordinator::BatchCoordinator;
pub use domain::{
    CheckpointSet, ErrorClass, FailureKind, OutputRecord, Outcome, RunConfig, RunStatus,
    RunSummary, WorkItem, DEFAULT_PROMPT,
};
pub use error::{BatchError, CheckpointError, ServiceError, SinkError};
pub use ports::{CheckpointStore, DescriptionService, OutputSink, ProgressEvent, ProgressSink};
pub use processor::ItemProcessor;
pub use tracker::{ProgressHandle, ProgressSnapshot, ProgressTracker, RunPhase};
