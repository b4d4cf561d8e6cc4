//! Error types for the batch pipeline.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::domain::ErrorClass;

/// Errors reported by a description service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The service understood the request and refused it.
    #[error("{0}")]
    Rejected(String),

    /// The call failed for a reason that may not recur.
    #[error("{0}")]
    Transient(String),
}

impl ServiceError {
    /// Retry classification of this error.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Rejected(_) => ErrorClass::Rejection,
            Self::Transient(_) => ErrorClass::Transient,
        }
    }
}

/// Checkpoint persistence errors.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("checkpoint I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Output sink errors.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("output file {path} unavailable: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("output sink lock poisoned")]
    Poisoned,
}

/// Errors that stop a run.
///
/// Per-item failures never surface here; they are recorded in the output
/// and counted in the run summary.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("cannot read folder {path}: {source}")]
    FolderUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot resume from checkpoint: {0}")]
    CorruptCheckpoint(#[source] CheckpointError),

    #[error("cannot load checkpoint: {0}")]
    CheckpointLoad(#[source] CheckpointError),

    #[error("cannot initialize output: {0}")]
    SinkInit(#[source] SinkError),

    #[error("final checkpoint save failed: {0}")]
    CheckpointSave(#[source] CheckpointError),
}

impl From<CheckpointError> for BatchError {
    fn from(err: CheckpointError) -> Self {
        match err {
            CheckpointError::Corrupt { .. } => Self::CorruptCheckpoint(err),
            CheckpointError::Io { .. } => Self::CheckpointLoad(err),
        }
    }
}
