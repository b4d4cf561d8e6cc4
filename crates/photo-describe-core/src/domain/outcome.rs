//! Per-item outcomes and the retry policy table.

use std::fmt;

use serde::Serialize;

/// Line that terminates every record in the output file.
pub const RECORD_SEPARATOR: &str = "--------------";

/// Classification of an error raised while describing one image.
///
/// Retry eligibility lives here as data so the policy can be checked
/// without a description service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Image could not be opened or decoded.
    Validation,
    /// The service definitively refused the request.
    Rejection,
    /// Anything else: transport failures, timeouts, malformed replies.
    Transient,
}

impl ErrorClass {
    /// Whether another attempt may succeed.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Transient)
    }

    /// Failure kind reported once this class stops the item.
    #[must_use]
    pub const fn failure_kind(self) -> FailureKind {
        match self {
            Self::Validation => FailureKind::Validation,
            Self::Rejection => FailureKind::ServiceRejection,
            Self::Transient => FailureKind::Unexpected,
        }
    }
}

/// Why an item failed.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Corrupt, truncated or unsupported image.
    Validation,
    /// Service-level error distinct from a transport failure.
    ServiceRejection,
    /// Transient errors persisted through every attempt.
    Unexpected,
    /// The worker itself panicked while processing the item.
    WorkerFault,
}

impl FailureKind {
    /// Label prefixed to the error detail in output records.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Validation => "IOError",
            Self::ServiceRejection => "ServiceError",
            Self::Unexpected => "UnexpectedError",
            Self::WorkerFault => "WorkerFault",
        }
    }
}

/// Result of processing one work item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The service produced a description.
    Success {
        /// Generated description text.
        description: String,
    },
    /// The item could not be described.
    Failure {
        /// Failure classification.
        kind: FailureKind,
        /// Human-readable error detail.
        message: String,
    },
}

impl Outcome {
    #[must_use]
    pub fn success(description: impl Into<String>) -> Self {
        Self::Success {
            description: description.into(),
        }
    }

    #[must_use]
    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::Failure {
            kind,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Failure kind, if this is a failure.
    #[must_use]
    pub const fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { kind, .. } => Some(*kind),
        }
    }
}

/// One entry of the output file.
///
/// `Display` renders the record without a trailing newline; sinks add the
/// line terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRecord {
    /// Identifier of the image.
    pub name: String,
    /// What happened to it.
    pub outcome: Outcome,
}

impl OutputRecord {
    #[must_use]
    pub fn new(name: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            name: name.into(),
            outcome,
        }
    }
}

impl fmt::Display for OutputRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Outcome::Success { description } => write!(
                f,
                "Processing image: {}\nDescription: {description}\n{RECORD_SEPARATOR}",
                self.name
            ),
            Outcome::Failure {
                kind: FailureKind::WorkerFault,
                message,
            } => write!(
                f,
                "Unhandled exception for image: {}. Error: {message}\n{RECORD_SEPARATOR}",
                self.name
            ),
            Outcome::Failure { kind, message } => write!(
                f,
                "Error processing image: {}. Error: {}: {message}\n{RECORD_SEPARATOR}",
                self.name,
                kind.label()
            ),
        }
    }
}
