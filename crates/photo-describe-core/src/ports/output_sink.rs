//! Result output port for writing description records.

use std::path::Path;

use crate::domain::OutputRecord;
use crate::error::SinkError;

/// Port for the append-only results log.
pub trait OutputSink: Send + Sync {
    /// Ensures the destination exists. Never discards existing content.
    ///
    /// # Errors
    ///
    /// Returns an error if the destination cannot be created or opened.
    fn initialize(&self) -> Result<(), SinkError>;

    /// Appends one record and flushes it durably.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn append(&self, record: &OutputRecord) -> Result<(), SinkError>;

    /// Where results are written.
    fn location(&self) -> &Path;
}
