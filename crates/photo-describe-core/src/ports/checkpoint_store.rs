//! Checkpoint persistence port.

use std::path::Path;

use crate::domain::CheckpointSet;
use crate::error::CheckpointError;

/// Port for reading and writing the set of completed items.
pub trait CheckpointStore: Send + Sync {
    /// Loads the persisted set, or an empty set if none exists.
    ///
    /// # Errors
    ///
    /// Returns [`CheckpointError::Corrupt`] if the stored data cannot be
    /// parsed.
    fn load(&self) -> Result<CheckpointSet, CheckpointError>;

    /// Replaces the persisted set. A failed save must leave the previous
    /// checkpoint intact.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn save(&self, set: &CheckpointSet) -> Result<(), CheckpointError>;

    /// Where the checkpoint lives.
    fn location(&self) -> &Path;
}
