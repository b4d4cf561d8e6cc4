//! Work item types.

use std::path::{Path, PathBuf};

use serde::Serialize;

/// One image file to be described.
///
/// The identifier is the file name, which is unique within a folder and is
/// what the checkpoint records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct WorkItem {
    name: String,
    path: PathBuf,
}

impl WorkItem {
    /// Creates a work item from its identifier and absolute path.
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// File name identifying this item within its folder.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute path to the image.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
