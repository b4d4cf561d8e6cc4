//! JSON file checkpoint store.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use photo_describe_core::{CheckpointError, CheckpointSet, CheckpointStore};
use tracing::debug;

/// Checkpoint persisted as a JSON array of file names.
///
/// Saves go to a temporary file next to the target which is then renamed
/// over it, so an interrupted save leaves the previous checkpoint readable.
#[derive(Debug, Clone)]
pub struct JsonCheckpointStore {
    path: PathBuf,
}

impl JsonCheckpointStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Deletes the checkpoint. Missing files are not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub fn clear(&self) -> Result<bool, CheckpointError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(self.io_error(source)),
        }
    }

    fn io_error(&self, source: io::Error) -> CheckpointError {
        CheckpointError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn write_atomically(&self, set: &CheckpointSet) -> io::Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let names: Vec<&str> = set.iter().collect();
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer(&mut tmp, &names)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl CheckpointStore for JsonCheckpointStore {
    fn load(&self) -> Result<CheckpointSet, CheckpointError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No checkpoint at {}", self.path.display());
                return Ok(CheckpointSet::new());
            }
            Err(source) => return Err(self.io_error(source)),
        };

        let names: Vec<String> =
            serde_json::from_str(&content).map_err(|e| CheckpointError::Corrupt {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
        Ok(names.into_iter().collect())
    }

    fn save(&self, set: &CheckpointSet) -> Result<(), CheckpointError> {
        self.write_atomically(set)
            .map_err(|source| self.io_error(source))?;
        debug!(
            "Wrote {} checkpoint entries to {}",
            set.len(),
            self.path.display()
        );
        Ok(())
    }

    fn location(&self) -> &Path {
        &self.path
    }
}
