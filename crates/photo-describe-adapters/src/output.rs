//! Append-only text file output sink.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use photo_describe_core::{OutputRecord, OutputSink, SinkError};
use tracing::debug;

/// Writes records to a text file, one after another.
///
/// The file is opened in append mode and never truncated, so a resumed run
/// adds to what earlier runs wrote. Each record is written with a single
/// `write_all` and synced before `append` returns.
pub struct TextFileSink {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl TextFileSink {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: Mutex::new(None),
        }
    }

    /// Deletes the output file. Missing files are not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub fn clear(&self) -> Result<bool, SinkError> {
        let mut file = self.file.lock().map_err(|_| SinkError::Poisoned)?;
        *file = None;
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(self.io_error(source)),
        }
    }

    fn open(&self) -> io::Result<File> {
        if let Some(dir) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        OpenOptions::new().create(true).append(true).open(&self.path)
    }

    fn io_error(&self, source: io::Error) -> SinkError {
        SinkError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl OutputSink for TextFileSink {
    fn initialize(&self) -> Result<(), SinkError> {
        let mut file = self.file.lock().map_err(|_| SinkError::Poisoned)?;
        if file.is_none() {
            *file = Some(self.open().map_err(|e| self.io_error(e))?);
            debug!("Opened output file {}", self.path.display());
        }
        Ok(())
    }

    #[allow(clippy::significant_drop_tightening)]
    fn append(&self, record: &OutputRecord) -> Result<(), SinkError> {
        let mut guard = self.file.lock().map_err(|_| SinkError::Poisoned)?;
        if guard.is_none() {
            *guard = Some(self.open().map_err(|e| self.io_error(e))?);
        }
        let Some(file) = guard.as_mut() else {
            return Err(SinkError::Poisoned);
        };

        let text = format!("{record}\n");
        file.write_all(text.as_bytes())
            .and_then(|()| file.flush())
            .and_then(|()| file.sync_data())
            .map_err(|e| self.io_error(e))
    }

    fn location(&self) -> &Path {
        &self.path
    }
}
