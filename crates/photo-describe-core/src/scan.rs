//! Folder enumeration and pending-set computation.

use std::io;
use std::path::Path;

use tracing::{debug, warn};

use crate::domain::{CheckpointSet, WorkItem};

/// Recognized image extensions, compared case-insensitively.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "tiff"];

/// Lists the images directly inside `folder`, sorted by name.
///
/// Subdirectories are not descended into. Entries that cannot be inspected
/// are skipped with a warning.
///
/// # Errors
///
/// Returns an error if the folder itself cannot be read.
pub fn enumerate_folder(folder: &Path) -> io::Result<Vec<WorkItem>> {
    let folder = std::path::absolute(folder)?;
    let mut items = Vec::new();

    for entry in std::fs::read_dir(&folder)? {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {e}", folder.display());
                continue;
            }
        };

        let path = entry.path();
        if !path.is_file() || !is_supported_image(&path) {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            warn!("Skipping non-UTF-8 file name: {}", path.display());
            continue;
        };
        items.push(WorkItem::new(name, &path));
    }

    items.sort_by(|a, b| a.name().cmp(b.name()));
    debug!("Found {} image files in {}", items.len(), folder.display());
    Ok(items)
}

/// Items not yet recorded in the checkpoint.
#[must_use]
pub fn pending_items(items: Vec<WorkItem>, checkpoint: &CheckpointSet) -> Vec<WorkItem> {
    items
        .into_iter()
        .filter(|item| !checkpoint.contains(item.name()))
        .collect()
}

/// Checks if a path has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.as_str()))
}
