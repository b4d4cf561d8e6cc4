//! Progress bar adapter using indicatif.

use indicatif::{ProgressBar, ProgressStyle};
use photo_describe_core::{Outcome, ProgressEvent, ProgressSink, ProgressSnapshot};

/// Renders coordinator events as a progress bar, or as plain failure lines
/// when stderr is not a terminal.
pub struct ProgressReporter {
    bar: Option<ProgressBar>,
    quiet: bool,
}

impl ProgressReporter {
    /// Creates a reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, suppress all output
    /// * `show_bar` - If true, show a progress bar; otherwise report failures line by line
    #[must_use]
    pub fn new(quiet: bool, show_bar: bool) -> Self {
        if quiet {
            return Self {
                bar: None,
                quiet: true,
            };
        }

        let bar = show_bar.then(|| {
            let bar = ProgressBar::new(0);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            {
                bar.set_style(style.progress_chars("#>-"));
            }
            bar
        });

        Self { bar, quiet }
    }

    fn print(&self, line: &str) {
        match &self.bar {
            Some(bar) => bar.println(line),
            None => eprintln!("{line}"),
        }
    }
}

/// Bar message: percent done, failure count and average time per image.
fn status_message(snapshot: &ProgressSnapshot) -> String {
    let mut parts = vec![format!("{:.0}%", snapshot.fraction() * 100.0)];
    if snapshot.failed > 0 {
        parts.push(format!("{} failed", snapshot.failed));
    }
    if let Some(average) = snapshot.average_per_item {
        parts.push(format!("{:.1}s/image", average.as_secs_f64()));
    }
    parts.join(", ")
}

impl ProgressSink for ProgressReporter {
    fn on_event(&self, event: ProgressEvent) {
        if self.quiet {
            return;
        }

        match event {
            ProgressEvent::Started {
                total,
                already_done,
                workers,
            } => {
                if let Some(bar) = &self.bar {
                    bar.set_length(total as u64);
                    bar.set_position(0);
                }
                self.print(&format!(
                    "Describing {total} images with {workers} workers ({already_done} already done)"
                ));
            }
            ProgressEvent::NothingToDo { .. } | ProgressEvent::CheckpointSaved { .. } => {}
            ProgressEvent::ItemCompleted {
                name,
                outcome,
                snapshot,
            } => {
                if let Some(bar) = &self.bar {
                    bar.set_position(snapshot.processed_items as u64);
                    bar.set_message(status_message(&snapshot));
                }
                if let Outcome::Failure { kind, message } = outcome {
                    self.print(&format!("FAILED {name}: {}: {message}", kind.label()));
                }
            }
            ProgressEvent::PersistenceFailed { location, reason } => {
                self.print(&format!(
                    "WARN: could not write {}: {reason}",
                    location.display()
                ));
            }
            ProgressEvent::Finished { summary } => {
                if let Some(bar) = &self.bar {
                    bar.finish_and_clear();
                }
                if summary.persistence_errors > 0 {
                    self.print(&format!(
                        "WARN: {} results or checkpoint saves were not persisted",
                        summary.persistence_errors
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_status_message_shows_average() {
        let snapshot = ProgressSnapshot {
            total_items: 8,
            processed_items: 4,
            average_per_item: Some(Duration::from_millis(1500)),
            ..ProgressSnapshot::default()
        };
        assert_eq!(status_message(&snapshot), "50%, 1.5s/image");
    }

    #[test]
    fn test_status_message_includes_failures() {
        let snapshot = ProgressSnapshot {
            total_items: 3,
            processed_items: 3,
            failed: 2,
            average_per_item: Some(Duration::from_secs(2)),
            ..ProgressSnapshot::default()
        };
        assert_eq!(status_message(&snapshot), "100%, 2 failed, 2.0s/image");
    }

    #[test]
    fn test_status_message_before_first_completion() {
        let snapshot = ProgressSnapshot {
            total_items: 5,
            ..ProgressSnapshot::default()
        };
        assert_eq!(status_message(&snapshot), "0%");
    }

    #[test]
    fn test_quiet_reporter_ignores_events() {
        let reporter = ProgressReporter::new(true, true);
        assert!(reporter.bar.is_none());
        reporter.on_event(ProgressEvent::NothingToDo { found: 3 });
    }
}
