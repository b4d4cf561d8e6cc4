//! End-of-run report.

use std::time::Duration;

use photo_describe_core::{RunStatus, RunSummary};

/// Human-readable run duration.
fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs >= 60 {
        format!("{}m {:02}s", secs / 60, secs % 60)
    } else {
        format!("{:.1}s", elapsed.as_secs_f64())
    }
}

/// One-line summary of a finished run.
pub fn summary_line(summary: &RunSummary) -> String {
    match summary.status {
        RunStatus::NothingToDo => format!(
            "All {} images have already been processed, nothing to do.",
            summary.found
        ),
        RunStatus::Completed => format!(
            "Processed {} images in {}: {} described, {} failed ({} skipped from earlier runs).",
            summary.pending,
            format_elapsed(summary.elapsed),
            summary.succeeded,
            summary.failed,
            summary.already_done
        ),
    }
}

/// Prints the summary to stderr and the output location to stdout.
pub fn print_summary(summary: &RunSummary, quiet: bool) {
    if !quiet {
        eprintln!("{}", summary_line(summary));
    }
    println!("{}", summary.output.display());
}
