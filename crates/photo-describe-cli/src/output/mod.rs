//! Terminal output for the CLI.

mod progress;
mod summary;

pub use progress::ProgressReporter;
pub use summary::print_summary;
