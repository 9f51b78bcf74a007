//! Output formatting for CLI.

mod json;
mod progress;

pub use json::JsonOutput;
pub use progress::{ProgressBar, ScanEvent};
