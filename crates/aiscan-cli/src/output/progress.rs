//! Progress bar adapter using indicatif.

use aiscan_core::AnalysisResponse;
use indicatif::{ProgressBar as IndicatifBar, ProgressStyle};

/// Scan lifecycle events reported to the user.
#[derive(Debug)]
pub enum ScanEvent<'a> {
    /// One image finished.
    Completed { response: &'a AnalysisResponse },
    /// The whole scan finished.
    Finished { flagged: usize, failed: usize },
}

/// Progress bar adapter for CLI output.
pub struct ProgressBar {
    bar: Option<IndicatifBar>,
    quiet: bool,
}

impl ProgressBar {
    /// Creates a new progress bar.
    ///
    /// # Arguments
    ///
    /// * `total` - Total number of images
    /// * `quiet` - If true, suppress all output
    /// * `show_bar` - If true, show progress bar; otherwise show per-image status
    #[must_use]
    pub fn new(total: u64, quiet: bool, show_bar: bool) -> Self {
        if quiet {
            return Self {
                bar: None,
                quiet: true,
            };
        }

        let bar = show_bar.then(|| {
            let bar = IndicatifBar::new(total);
            if let Ok(style) = ProgressStyle::default_bar().template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
            ) {
                bar.set_style(style.progress_chars("#>-"));
            }
            bar
        });

        Self { bar, quiet }
    }

    pub fn on_event(&self, event: &ScanEvent<'_>) {
        if self.quiet {
            return;
        }

        match event {
            ScanEvent::Completed { response } => {
                let verdict = &response.result;
                if let Some(bar) = &self.bar {
                    bar.inc(1);
                    bar.set_message(response.request_id.clone());
                } else if let Some(error) = &verdict.error {
                    eprintln!("{}: {error}", response.image);
                } else if verdict.is_ai_generated {
                    eprintln!(
                        "{}: likely AI-generated ({:.0}%)",
                        response.image,
                        verdict.confidence * 100.0
                    );
                }
            }
            ScanEvent::Finished { flagged, failed } => {
                if let Some(bar) = &self.bar {
                    bar.finish_with_message(format!("Done: {flagged} flagged, {failed} failed"));
                }
            }
        }
    }
}
