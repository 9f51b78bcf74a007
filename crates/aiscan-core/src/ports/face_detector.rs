//! Pluggable face gate.

use crate::domain::ImageSample;

/// Decides whether an image plausibly contains a face.
pub trait FaceDetector: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Returns whether at least one face is present.
    ///
    /// # Errors
    ///
    /// Returns an error if the detector cannot run; callers fall back to
    /// the heuristic.
    fn has_face(&self, sample: &ImageSample) -> anyhow::Result<bool>;
}
