//! Error taxonomy for a single analysis call.
//!
//! Only the `Display` text of these errors ever reaches a [`Verdict`](crate::Verdict).

use crate::session::SessionError;

/// Errors that end one analysis call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    /// The host environment lacks something the pipeline needs.
    #[error("environment error: {0}")]
    Environment(String),

    /// The shared classifier session is not available.
    #[error("Failed to initialize classifier session: {0}")]
    Session(#[from] SessionError),

    /// The classifier ran but failed or returned unusable output.
    #[error("Image analysis error: {0}")]
    Classifier(String),

    /// The input was rejected before inference.
    #[error("{0}")]
    InvalidInput(String),

    /// The image could not be fetched or decoded.
    #[error("Failed to load image: {0}")]
    ImageLoad(String),

    /// A bounded step did not finish in time.
    #[error("{step} timed out after {millis} ms")]
    Timeout {
        /// Which step timed out.
        step: &'static str,
        /// The deadline in milliseconds.
        millis: u128,
    },
}

/// A specialized `Result` type for analysis steps.
pub type Result<T> = std::result::Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = AnalysisError::InvalidInput("Image too small (10x10)".to_string());
        assert_eq!(err.to_string(), "Image too small (10x10)");

        let err = AnalysisError::Timeout {
            step: "image load",
            millis: 5000,
        };
        assert_eq!(err.to_string(), "image load timed out after 5000 ms");

        let err = AnalysisError::Session(SessionError::Init("no model".to_string()));
        assert!(err.to_string().starts_with("Failed to initialize classifier session"));
        assert!(err.to_string().contains("no model"));
    }
}
