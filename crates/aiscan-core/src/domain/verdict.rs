//! Classifier evidence, calibrated scores and the final verdict.

use serde::{Deserialize, Serialize};

use super::ProcessingMethod;
use crate::error::{AnalysisError, Result};

/// Raw classifier output: one or two logits.
///
/// Never modified after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawLogits(Vec<f32>);

impl RawLogits {
    /// Wraps classifier output.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Classifier`] for empty or non-finite output.
    pub fn new(values: Vec<f32>) -> Result<Self> {
        if values.is_empty() {
            return Err(AnalysisError::Classifier(
                "classifier returned no logits".to_string(),
            ));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(AnalysisError::Classifier(format!(
                "classifier returned non-finite logits: {values:?}"
            )));
        }
        Ok(Self(values))
    }

    /// All values as returned by the classifier.
    #[must_use]
    pub fn values(&self) -> &[f32] {
        &self.0
    }

    /// The first logit.
    #[must_use]
    pub fn first(&self) -> f64 {
        self.0.first().copied().map_or(0.0, f64::from)
    }

    /// `(l0, l1)` when the classifier produced at least two logits.
    #[must_use]
    pub fn pair(&self) -> Option<(f64, f64)> {
        match self.0.as_slice() {
            [l0, l1, ..] => Some((f64::from(*l0), f64::from(*l1))),
            _ => None,
        }
    }
}

/// A `(fake, real)` score pair produced by one calibration method.
///
/// The two scores need not sum to one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibratedScore {
    /// Evidence the image is AI-generated (0.0 to 1.0).
    pub fake_score: f64,
    /// Evidence the image is authentic (0.0 to 1.0).
    pub real_score: f64,
}

impl CalibratedScore {
    /// Creates a score pair.
    #[must_use]
    pub const fn new(fake_score: f64, real_score: f64) -> Self {
        Self {
            fake_score,
            real_score,
        }
    }
}

/// Numbers behind a successful verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisDetails {
    /// Classifier output.
    pub raw_logits: RawLogits,
    /// Calibration method that produced the scores.
    pub processing_method: ProcessingMethod,
    /// Calibrated fake score.
    pub fake_score: f64,
    /// Calibrated real score.
    pub real_score: f64,
    /// Threshold derived from signal strength.
    pub adaptive_threshold: f64,
    /// Threshold actually applied in the normal branch.
    pub effective_threshold: f64,
    /// Whether the weak-signal branch decided.
    pub weak_signal: bool,
}

/// Error text of a verdict for an image the face gate rejected.
pub const NO_FACE_MESSAGE: &str = "Skipped: No faces detected in image";

/// Terminal output of the pipeline for one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    /// Whether the image is flagged as AI-generated.
    #[serde(rename = "isAIGenerated")]
    pub is_ai_generated: bool,
    /// Confidence in the winning score (0.0 to 1.0).
    pub confidence: f64,
    /// Which decision branch fired, for debugging.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Why no decision was made.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Scores and thresholds behind the decision.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<AnalysisDetails>,
}

impl Verdict {
    /// A verdict for a call that could not be analysed.
    #[must_use]
    pub fn from_error(error: &AnalysisError) -> Self {
        Self::failed(error.to_string())
    }

    /// A verdict carrying only an error message.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            is_ai_generated: false,
            confidence: 0.0,
            reason: None,
            error: Some(message.into()),
            details: None,
        }
    }

    /// A verdict for an image the face gate rejected.
    #[must_use]
    pub fn skipped_no_face(final_score: f64) -> Self {
        Self {
            reason: Some(format!("face heuristic score {final_score:.3} below gate")),
            ..Self::failed(NO_FACE_MESSAGE)
        }
    }

    /// Whether this verdict reports a failure or skip.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
