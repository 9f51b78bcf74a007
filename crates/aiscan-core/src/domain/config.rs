//! Per-call analysis configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Calibration strategy turning raw logits into a score pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingMethod {
    /// Hard inversion on the logit gap.
    #[default]
    InvertedSoftmax,
    /// Softmax with index 0 as real, dampened or amplified by the logit gap.
    Adaptive,
    /// Softmax with index 0 as real.
    #[serde(rename = "softmax_0_real")]
    Softmax0Real,
    /// Softmax with index 0 as fake.
    #[serde(rename = "softmax_0_fake")]
    Softmax0Fake,
    /// Piecewise sigmoid of the logit gap.
    SigmoidDiff,
    /// Positive logits used directly.
    RawLogits,
}

impl ProcessingMethod {
    /// Every method, in evaluation order.
    pub const ALL: [Self; 6] = [
        Self::InvertedSoftmax,
        Self::Adaptive,
        Self::Softmax0Fake,
        Self::Softmax0Real,
        Self::SigmoidDiff,
        Self::RawLogits,
    ];

    /// Configuration name of the method.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvertedSoftmax => "inverted_softmax",
            Self::Adaptive => "adaptive",
            Self::Softmax0Real => "softmax_0_real",
            Self::Softmax0Fake => "softmax_0_fake",
            Self::SigmoidDiff => "sigmoid_diff",
            Self::RawLogits => "raw_logits",
        }
    }
}

impl fmt::Display for ProcessingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessingMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<_> = Self::ALL.iter().map(|m| m.as_str()).collect();
                format!("unknown processing method '{s}' (expected one of {})", known.join(", "))
            })
    }
}

/// Which face gate to run before inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceDetectionMethod {
    /// Pixel-statistics heuristic.
    #[default]
    Heuristic,
    /// An external face-detection model, with the heuristic as fallback.
    External,
}

impl fmt::Display for FaceDetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Heuristic => "heuristic",
            Self::External => "external",
        })
    }
}

impl FromStr for FaceDetectionMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "heuristic" => Ok(Self::Heuristic),
            "external" => Ok(Self::External),
            other => Err(format!(
                "unknown face detection method '{other}' (expected heuristic or external)"
            )),
        }
    }
}

/// Settings resolved once per analysis call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalysisConfig {
    /// Master switch; a disabled call never touches the classifier.
    pub enabled: bool,
    /// Run the face gate before inference.
    pub face_detection_enabled: bool,
    /// Which face gate to run.
    pub face_detection_method: FaceDetectionMethod,
    /// Calibration method for the classifier output.
    pub processing_method: ProcessingMethod,
    /// Replaces the adaptive threshold when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_threshold: Option<f64>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            face_detection_enabled: true,
            face_detection_method: FaceDetectionMethod::Heuristic,
            processing_method: ProcessingMethod::InvertedSoftmax,
            confidence_threshold: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnalysisConfig::default();
        assert!(config.enabled);
        assert!(config.face_detection_enabled);
        assert_eq!(config.face_detection_method, FaceDetectionMethod::Heuristic);
        assert_eq!(config.processing_method, ProcessingMethod::InvertedSoftmax);
        assert!(config.confidence_threshold.is_none());
    }

    #[test]
    fn test_method_names_round_trip_through_from_str() {
        for method in ProcessingMethod::ALL {
            assert_eq!(method.as_str().parse::<ProcessingMethod>(), Ok(method));
        }
        assert!("softmax".parse::<ProcessingMethod>().is_err());
    }

    #[test]
    fn test_config_deserializes_wire_names() {
        let json = r#"{
            "faceDetectionEnabled": false,
            "faceDetectionMethod": "external",
            "processingMethod": "softmax_0_fake",
            "confidenceThreshold": 0.7
        }"#;
        let config: AnalysisConfig = serde_json::from_str(json).unwrap_or_else(|e| panic!("{e}"));
        assert!(config.enabled);
        assert!(!config.face_detection_enabled);
        assert_eq!(config.face_detection_method, FaceDetectionMethod::External);
        assert_eq!(config.processing_method, ProcessingMethod::Softmax0Fake);
        assert_eq!(config.confidence_threshold, Some(0.7));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AnalysisConfig = serde_json::from_str("{}").unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(config, AnalysisConfig::default());
    }
}
