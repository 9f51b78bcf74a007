//! Adaptive-threshold decision engine.

use tracing::debug;

use crate::domain::{AnalysisDetails, CalibratedScore, ProcessingMethod, RawLogits, Verdict};

/// Threshold when the signal is neither strong nor weak.
pub const BASE_THRESHOLD: f64 = 0.6;
/// Threshold for a strong, confident logit signal.
pub const STRONG_SIGNAL_THRESHOLD: f64 = 0.55;
/// Threshold for a weak logit signal.
pub const WEAK_LOGIT_THRESHOLD: f64 = 0.75;
/// Fixed threshold when the calibrated scores are nearly tied.
pub const WEAK_SIGNAL_THRESHOLD: f64 = 0.8;
/// Calibrated score gap below which the weak-signal branch decides.
pub const WEAK_SIGNAL_GAP: f64 = 0.1;

/// Strength of the raw logit signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalStrength {
    /// `|l0 - l1|`.
    pub logit_diff: f64,
    /// `max(|l0|, |l1|)`.
    pub logit_max: f64,
}

impl SignalStrength {
    /// Measures the logit pair; `None` for single-logit output.
    #[must_use]
    pub fn from_logits(logits: &RawLogits) -> Option<Self> {
        logits.pair().map(|(l0, l1)| Self {
            logit_diff: (l0 - l1).abs(),
            logit_max: l0.abs().max(l1.abs()),
        })
    }

    /// Threshold shifted by signal strength.
    #[must_use]
    pub fn adaptive_threshold(self) -> f64 {
        if self.logit_diff > 0.5 && self.logit_max > 0.3 {
            STRONG_SIGNAL_THRESHOLD
        } else if self.logit_diff < 0.2 || self.logit_max < 0.15 {
            WEAK_LOGIT_THRESHOLD
        } else {
            BASE_THRESHOLD
        }
    }
}

/// Adaptive threshold for `logits`; single-logit output keeps the base.
#[must_use]
pub fn adaptive_threshold(logits: &RawLogits) -> f64 {
    SignalStrength::from_logits(logits).map_or(BASE_THRESHOLD, SignalStrength::adaptive_threshold)
}

/// Outcome of the decision engine before it becomes a [`Verdict`].
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    /// Whether the image is flagged.
    pub is_ai_generated: bool,
    /// `max(fake, real)`.
    pub confidence: f64,
    /// Branch and comparison that fired.
    pub reason: String,
    /// Threshold derived from the logits.
    pub adaptive_threshold: f64,
    /// Threshold applied in the normal branch.
    pub effective_threshold: f64,
    /// Whether the weak-signal branch decided.
    pub weak_signal: bool,
}

/// Decides from calibrated scores, using the raw logits for signal strength.
///
/// A non-finite or non-positive `threshold_override` counts as unset.
#[must_use]
pub fn decide(logits: &RawLogits, score: CalibratedScore, threshold_override: Option<f64>) -> Decision {
    let adaptive = adaptive_threshold(logits);
    let effective = threshold_override
        .filter(|t| t.is_finite() && *t > 0.0)
        .unwrap_or(adaptive);

    let CalibratedScore {
        fake_score: fake,
        real_score: real,
    } = score;
    let confidence = fake.max(real);
    let gap = (fake - real).abs();
    let weak_signal = gap < WEAK_SIGNAL_GAP;

    let (is_ai_generated, reason) = if weak_signal {
        if fake > real && fake >= WEAK_SIGNAL_THRESHOLD {
            (
                true,
                format!("Weak signal fake with high threshold ({fake:.3} >= {WEAK_SIGNAL_THRESHOLD})"),
            )
        } else {
            (false, format!("Weak signal, classified as real (diff: {gap:.3})"))
        }
    } else if fake > real {
        if fake >= effective {
            (true, format!("High confidence fake ({fake:.3} >= {effective})"))
        } else {
            (false, format!("Low confidence fake ({fake:.3} < {effective})"))
        }
    } else {
        (
            false,
            format!("Real predicted (real: {real:.3} > fake: {fake:.3})"),
        )
    };

    debug!(
        fake,
        real,
        confidence,
        weak_signal,
        adaptive_threshold = adaptive,
        effective_threshold = effective,
        "Decision: {reason}"
    );

    Decision {
        is_ai_generated,
        confidence,
        reason,
        adaptive_threshold: adaptive,
        effective_threshold: effective,
        weak_signal,
    }
}

impl Decision {
    /// Builds the final verdict, recording the numbers behind it.
    #[must_use]
    pub fn into_verdict(
        self,
        logits: RawLogits,
        method: ProcessingMethod,
        score: CalibratedScore,
    ) -> Verdict {
        Verdict {
            is_ai_generated: self.is_ai_generated,
            confidence: self.confidence,
            reason: Some(self.reason),
            error: None,
            details: Some(AnalysisDetails {
                raw_logits: logits,
                processing_method: method,
                fake_score: score.fake_score,
                real_score: score.real_score,
                adaptive_threshold: self.adaptive_threshold,
                effective_threshold: self.effective_threshold,
                weak_signal: self.weak_signal,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logits(values: &[f32]) -> RawLogits {
        RawLogits::new(values.to_vec()).unwrap_or_else(|e| panic!("{e}"))
    }

    fn strength(logit_diff: f64, logit_max: f64) -> SignalStrength {
        SignalStrength {
            logit_diff,
            logit_max,
        }
    }

    #[test]
    fn test_adaptive_threshold_levels() {
        assert!((strength(0.6, 0.4).adaptive_threshold() - 0.55).abs() < f64::EPSILON);
        assert!((strength(0.1, 2.0).adaptive_threshold() - 0.75).abs() < f64::EPSILON);
        assert!((strength(0.3, 0.1).adaptive_threshold() - 0.75).abs() < f64::EPSILON);
        assert!((strength(0.3, 0.9).adaptive_threshold() - 0.6).abs() < f64::EPSILON);
        assert!((strength(0.6, 0.2).adaptive_threshold() - 0.6).abs() < f64::EPSILON);
    }

    #[test]
    fn test_adaptive_threshold_from_logits() {
        assert!((adaptive_threshold(&logits(&[0.4, -0.2])) - 0.55).abs() < 1e-9);
        assert!((adaptive_threshold(&logits(&[0.5, 0.45])) - 0.75).abs() < 1e-9);
        assert!((adaptive_threshold(&logits(&[3.0])) - BASE_THRESHOLD).abs() < f64::EPSILON);
    }

    #[test]
    fn test_weak_signal_requires_high_fake_score() {
        let decision = decide(
            &logits(&[2.0, 0.0]),
            CalibratedScore::new(0.55, 0.5),
            None,
        );
        assert!(decision.weak_signal);
        assert!(!decision.is_ai_generated);
        assert!(decision.reason.starts_with("Weak signal, classified as real"));

        let decision = decide(&logits(&[2.0, 0.0]), CalibratedScore::new(0.55, 0.5), Some(0.1));
        assert!(!decision.is_ai_generated);
    }

    #[test]
    fn test_weak_signal_high_fake_is_flagged() {
        let decision = decide(&logits(&[0.0, 0.0]), CalibratedScore::new(0.85, 0.8), None);
        assert!(decision.weak_signal);
        assert!(decision.is_ai_generated);
        assert!(decision.reason.starts_with("Weak signal fake"));
    }

    #[test]
    fn test_normal_branch_uses_effective_threshold() {
        // logits [0.4, -0.2] give the strong-signal threshold 0.55.
        let flagged = decide(&logits(&[0.4, -0.2]), CalibratedScore::new(0.57, 0.43), None);
        assert!(flagged.is_ai_generated);
        assert!(flagged.reason.starts_with("High confidence fake"));

        let overridden = decide(
            &logits(&[0.4, -0.2]),
            CalibratedScore::new(0.57, 0.43),
            Some(0.9),
        );
        assert!(!overridden.is_ai_generated);
        assert!(overridden.reason.starts_with("Low confidence fake"));
        assert!((overridden.effective_threshold - 0.9).abs() < f64::EPSILON);
        assert!((overridden.adaptive_threshold - 0.55).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unusable_override_falls_back_to_adaptive() {
        // logits [0.3, 0.0] give the base threshold 0.6.
        let raw = logits(&[0.3, 0.0]);
        let score = CalibratedScore::new(0.574, 0.426);

        for threshold in [None, Some(0.0), Some(-1.0), Some(f64::NAN), Some(f64::INFINITY)] {
            let decision = decide(&raw, score, threshold);
            assert!(!decision.is_ai_generated, "{threshold:?}");
            assert!(
                (decision.effective_threshold - BASE_THRESHOLD).abs() < f64::EPSILON,
                "{threshold:?}"
            );
        }
    }

    #[test]
    fn test_real_wins_when_not_lower() {
        let decision = decide(&logits(&[2.0, 0.3]), CalibratedScore::new(0.2, 0.8), None);
        assert!(!decision.is_ai_generated);
        assert!((decision.confidence - 0.8).abs() < f64::EPSILON);
        assert!(decision.reason.starts_with("Real predicted"));
    }

    #[test]
    fn test_into_verdict_records_details() {
        let raw = logits(&[0.4, -0.2]);
        let score = CalibratedScore::new(0.8, 0.2);
        let verdict = decide(&raw, score, None).into_verdict(
            raw.clone(),
            ProcessingMethod::InvertedSoftmax,
            score,
        );
        assert!(verdict.is_ai_generated);
        assert!(verdict.error.is_none());
        let details = verdict.details.unwrap_or_else(|| panic!("details"));
        assert_eq!(details.raw_logits, raw);
        assert_eq!(details.processing_method, ProcessingMethod::InvertedSoftmax);
    }
}
