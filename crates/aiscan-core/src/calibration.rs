//! Score calibration: raw logits to a `(fake, real)` pair.
//!
//! The classifier's index semantics are unreliable in practice, so each
//! method encodes its own historical mapping. Index 0 is treated as fake
//! by some methods and as real by others; keep each mapping as is.

use tracing::debug;

use crate::domain::{CalibratedScore, ProcessingMethod, RawLogits};

/// Logit gap above which `inverted_softmax` reads the image as real.
const INVERSION_GAP: f64 = 0.6;

/// Derived views of a two-logit output, computed once per call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogitStats {
    /// First logit.
    pub l0: f64,
    /// Second logit.
    pub l1: f64,
    /// Softmax probability of index 0.
    pub softmax0: f64,
    /// Softmax probability of index 1.
    pub softmax1: f64,
    /// `sigmoid(l0 - l1)`.
    pub sigmoid_fake: f64,
    /// `1 - sigmoid_fake`.
    pub sigmoid_real: f64,
}

impl LogitStats {
    /// Computes softmax and sigmoid-difference views of `(l0, l1)`.
    #[must_use]
    pub fn new(l0: f64, l1: f64) -> Self {
        let max = l0.max(l1);
        let e0 = (l0 - max).exp();
        let e1 = (l1 - max).exp();
        let sum = e0 + e1;
        let sigmoid_fake = sigmoid(l0 - l1);
        Self {
            l0,
            l1,
            softmax0: e0 / sum,
            softmax1: e1 / sum,
            sigmoid_fake,
            sigmoid_real: 1.0 - sigmoid_fake,
        }
    }

    /// `l0 - l1`.
    #[must_use]
    pub fn diff(&self) -> f64 {
        self.l0 - self.l1
    }
}

/// Logistic function.
#[inline]
#[must_use]
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Calibrates classifier output with `method`.
///
/// Single-logit output bypasses the method: `fake = sigmoid(l0)`.
#[must_use]
pub fn calibrate(logits: &RawLogits, method: ProcessingMethod) -> CalibratedScore {
    let Some((l0, l1)) = logits.pair() else {
        let fake = sigmoid(logits.first());
        return CalibratedScore::new(fake, 1.0 - fake);
    };

    let stats = LogitStats::new(l0, l1);
    debug!(
        l0,
        l1,
        softmax0 = stats.softmax0,
        softmax1 = stats.softmax1,
        sigmoid_fake = stats.sigmoid_fake,
        sigmoid_real = stats.sigmoid_real,
        "Logit views"
    );

    let score = method.apply(&stats);
    debug!(
        "Using processing method {method}: fake={:.3}, real={:.3}",
        score.fake_score, score.real_score
    );
    score
}

impl ProcessingMethod {
    /// Applies this method to precomputed logit views.
    #[must_use]
    pub fn apply(self, stats: &LogitStats) -> CalibratedScore {
        match self {
            Self::InvertedSoftmax => inverted_softmax(stats),
            Self::Adaptive => adaptive(stats),
            Self::Softmax0Real => CalibratedScore::new(stats.softmax1, stats.softmax0),
            Self::Softmax0Fake => CalibratedScore::new(stats.softmax0, stats.softmax1),
            Self::SigmoidDiff => sigmoid_diff(stats),
            Self::RawLogits => raw_logits(stats),
        }
    }
}

fn inverted_softmax(stats: &LogitStats) -> CalibratedScore {
    let diff = stats.diff();
    let real = diff > INVERSION_GAP;
    debug!(
        "Inverted: logit_diff={diff:.3}, threshold={INVERSION_GAP}, result={}",
        if real { "REAL" } else { "FAKE" }
    );
    if real {
        CalibratedScore::new(0.2, 0.8)
    } else {
        CalibratedScore::new(0.8, 0.2)
    }
}

fn adaptive(stats: &LogitStats) -> CalibratedScore {
    let gap = stats.diff().abs();
    let (fake, real) = (stats.softmax1, stats.softmax0);
    if gap < 0.2 {
        CalibratedScore::new(fake * 0.8, real * 0.8)
    } else if gap > 0.8 {
        CalibratedScore::new((fake * 1.1).min(1.0), (real * 1.1).min(1.0))
    } else {
        CalibratedScore::new(fake, real)
    }
}

fn sigmoid_diff(stats: &LogitStats) -> CalibratedScore {
    let diff = stats.diff();
    let sig = stats.sigmoid_fake;
    if diff > 0.6 {
        CalibratedScore::new(1.0 - sig, sig)
    } else if diff > 0.3 {
        CalibratedScore::new(1.0 - sig * 0.8, sig * 0.8)
    } else {
        CalibratedScore::new(sig, 1.0 - sig)
    }
}

fn raw_logits(stats: &LogitStats) -> CalibratedScore {
    let fake = stats.l0.clamp(0.0, 1.0);
    let real = stats.l1.clamp(0.0, 1.0);
    if fake == 0.0 && real == 0.0 {
        CalibratedScore::new(0.5, 0.5)
    } else {
        CalibratedScore::new(fake, real)
    }
}
