//! Side-by-side accuracy of every calibration method on labelled logits.

use serde::{Deserialize, Serialize};

use crate::calibration::LogitStats;
use crate::domain::ProcessingMethod;

/// Classifier output with the known answer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelledLogits {
    /// `[l0, l1]` as produced by the classifier.
    pub logits: [f64; 2],
    /// Whether the image is AI-generated.
    pub expected: bool,
}

/// One method's call on one sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub logits: [f64; 2],
    pub expected: bool,
    /// `fake_score > real_score`.
    pub predicted: bool,
    pub is_correct: bool,
    pub fake_score: f64,
    pub real_score: f64,
}

/// Accuracy of one method over the whole set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodReport {
    pub method: ProcessingMethod,
    pub correct: usize,
    pub total: usize,
    /// Percentage of correct predictions, 0 for an empty set.
    pub accuracy: f64,
    pub predictions: Vec<Prediction>,
}

/// Runs every [`ProcessingMethod`] over `samples`, in [`ProcessingMethod::ALL`] order.
#[must_use]
pub fn evaluate_methods(samples: &[LabelledLogits]) -> Vec<MethodReport> {
    ProcessingMethod::ALL
        .iter()
        .map(|&method| evaluate(method, samples))
        .collect()
}

/// The report with the highest accuracy; the earliest wins ties.
#[must_use]
pub fn best_method(reports: &[MethodReport]) -> Option<&MethodReport> {
    reports.iter().reduce(|best, report| {
        if report.accuracy > best.accuracy {
            report
        } else {
            best
        }
    })
}

fn evaluate(method: ProcessingMethod, samples: &[LabelledLogits]) -> MethodReport {
    let predictions: Vec<Prediction> = samples
        .iter()
        .map(|sample| {
            let [l0, l1] = sample.logits;
            let score = method.apply(&LogitStats::new(l0, l1));
            let predicted = score.fake_score > score.real_score;
            Prediction {
                logits: sample.logits,
                expected: sample.expected,
                predicted,
                is_correct: predicted == sample.expected,
                fake_score: score.fake_score,
                real_score: score.real_score,
            }
        })
        .collect();

    let correct = predictions.iter().filter(|p| p.is_correct).count();
    let total = predictions.len();
    #[allow(clippy::cast_precision_loss)]
    let accuracy = if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64 * 100.0
    };

    MethodReport {
        method,
        correct,
        total,
        accuracy,
        predictions,
    }
}
