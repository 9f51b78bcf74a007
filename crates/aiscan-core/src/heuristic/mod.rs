//! Pixel-statistics face detector.
//!
//! A cheap gate run before inference. It looks for skin-toned regions,
//! dark eye-like blobs in horizontal pairs, brightness symmetry and a
//! face-like aspect ratio, then combines them into a weighted score:
//!
//! | category   | points | engaged when                                  |
//! |------------|--------|-----------------------------------------------|
//! | skin       | 25     | ratio in (0.02, 0.8); +10 if cluster > 0.4    |
//! | eyes       | 35     | 20 per pair, +15 if symmetry > 0.5            |
//! | symmetry   | 25     | 15 x horizontal above 0.4, 10 x vertical above 0.3 |
//! | proportion | 15     | score above 0.3                               |
//!
//! The detector is pure and deterministic. Any internal failure yields
//! `has_face = true` so a detector bug never blocks analysis.

mod eyes;
mod proportion;
mod skin;
mod symmetry;

pub use eyes::{analyze_eyes, eye_strength, EyeAnalysis, EyeCandidate};
pub use proportion::proportion_score;
pub use skin::{analyze_skin, is_skin_tone, SkinAnalysis};
pub use symmetry::{analyze_symmetry, SymmetryAnalysis};

use tracing::{debug, warn};

use crate::domain::{FaceHeuristicResult, ImageSample, CHANNELS};
use crate::ports::FaceDetector;

/// Minimum aggregate score for `has_face`.
pub const FACE_THRESHOLD: f64 = 0.25;

const SKIN_POINTS: f64 = 25.0;
const EYE_POINTS: f64 = 35.0;
const SYMMETRY_POINTS: f64 = 25.0;
const PROPORTION_POINTS: f64 = 15.0;
const MAX_SCORE: f64 = SKIN_POINTS + EYE_POINTS + SYMMETRY_POINTS + PROPORTION_POINTS;

/// Reasons the heuristic could not score an image.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HeuristicError {
    /// The image has no pixels.
    #[error("image has zero size ({width}x{height})")]
    EmptyImage {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },

    /// The pixel buffer does not cover the declared dimensions.
    #[error("pixel buffer holds {actual} bytes, expected {expected}")]
    BufferMismatch {
        /// Bytes required by the dimensions.
        expected: usize,
        /// Bytes present.
        actual: usize,
    },

    /// A sub-score came out NaN or infinite.
    #[error("non-finite face score")]
    NonFinite,
}

/// Scores an image, failing open on any internal error.
#[must_use]
pub fn detect_face(sample: &ImageSample) -> FaceHeuristicResult {
    match try_detect_face(sample) {
        Ok(result) => {
            debug!(
                score = result.final_score,
                has_face = result.has_face,
                skin_ratio = result.skin_ratio,
                skin_clusters = result.skin_cluster_score,
                eye_pairs = result.eye_pair_count,
                eye_symmetry = result.eye_symmetry,
                horizontal = result.horizontal_symmetry,
                vertical = result.vertical_balance,
                proportion = result.golden_ratio_score,
                "Face heuristic"
            );
            result
        }
        Err(e) => {
            warn!("Face heuristic failed, proceeding with analysis: {e}");
            FaceHeuristicResult::fail_open()
        }
    }
}

/// Scores an image, reporting internal errors.
///
/// # Errors
///
/// Returns a [`HeuristicError`] for empty or inconsistent images and for
/// non-finite intermediate scores.
pub fn try_detect_face(sample: &ImageSample) -> Result<FaceHeuristicResult, HeuristicError> {
    let (width, height) = (sample.width(), sample.height());
    if width == 0 || height == 0 {
        return Err(HeuristicError::EmptyImage { width, height });
    }
    let expected = width as usize * height as usize * CHANNELS;
    if sample.pixels().len() != expected {
        return Err(HeuristicError::BufferMismatch {
            expected,
            actual: sample.pixels().len(),
        });
    }

    let skin = analyze_skin(sample);
    let eyes = analyze_eyes(sample);
    let symmetry = analyze_symmetry(sample);
    let proportion = proportion_score(width, height);

    let mut score = 0.0;

    if skin.ratio > 0.02 && skin.ratio < 0.8 {
        score += (skin.ratio * 30.0).min(15.0);
        if skin.cluster_score > 0.4 {
            score += 10.0;
        }
    }

    if eyes.pair_count > 0 {
        #[allow(clippy::cast_precision_loss)]
        let mut eye_score = eyes.pair_count as f64 * 20.0;
        if eyes.symmetry > 0.5 {
            eye_score += 15.0;
        }
        score += eye_score.min(EYE_POINTS);
    }

    if symmetry.horizontal > 0.4 {
        score += symmetry.horizontal * 15.0;
    }
    if symmetry.vertical > 0.3 {
        score += symmetry.vertical * 10.0;
    }

    if proportion > 0.3 {
        score += proportion * PROPORTION_POINTS;
    }

    let final_score = (score / MAX_SCORE).clamp(0.0, 1.0);
    if !final_score.is_finite() {
        return Err(HeuristicError::NonFinite);
    }

    Ok(FaceHeuristicResult {
        skin_ratio: skin.ratio,
        skin_cluster_score: skin.cluster_score,
        eye_pair_count: eyes.pair_count,
        eye_symmetry: eyes.symmetry,
        horizontal_symmetry: symmetry.horizontal,
        vertical_balance: symmetry.vertical,
        golden_ratio_score: proportion,
        final_score,
        has_face: final_score >= FACE_THRESHOLD,
    })
}

/// The heuristic behind the [`FaceDetector`] port.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicFaceDetector;

impl FaceDetector for HeuristicFaceDetector {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn has_face(&self, sample: &ImageSample) -> anyhow::Result<bool> {
        Ok(detect_face(sample).has_face)
    }
}
