//! Face heuristic result.

use serde::{Deserialize, Serialize};

/// Pixel-statistics evidence that an image contains a face.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceHeuristicResult {
    /// Fraction of sampled pixels classified as skin.
    pub skin_ratio: f64,
    /// How concentrated the skin pixels are (0.0 to 1.0).
    pub skin_cluster_score: f64,
    /// Number of horizontally aligned eye pairs.
    pub eye_pair_count: usize,
    /// Mean placement symmetry of the eye pairs (0.0 to 1.0).
    pub eye_symmetry: f64,
    /// Left/right brightness balance (0.0 to 1.0).
    pub horizontal_symmetry: f64,
    /// Top/bottom brightness balance (0.0 to 1.0).
    pub vertical_balance: f64,
    /// Closeness of the aspect ratio to a face (0.0 to 1.0).
    pub golden_ratio_score: f64,
    /// Weighted aggregate (0.0 to 1.0).
    pub final_score: f64,
    /// Whether the image plausibly contains a face.
    pub has_face: bool,
}

impl FaceHeuristicResult {
    /// Result used when the heuristic itself fails: let analysis proceed.
    #[must_use]
    pub fn fail_open() -> Self {
        Self {
            has_face: true,
            ..Self::default()
        }
    }
}
