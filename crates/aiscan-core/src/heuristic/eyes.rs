//! Eye-pair detection from dark-center, light-surround blobs.

#![allow(clippy::cast_precision_loss)]

use crate::domain::ImageSample;

/// Scan stride for candidate centers.
const CANDIDATE_STRIDE: usize = 3;

/// Candidates closer than this to an edge are not considered.
const EDGE_MARGIN: u32 = 10;

/// Radius of the annulus inner edge; the dark disk uses half of it.
const EYE_RADIUS: i32 = 4;

/// Minimum contrast for a candidate to count as an eye.
const MIN_EYE_STRENGTH: f64 = 0.4;

/// A dark blob that may be an eye.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeCandidate {
    /// Center column.
    pub x: u32,
    /// Center row.
    pub y: u32,
    /// Contrast between surround and center (0.0 to 1.0).
    pub strength: f64,
}

/// Detected eye pairs and their placement symmetry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeAnalysis {
    /// Number of horizontally aligned candidate pairs.
    pub pair_count: usize,
    /// Mean pair symmetry, 0 without pairs.
    pub symmetry: f64,
}

/// Contrast between the disk around `(cx, cy)` and its annulus.
#[must_use]
pub fn eye_strength(sample: &ImageSample, cx: u32, cy: u32) -> f64 {
    let inner = f64::from(EYE_RADIUS) / 2.0;
    let outer = f64::from(EYE_RADIUS * 2);

    let mut center = (0.0, 0u32);
    let mut surround = (0.0, 0u32);

    for dy in -EYE_RADIUS * 2..=EYE_RADIUS * 2 {
        for dx in -EYE_RADIUS * 2..=EYE_RADIUS * 2 {
            let distance = f64::from(dx * dx + dy * dy).sqrt();
            let bucket = if distance <= inner {
                &mut center
            } else if distance > f64::from(EYE_RADIUS) && distance <= outer {
                &mut surround
            } else {
                continue;
            };

            let (Some(x), Some(y)) = (cx.checked_add_signed(dx), cy.checked_add_signed(dy)) else {
                continue;
            };
            if let Some(brightness) = sample.brightness(x, y) {
                bucket.0 += brightness;
                bucket.1 += 1;
            }
        }
    }

    if center.1 == 0 || surround.1 == 0 {
        return 0.0;
    }

    let avg_center = center.0 / f64::from(center.1);
    let avg_surround = surround.0 / f64::from(surround.1);
    ((avg_surround - avg_center) / 255.0).clamp(0.0, 1.0)
}

/// Scans the image for eye candidates and pairs them.
#[must_use]
pub fn analyze_eyes(sample: &ImageSample) -> EyeAnalysis {
    let (width, height) = (sample.width(), sample.height());
    let mut candidates = Vec::new();

    if width > 2 * EDGE_MARGIN && height > 2 * EDGE_MARGIN {
        for y in (EDGE_MARGIN..height - EDGE_MARGIN).step_by(CANDIDATE_STRIDE) {
            for x in (EDGE_MARGIN..width - EDGE_MARGIN).step_by(CANDIDATE_STRIDE) {
                let strength = eye_strength(sample, x, y);
                if strength > MIN_EYE_STRENGTH {
                    candidates.push(EyeCandidate { x, y, strength });
                }
            }
        }
    }

    find_pairs(&candidates, width, height)
}

/// Counts aligned pairs and averages their symmetry as it goes, so memory
/// stays linear in the candidate count.
fn find_pairs(candidates: &[EyeCandidate], width: u32, height: u32) -> EyeAnalysis {
    let half_width = f64::from(width) / 2.0;
    let (width, height) = (f64::from(width), f64::from(height));
    let mut pair_count = 0usize;
    let mut symmetry_sum = 0.0;

    for (i, a) in candidates.iter().enumerate() {
        for b in &candidates[i + 1..] {
            let dx = f64::from(a.x) - f64::from(b.x);
            let dy = f64::from(a.y) - f64::from(b.y);
            let distance = dx.hypot(dy);

            if distance > width * 0.1 && distance < width * 0.6 && dy.abs() < distance * 0.3 {
                pair_count += 1;
                symmetry_sum += pair_symmetry(a, b, half_width, height);
            }
        }
    }

    let symmetry = if pair_count == 0 {
        0.0
    } else {
        symmetry_sum / pair_count as f64
    };
    EyeAnalysis {
        pair_count,
        symmetry,
    }
}

fn pair_symmetry(a: &EyeCandidate, b: &EyeCandidate, half_width: f64, height: f64) -> f64 {
    let mid_x = (f64::from(a.x) + f64::from(b.x)) / 2.0;
    let centered = 1.0 - (mid_x - half_width).abs() / half_width;
    let aligned = 1.0 - f64::from(a.y.abs_diff(b.y)) / height;
    (centered + aligned) / 2.0
}
