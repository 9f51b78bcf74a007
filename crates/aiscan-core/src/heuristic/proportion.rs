//! Aspect-ratio proportion score.

/// Aspect ratio scored as most face-like.
const IDEAL_FACE_RATIO: f64 = 1.4;

/// `max(0, 1 - |aspect - 1.4| / 1.4)`, or 0 for a degenerate image.
#[must_use]
pub fn proportion_score(width: u32, height: u32) -> f64 {
    if height == 0 {
        return 0.0;
    }
    let aspect = f64::from(width) / f64::from(height);
    (1.0 - (aspect - IDEAL_FACE_RATIO).abs() / IDEAL_FACE_RATIO).max(0.0)
}
