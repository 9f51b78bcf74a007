//! Left/right and top/bottom brightness balance.

use crate::domain::ImageSample;

const SAMPLE_STRIDE: usize = 4;

/// Mirrored brightness balance of the image halves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymmetryAnalysis {
    /// `1 - |L - R| / (L + R)`, at least 0.
    pub horizontal: f64,
    /// `1 - |T - B| / (T + B)`, at least 0.
    pub vertical: f64,
}

/// Compares each half of the image against its mirrored counterpart.
#[must_use]
pub fn analyze_symmetry(sample: &ImageSample) -> SymmetryAnalysis {
    let (width, height) = (sample.width(), sample.height());

    let mut left = 0.0;
    let mut right = 0.0;
    for y in (0..height).step_by(SAMPLE_STRIDE) {
        for x in (0..width.div_ceil(2)).step_by(SAMPLE_STRIDE) {
            if let (Some(l), Some(r)) = (
                sample.brightness(x, y),
                sample.brightness(width - 1 - x, y),
            ) {
                left += l;
                right += r;
            }
        }
    }

    let mut top = 0.0;
    let mut bottom = 0.0;
    for y in (0..height.div_ceil(2)).step_by(SAMPLE_STRIDE) {
        for x in (0..width).step_by(SAMPLE_STRIDE) {
            if let (Some(t), Some(b)) = (
                sample.brightness(x, y),
                sample.brightness(x, height - 1 - y),
            ) {
                top += t;
                bottom += b;
            }
        }
    }

    SymmetryAnalysis {
        horizontal: balance(left, right),
        vertical: balance(top, bottom),
    }
}

fn balance(a: f64, b: f64) -> f64 {
    let total = a + b;
    if total <= 0.0 {
        return 0.0;
    }
    (1.0 - (a - b).abs() / total).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> u8) -> ImageSample {
        let mut pixels = Vec::new();
        for y in 0..height {
            for x in 0..width {
                let v = f(x, y);
                pixels.extend_from_slice(&[v, v, v, 255]);
            }
        }
        ImageSample::new(width, height, pixels).unwrap_or_else(|e| panic!("{e}"))
    }

    #[test]
    fn test_uniform_gray_is_symmetric() {
        let analysis = analyze_symmetry(&from_fn(40, 40, |_, _| 128));
        assert!((analysis.horizontal - 1.0).abs() < 1e-9);
        assert!((analysis.vertical - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_black_image_has_no_symmetry_signal() {
        let analysis = analyze_symmetry(&from_fn(40, 40, |_, _| 0));
        assert!(analysis.horizontal.abs() < f64::EPSILON);
        assert!(analysis.vertical.abs() < f64::EPSILON);
    }

    #[test]
    fn test_left_lit_image_is_unbalanced() {
        let analysis = analyze_symmetry(&from_fn(40, 40, |x, _| if x < 20 { 255 } else { 0 }));
        assert!(analysis.horizontal.abs() < 1e-9);
        assert!((analysis.vertical - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_imbalance() {
        let analysis = analyze_symmetry(&from_fn(40, 40, |_, y| if y < 20 { 150 } else { 50 }));
        assert!((analysis.vertical - 0.5).abs() < 1e-9);
    }
}
