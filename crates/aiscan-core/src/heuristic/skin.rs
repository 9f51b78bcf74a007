//! Skin-tone detection and clustering.

#![allow(clippy::cast_precision_loss)]

use crate::domain::ImageSample;

/// Sampling stride in both axes.
const SAMPLE_STRIDE: usize = 2;

/// Edge length of a clustering grid cell in pixels.
const GRID_CELL: u32 = 20;

/// A cell is hot when it holds more than this multiple of the mean count.
const HOT_CELL_FACTOR: f64 = 5.0;

/// Below this many skin pixels clustering is treated as noise.
const MIN_SKIN_PIXELS: usize = 5;

/// Skin statistics over the sampled pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkinAnalysis {
    /// Skin pixels over sampled pixels.
    pub ratio: f64,
    /// Fraction of hot grid cells, scaled by 4 and clamped to 1.
    pub cluster_score: f64,
}

/// Classifies a pixel using the union of three color-space rules.
#[must_use]
pub fn is_skin_tone(r: u8, g: u8, b: u8) -> bool {
    rgb_rule(r, g, b) || hsv_rule(r, g, b) || ycbcr_rule(r, g, b)
}

fn rgb_rule(r: u8, g: u8, b: u8) -> bool {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    r > 95 && g > 40 && b > 20 && max - min > 15 && r.abs_diff(g) > 15 && r > g && r > b
}

fn hsv_rule(r: u8, g: u8, b: u8) -> bool {
    let (r, g, b) = (f64::from(r), f64::from(g), f64::from(b));
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let mut hue = if delta == 0.0 {
        0.0
    } else if max == r {
        ((g - b) / delta) % 6.0
    } else if max == g {
        (b - r) / delta + 2.0
    } else {
        (r - g) / delta + 4.0
    } * 60.0;
    if hue < 0.0 {
        hue += 360.0;
    }

    let saturation = if max == 0.0 { 0.0 } else { delta / max };
    let value = max / 255.0;

    (0.0..=50.0).contains(&hue)
        && (0.23..=0.68).contains(&saturation)
        && (0.35..=0.95).contains(&value)
}

fn ycbcr_rule(r: u8, g: u8, b: u8) -> bool {
    let (r, g, b) = (f64::from(r), f64::from(g), f64::from(b));
    let y = 0.299 * r + 0.587 * g + 0.114 * b;
    let cb = -0.169 * r - 0.331 * g + 0.5 * b + 128.0;
    let cr = 0.5 * r - 0.419 * g - 0.081 * b + 128.0;
    y > 80.0 && (77.0..=127.0).contains(&cb) && (133.0..=173.0).contains(&cr)
}

/// Samples every other pixel and measures skin coverage and clustering.
#[must_use]
pub fn analyze_skin(sample: &ImageSample) -> SkinAnalysis {
    let (width, height) = (sample.width(), sample.height());
    let mut sampled = 0usize;
    let mut skin = Vec::new();

    for y in (0..height).step_by(SAMPLE_STRIDE) {
        for x in (0..width).step_by(SAMPLE_STRIDE) {
            sampled += 1;
            if let Some([r, g, b]) = sample.rgb(x, y) {
                if is_skin_tone(r, g, b) {
                    skin.push((x, y));
                }
            }
        }
    }

    let ratio = if sampled == 0 {
        0.0
    } else {
        skin.len() as f64 / sampled as f64
    };

    SkinAnalysis {
        ratio,
        cluster_score: cluster_score(&skin, width, height),
    }
}

fn cluster_score(skin: &[(u32, u32)], width: u32, height: u32) -> f64 {
    if skin.len() < MIN_SKIN_PIXELS {
        return 0.0;
    }

    let grid_width = width.div_ceil(GRID_CELL) as usize;
    let grid_height = height.div_ceil(GRID_CELL) as usize;
    let cells = grid_width * grid_height;
    if cells == 0 {
        return 0.0;
    }

    let mut grid = vec![0usize; cells];
    for &(x, y) in skin {
        let index = (y / GRID_CELL) as usize * grid_width + (x / GRID_CELL) as usize;
        if let Some(count) = grid.get_mut(index) {
            *count += 1;
        }
    }

    let threshold = skin.len() as f64 / cells as f64 * HOT_CELL_FACTOR;
    let hot = grid.iter().filter(|&&count| count as f64 > threshold).count();

    (hot as f64 / cells as f64 * 4.0).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typical_skin_tone() {
        assert!(is_skin_tone(200, 150, 120));
        assert!(is_skin_tone(224, 172, 105));
    }

    #[test]
    fn test_non_skin_tones() {
        assert!(!is_skin_tone(0, 0, 0));
        assert!(!is_skin_tone(30, 60, 200));
        assert!(!is_skin_tone(20, 200, 40));
        assert!(!is_skin_tone(255, 255, 255));
    }

    #[test]
    fn test_uniform_skin_has_full_ratio_and_no_clusters() {
        let analysis = analyze_skin(&ImageSample::filled(60, 60, [200, 150, 120, 255]));
        assert!((analysis.ratio - 1.0).abs() < 1e-9);
        // Every cell is at the mean, so none exceeds five times it.
        assert!(analysis.cluster_score.abs() < 1e-9);
    }

    #[test]
    fn test_single_skin_patch_clusters() {
        let mut pixels = Vec::new();
        for y in 0..200u32 {
            for x in 0..200u32 {
                let on_patch = (20..40).contains(&x) && (20..40).contains(&y);
                let rgb = if on_patch { [200, 150, 120] } else { [20, 40, 200] };
                pixels.extend_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
            }
        }
        let sample = ImageSample::new(200, 200, pixels).unwrap_or_else(|e| panic!("{e}"));
        let analysis = analyze_skin(&sample);

        assert!(analysis.ratio > 0.0 && analysis.ratio < 0.05);
        // One hot cell out of 100, scaled by 4.
        assert!((analysis.cluster_score - 0.04).abs() < 1e-9);
    }

    #[test]
    fn test_no_skin_scores_zero() {
        let analysis = analyze_skin(&ImageSample::filled(40, 40, [0, 0, 0, 255]));
        assert!(analysis.ratio.abs() < f64::EPSILON);
        assert!(analysis.cluster_score.abs() < f64::EPSILON);
    }
}
