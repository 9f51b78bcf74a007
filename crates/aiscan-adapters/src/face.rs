//! Face detector backed by the `rustface` crate (SeetaFace engine).

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use aiscan_core::{FaceDetector, ImageSample};
use anyhow::{Context, Result};
use image::{DynamicImage, RgbaImage};
use tracing::debug;

/// SeetaFace frontal detector.
///
/// The model is read once; each call builds a cheap detector from a clone.
pub struct RustfaceDetector {
    model: rustface::Model,
}

impl RustfaceDetector {
    /// Loads a `seeta_fd_frontal` model file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open face model {}", path.display()))?;
        let model = rustface::read_model(BufReader::new(file))
            .with_context(|| format!("Failed to parse face model {}", path.display()))?;
        Ok(Self { model })
    }
}

impl FaceDetector for RustfaceDetector {
    fn name(&self) -> &'static str {
        "rustface"
    }

    fn has_face(&self, sample: &ImageSample) -> Result<bool> {
        let rgba = RgbaImage::from_raw(sample.width(), sample.height(), sample.pixels().to_vec())
            .context("pixel buffer does not match image dimensions")?;
        let gray = DynamicImage::ImageRgba8(rgba).to_luma8();

        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(20);
        detector.set_score_thresh(2.0);
        detector.set_pyramid_scale_factor(0.8);
        detector.set_slide_window_step(4, 4);

        let faces = detector.detect(&rustface::ImageData::new(
            gray.as_raw(),
            gray.width(),
            gray.height(),
        ));
        debug!(faces = faces.len(), "rustface detection");
        Ok(!faces.is_empty())
    }
}
