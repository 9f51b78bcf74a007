//! Synthetic image builders for testing.

use std::io::Cursor;

use aiscan_core::domain::ImageSample;
use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{ImageFormat, RgbaImage};

/// A pure skin tone accepted by every skin rule.
pub const SKIN: [u8; 3] = [200, 150, 120];

/// Builder for creating synthetic test images.
///
/// Provides convenience methods for generating images the face heuristic
/// accepts or rejects, and for encoding them the way the loaders read them.
pub struct SyntheticImageBuilder;

impl SyntheticImageBuilder {
    /// Creates an opaque single-colour image.
    #[must_use]
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> ImageSample {
        ImageSample::filled(width, height, [rgb[0], rgb[1], rgb[2], u8::MAX])
    }

    /// Creates an all-black image (no skin, no symmetry signal).
    #[must_use]
    pub fn black(width: u32, height: u32) -> ImageSample {
        Self::solid(width, height, [0, 0, 0])
    }

    /// Creates a uniform skin-tone image.
    #[must_use]
    pub fn skin(width: u32, height: u32) -> ImageSample {
        Self::solid(width, height, SKIN)
    }

    /// Creates a square skin image with two dark eye disks in the upper half.
    ///
    /// For `size = 200` the eyes sit at (70, 79) and (130, 79) with radius 4.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn face(size: u32) -> ImageSample {
        let s = f64::from(size);
        let eye_y = (s * 0.395).round() as i64;
        let eyes = [
            ((s * 0.35).round() as i64, eye_y),
            ((s * 0.65).round() as i64, eye_y),
        ];
        let radius = 4_i64;

        let image = RgbaImage::from_fn(size, size, |x, y| {
            let in_eye = eyes.iter().any(|&(cx, cy)| {
                let (dx, dy) = (i64::from(x) - cx, i64::from(y) - cy);
                dx * dx + dy * dy <= radius * radius
            });
            if in_eye {
                image::Rgba([0, 0, 0, u8::MAX])
            } else {
                image::Rgba([SKIN[0], SKIN[1], SKIN[2], u8::MAX])
            }
        });
        Self::from_pixels(size, size, image.into_raw())
    }

    /// Creates an image below the minimum analysable edge.
    #[must_use]
    pub fn tiny() -> ImageSample {
        Self::skin(16, 16)
    }

    fn from_pixels(width: u32, height: u32, pixels: Vec<u8>) -> ImageSample {
        match ImageSample::new(width, height, pixels) {
            Ok(sample) => sample,
            Err(e) => panic!("synthetic image is malformed: {e}"),
        }
    }

    // === Encoding ===

    /// Encodes `sample` as PNG.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn png(sample: &ImageSample) -> Result<Vec<u8>> {
        let image = RgbaImage::from_raw(sample.width(), sample.height(), sample.pixels().to_vec())
            .context("pixel buffer does not match dimensions")?;
        let mut bytes = Cursor::new(Vec::new());
        image
            .write_to(&mut bytes, ImageFormat::Png)
            .context("Failed to encode PNG")?;
        Ok(bytes.into_inner())
    }

    /// Encodes `sample` as a `data:image/png;base64,` URL.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn data_url(sample: &ImageSample) -> Result<String> {
        Ok(format!(
            "data:image/png;base64,{}",
            STANDARD.encode(Self::png(sample)?)
        ))
    }
}
