//! Captured image pixels.

use image::DynamicImage;

use crate::error::{AnalysisError, Result};

/// Bytes per RGBA pixel.
pub const CHANNELS: usize = 4;

/// An immutable RGBA8 pixel buffer, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSample {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl ImageSample {
    /// Wraps an RGBA8 buffer.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidInput`] if the buffer length is not
    /// `width * height * 4`. A zero-sized image with an empty buffer is accepted.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * CHANNELS;
        if pixels.len() != expected {
            return Err(AnalysisError::InvalidInput(format!(
                "pixel buffer has {} bytes, expected {expected} for {width}x{height} RGBA",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// An image where every pixel is `rgba`.
    #[must_use]
    pub fn filled(width: u32, height: u32, rgba: [u8; CHANNELS]) -> Self {
        Self {
            width,
            height,
            pixels: rgba.repeat(width as usize * height as usize),
        }
    }

    /// Converts a decoded image into RGBA8.
    #[must_use]
    pub fn from_dynamic(image: &DynamicImage) -> Self {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self {
            width,
            height,
            pixels: rgba.into_raw(),
        }
    }

    /// Image width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA bytes.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// RGB channels at `(x, y)`, or `None` outside the image.
    #[must_use]
    pub fn rgb(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = (y as usize * self.width as usize + x as usize) * CHANNELS;
        self.pixels
            .get(index..index + 3)
            .map(|p| [p[0], p[1], p[2]])
    }

    /// Mean of the RGB channels at `(x, y)`, or `None` outside the image.
    #[must_use]
    pub fn brightness(&self, x: u32, y: u32) -> Option<f64> {
        self.rgb(x, y)
            .map(|[r, g, b]| (f64::from(r) + f64::from(g) + f64::from(b)) / 3.0)
    }
}
