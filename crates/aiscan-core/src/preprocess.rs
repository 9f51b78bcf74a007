//! Resize-and-normalize into the classifier's input contract.

use image::imageops::{self, FilterType};
use image::{ImageBuffer, Rgba};

use crate::domain::ImageSample;
use crate::error::{AnalysisError, Result};

/// Edge length the classifier expects.
pub const INPUT_SIZE: usize = 224;

/// A channel-planar `[1, 3, S, S]` float tensor with values in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct InputTensor {
    data: Vec<f32>,
    size: usize,
}

impl InputTensor {
    /// Flat data: the R plane, then G, then B.
    #[must_use]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Consumes the tensor, returning its flat data.
    #[must_use]
    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    /// Edge length `S`.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// `[1, 3, S, S]`.
    #[must_use]
    pub const fn shape(&self) -> [usize; 4] {
        [1, 3, self.size, self.size]
    }
}

/// Bilinear-resizes to `INPUT_SIZE` and normalizes to channel planes.
///
/// # Errors
///
/// See [`preprocess_to`].
pub fn preprocess(sample: &ImageSample) -> Result<InputTensor> {
    preprocess_to(sample, INPUT_SIZE)
}

/// Bilinear-resizes to `size x size`, drops alpha and divides by 255.
///
/// # Errors
///
/// Returns [`AnalysisError::Environment`] if the pixels cannot be handed to
/// the image scaler, and [`AnalysisError::InvalidInput`] for empty images.
pub fn preprocess_to(sample: &ImageSample, size: usize) -> Result<InputTensor> {
    let (width, height) = (sample.width(), sample.height());
    if width == 0 || height == 0 || size == 0 {
        return Err(AnalysisError::InvalidInput(format!(
            "cannot preprocess {width}x{height} image to {size}x{size}"
        )));
    }

    let source = ImageBuffer::<Rgba<u8>, &[u8]>::from_raw(width, height, sample.pixels())
        .ok_or_else(|| {
            AnalysisError::Environment(format!(
                "image scaler rejected {width}x{height} RGBA buffer of {} bytes",
                sample.pixels().len()
            ))
        })?;

    let edge = u32::try_from(size)
        .map_err(|_| AnalysisError::Environment(format!("unsupported input size {size}")))?;
    let resized = imageops::resize(&source, edge, edge, FilterType::Triangle);

    let plane = size * size;
    let mut data = vec![0.0f32; 3 * plane];
    for (i, pixel) in resized.pixels().enumerate() {
        data[i] = f32::from(pixel[0]) / 255.0;
        data[i + plane] = f32::from(pixel[1]) / 255.0;
        data[i + 2 * plane] = f32::from(pixel[2]) / 255.0;
    }

    Ok(InputTensor { data, size })
}
