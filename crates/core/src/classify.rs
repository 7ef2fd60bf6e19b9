//! Brightness classification of the masked region.
//!
//! A single linear pass over the greyscale and mask buffers counts every
//! in-mask pixel whose luminance reaches the threshold, and paints those
//! pixels red in an RGB debug visualization.

use image::{GrayImage, Rgb, RgbImage};
use serde::Serialize;

use crate::error::CoreError;

/// Colour used in the visualization for bright in-mask pixels.
pub const BRIGHT_PIXEL_RGB: [u8; 3] = [255, 0, 0];

/// Pixel tallies from one classification pass.
///
/// Always satisfies `bright_within_mask <= total_within_mask <= grand_total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ClassificationResult {
    /// Every pixel of the frame (`width * height`).
    pub grand_total: u64,
    /// Pixels with a nonzero mask value.
    pub total_within_mask: u64,
    /// In-mask pixels at or above the brightness threshold.
    pub bright_within_mask: u64,
}

impl ClassificationResult {
    /// Fraction of the masked region that is bright.
    ///
    /// An empty region yields `0.0` rather than NaN, so "no region
    /// observed" reads as "no snow".
    pub fn ratio(&self) -> f64 {
        if self.total_within_mask == 0 {
            0.0
        } else {
            self.bright_within_mask as f64 / self.total_within_mask as f64
        }
    }
}

/// Counts plus the debug raster produced alongside them.
#[derive(Debug, Clone)]
pub struct Classification {
    pub result: ClassificationResult,
    /// Greyscale passthrough with bright in-mask pixels painted
    /// [`BRIGHT_PIXEL_RGB`].
    pub visualization: RgbImage,
}

/// Classify every in-mask pixel of `gray` against `brightness_threshold`.
///
/// The comparison is inclusive (`gray >= threshold` is bright) and any
/// nonzero mask value counts as inside. Fails with
/// [`CoreError::SizeMismatch`] if the two rasters disagree in dimensions.
pub fn classify(
    gray: &GrayImage,
    mask: &GrayImage,
    brightness_threshold: u8,
) -> Result<Classification, CoreError> {
    let gray_buf = gray.as_raw();
    let mask_buf = mask.as_raw();

    if gray.dimensions() != mask.dimensions() || gray_buf.len() != mask_buf.len() {
        let (gray_width, gray_height) = gray.dimensions();
        let (mask_width, mask_height) = mask.dimensions();
        return Err(CoreError::SizeMismatch {
            gray_width,
            gray_height,
            gray_len: gray_buf.len(),
            mask_width,
            mask_height,
            mask_len: mask_buf.len(),
        });
    }

    let (width, height) = gray.dimensions();
    let mut visualization = RgbImage::new(width, height);
    let mut result = ClassificationResult::default();

    for ((&luma, &inside), pixel) in gray_buf
        .iter()
        .zip(mask_buf)
        .zip(visualization.pixels_mut())
    {
        result.grand_total += 1;

        if inside > 0 {
            result.total_within_mask += 1;

            if luma >= brightness_threshold {
                result.bright_within_mask += 1;
                *pixel = Rgb(BRIGHT_PIXEL_RGB);
                continue;
            }
        }

        *pixel = Rgb([luma, luma, luma]);
    }

    Ok(Classification {
        result,
        visualization,
    })
}
