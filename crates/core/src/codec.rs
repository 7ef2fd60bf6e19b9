//! Image codec boundary: decode camera bytes, derive luminance, encode
//! debug JPEGs.

use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageFormat};

use crate::error::CoreError;

/// Decode a snapshot of any supported format (format sniffed from bytes).
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, CoreError> {
    image::load_from_memory(bytes).map_err(CoreError::Decode)
}

/// Single-channel luminance of `image`.
pub fn to_grayscale(image: &DynamicImage) -> GrayImage {
    image.to_luma8()
}

/// Encode any raster as JPEG.
///
/// JPEG has no alpha channel, so anything other than 8-bit greyscale or
/// RGB is flattened to RGB first.
pub fn encode_jpeg(image: &DynamicImage) -> Result<Vec<u8>, CoreError> {
    let mut buf = Cursor::new(Vec::new());

    let written = match image {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => {
            image.write_to(&mut buf, ImageFormat::Jpeg)
        }
        other => DynamicImage::ImageRgb8(other.to_rgb8()).write_to(&mut buf, ImageFormat::Jpeg),
    };
    written.map_err(CoreError::Encode)?;

    Ok(buf.into_inner())
}
