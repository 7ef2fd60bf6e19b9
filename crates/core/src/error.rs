#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error(
        "Raster size mismatch: greyscale {gray_width}x{gray_height} ({gray_len} bytes), \
         mask {mask_width}x{mask_height} ({mask_len} bytes)"
    )]
    SizeMismatch {
        gray_width: u32,
        gray_height: u32,
        gray_len: usize,
        mask_width: u32,
        mask_height: u32,
        mask_len: usize,
    },

    #[error("Failed to decode snapshot: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Failed to encode JPEG: {0}")]
    Encode(#[source] image::ImageError),
}
