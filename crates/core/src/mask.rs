//! Region-of-interest mask rasterization.

use image::{GrayImage, Luma};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point as RasterPoint;

use crate::geometry::{Polygon, MAX_COORDINATE, MIN_POLYGON_POINTS};

/// Mask value written for pixels inside the polygon.
pub const MASK_INSIDE: u8 = 255;

/// Rasterize `polygon` into a `width` x `height` single-channel mask.
///
/// Pixels inside the polygon (boundary included) are [`MASK_INSIDE`],
/// everything else is `0`. Vertices outside the frame are clipped.
///
/// Degenerate input never fails: fewer than three distinct vertices, a
/// coordinate beyond [`MAX_COORDINATE`], or a zero-sized frame yields an
/// all-zero mask.
pub fn build_mask(width: u32, height: u32, polygon: &Polygon) -> GrayImage {
    let mut mask = GrayImage::new(width, height);

    if width == 0 || height == 0 || !polygon.in_range() {
        return mask;
    }

    let ring: Vec<RasterPoint<i32>> = polygon
        .open_ring()
        .into_iter()
        .map(|p| RasterPoint::new(p.x, p.y))
        .collect();

    if ring.len() < MIN_POLYGON_POINTS {
        return mask;
    }

    draw_polygon_mut(&mut mask, &ring, Luma([MASK_INSIDE]));
    mask
}
