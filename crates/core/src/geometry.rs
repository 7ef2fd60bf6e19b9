//! Region-of-interest geometry in snapshot pixel coordinates.
//!
//! Polygon coordinates are used verbatim against whatever resolution the
//! camera returns. Nothing rescales them, so a camera resolution change
//! silently misaligns the region.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Minimum number of vertices for a polygon to enclose any area.
pub const MIN_POLYGON_POINTS: usize = 3;

/// Largest accepted absolute coordinate value.
///
/// Far beyond any camera resolution, and small enough that edge deltas
/// cannot overflow `i32` during rasterization.
pub const MAX_COORDINATE: i32 = 1 << 20;

/// A single pixel coordinate.
///
/// Serializes as a two-element array (`[x, y]`), matching the
/// `POLYGON_POINTS` configuration format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(i32, i32)", into = "(i32, i32)")]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Both coordinates lie within `±MAX_COORDINATE`.
    pub fn in_range(&self) -> bool {
        (-MAX_COORDINATE..=MAX_COORDINATE).contains(&self.x)
            && (-MAX_COORDINATE..=MAX_COORDINATE).contains(&self.y)
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl From<Point> for (i32, i32) {
    fn from(p: Point) -> Self {
        (p.x, p.y)
    }
}

/// Ordered, closed sequence of vertices. Edge `i` joins vertex `i` to
/// vertex `i + 1`, and the last vertex joins back to the first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polygon {
    points: Vec<Point>,
}

impl Polygon {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Every vertex lies within `±MAX_COORDINATE`.
    pub fn in_range(&self) -> bool {
        self.points.iter().all(Point::in_range)
    }

    /// Distinct ring of vertices: consecutive repeats collapsed and any
    /// closing vertices equal to the first dropped.
    ///
    /// The result never has `first == last` unless it holds a single point.
    pub fn open_ring(&self) -> Vec<Point> {
        let mut ring = self.points.clone();
        ring.dedup();

        while ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }

        ring
    }
}

impl FromIterator<Point> for Polygon {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Formats as SVG-style `x,y x,y ...`.
impl fmt::Display for Polygon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, p) in self.points.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{},{}", p.x, p.y)?;
        }
        Ok(())
    }
}
