//! Geometry: axis-aligned boxes and Intersection-over-Union
use serde::{Deserialize, Serialize};

/// Axis-aligned box in image pixel space, serialized as `[x1, y1, x2, y2]`.
///
/// `x1 < x2` and `y1 < y2` are expected but not enforced. Inverted or
/// zero-size boxes are legal and behave as boxes of zero area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    pub const fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Horizontal extent, clamped at zero
    pub fn width(&self) -> f64 {
        (self.x2 - self.x1).max(0.0)
    }

    /// Vertical extent, clamped at zero
    pub fn height(&self) -> f64 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Area shared with `other`; zero for disjoint or degenerate boxes.
    pub fn intersection_area(&self, other: &BoundingBox) -> f64 {
        let x1 = self.x1.max(other.x1);
        let y1 = self.y1.max(other.y1);
        let x2 = self.x2.min(other.x2);
        let y2 = self.y2.min(other.y2);

        (x2 - x1).max(0.0) * (y2 - y1).max(0.0)
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from(v: [f64; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

/// Intersection over Union of two boxes, in `[0, 1]`.
///
/// Returns `0.0` when the union area is zero (both boxes degenerate)
/// instead of dividing by zero.
pub fn overlap(a: &BoundingBox, b: &BoundingBox) -> f64 {
    let intersection = a.intersection_area(b);
    let union = a.area() + b.area() - intersection;

    if union <= 0.0 {
        return 0.0;
    }

    (intersection / union).clamp(0.0, 1.0)
}
