//! Box geometry: area, intersection and intersection over union

use serde::{Deserialize, Serialize};

/// Axis-aligned box given by its edges.
///
/// Coordinates are usually pixels but nothing here depends on the unit.
/// Well-formed boxes have `right >= left` and `bottom >= top`; inverted or
/// zero-width boxes are tolerated and simply have zero area.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl BoundingBox {
    /// Create a new bounding box
    #[must_use]
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Horizontal extent, clamped at zero
    #[must_use]
    #[inline]
    pub fn width(&self) -> f64 {
        (self.right - self.left).max(0.0)
    }

    /// Vertical extent, clamped at zero
    #[must_use]
    #[inline]
    pub fn height(&self) -> f64 {
        (self.bottom - self.top).max(0.0)
    }

    /// Get area of bounding box
    #[must_use]
    #[inline]
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Overlap rectangle of two boxes; may be inverted when they are disjoint
    #[must_use]
    pub fn overlap(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox::new(
            self.left.max(other.left),
            self.top.max(other.top),
            self.right.min(other.right),
            self.bottom.min(other.bottom),
        )
    }

    /// Area shared by two boxes, zero when they do not overlap
    #[must_use]
    #[inline]
    pub fn intersection_area(&self, other: &BoundingBox) -> f64 {
        self.overlap(other).area()
    }

    /// Calculate Intersection over Union (`IoU`) with another box.
    ///
    /// Returns 0 when the union is empty (two zero-area boxes).
    #[must_use]
    #[inline]
    pub fn iou(&self, other: &BoundingBox) -> f64 {
        let intersection_area = self.intersection_area(other);
        let union_area = self.area() + other.area() - intersection_area;

        if union_area > 0.0 {
            intersection_area / union_area
        } else {
            0.0
        }
    }

    /// True when all four edges are finite numbers
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.left.is_finite()
            && self.top.is_finite()
            && self.right.is_finite()
            && self.bottom.is_finite()
    }

    /// Multiply every edge by `factor`.
    ///
    /// This scales position as well as size; it is meant for undoing a uniform
    /// image downscale, not for growing a box around its center.
    #[must_use]
    pub fn scaled(&self, factor: f64) -> BoundingBox {
        BoundingBox::new(
            self.left * factor,
            self.top * factor,
            self.right * factor,
            self.bottom * factor,
        )
    }

    /// Tightest box enclosing both boxes
    #[must_use]
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox::new(
            self.left.min(other.left),
            self.top.min(other.top),
            self.right.max(other.right),
            self.bottom.max(other.bottom),
        )
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from([left, top, right, bottom]: [f64; 4]) -> Self {
        Self::new(left, top, right, bottom)
    }
}
