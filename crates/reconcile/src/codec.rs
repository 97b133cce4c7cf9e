//! Pixel <-> normalized center/extent conversion
//!
//! The detection model reads and writes boxes as
//! `(center_x, center_y, width, height)`, each a fraction of the image size.
//!
//! Historical quirk: the forward transform treats pixel edges as inclusive and
//! adds one pixel to the width and height, but not to the center, and the
//! inverse does not take that pixel back off. Existing trained models and
//! label files depend on both halves exactly as written, so a round trip can
//! move an edge by up to one pixel.

use crate::geometry::BoundingBox;
use crate::{ReconcileError, Result};
use serde::{Deserialize, Serialize};

/// Pixel dimensions of a sheet image; both sides are non-zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    width: u32,
    height: u32,
}

impl ImageSize {
    /// Create an image size, rejecting zero dimensions
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(ReconcileError::InvalidImageSize { width, height });
        }
        Ok(Self { width, height })
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Box as fractions of the image size, center based
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedBox {
    pub center_x: f64,
    pub center_y: f64,
    pub width: f64,
    pub height: f64,
}

impl NormalizedBox {
    #[must_use]
    pub fn new(center_x: f64, center_y: f64, width: f64, height: f64) -> Self {
        Self {
            center_x,
            center_y,
            width,
            height,
        }
    }
}

/// Convert a pixel box to normalized center/extent form
#[must_use]
pub fn to_normalized(bbox: &BoundingBox, size: ImageSize) -> NormalizedBox {
    let width = f64::from(size.width);
    let height = f64::from(size.height);

    NormalizedBox {
        center_x: (bbox.left + bbox.right) / 2.0 / width,
        center_y: (bbox.top + bbox.bottom) / 2.0 / height,
        // Inclusive pixel bounds: +1 on extents only
        width: (bbox.right - bbox.left + 1.0) / width,
        height: (bbox.bottom - bbox.top + 1.0) / height,
    }
}

/// Convert a normalized box back to whole-pixel edges.
///
/// Edges are rounded half to even. The `+1` added by [`to_normalized`] is not
/// removed.
#[must_use]
pub fn to_absolute(normalized: &NormalizedBox, size: ImageSize) -> BoundingBox {
    let width = f64::from(size.width);
    let height = f64::from(size.height);

    let center_x = normalized.center_x * width;
    let center_y = normalized.center_y * height;
    let radius_x = normalized.width * width / 2.0;
    let radius_y = normalized.height * height / 2.0;

    BoundingBox::new(
        (center_x - radius_x).round_ties_even(),
        (center_y - radius_y).round_ties_even(),
        (center_x + radius_x).round_ties_even(),
        (center_y + radius_y).round_ties_even(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_image_size_rejects_zero() {
        assert!(ImageSize::new(0, 10).is_err());
        assert!(ImageSize::new(10, 0).is_err());
        let size = ImageSize::new(640, 480).unwrap();
        assert_eq!((size.width(), size.height()), (640, 480));
    }

    #[test]
    fn test_to_normalized_adds_one_pixel_to_extent() {
        let size = ImageSize::new(100, 100).unwrap();
        let norm = to_normalized(&BoundingBox::new(0.0, 0.0, 10.0, 10.0), size);
        assert!(close(norm.center_x, 0.05));
        assert!(close(norm.center_y, 0.05));
        assert!(close(norm.width, 0.11));
        assert!(close(norm.height, 0.11));
    }

    #[test]
    fn test_to_normalized_non_square() {
        let size = ImageSize::new(200, 400).unwrap();
        let norm = to_normalized(&BoundingBox::new(20.0, 40.0, 59.0, 139.0), size);
        assert!(close(norm.center_x, 39.5 / 200.0));
        assert!(close(norm.center_y, 89.5 / 400.0));
        assert!(close(norm.width, 40.0 / 200.0));
        assert!(close(norm.height, 100.0 / 400.0));
    }

    #[test]
    fn test_to_absolute() {
        let size = ImageSize::new(1000, 500).unwrap();
        let bbox = to_absolute(&NormalizedBox::new(0.5, 0.5, 0.2, 0.1), size);
        assert_eq!(bbox, BoundingBox::new(400.0, 225.0, 600.0, 275.0));
    }

    #[test]
    fn test_to_absolute_rounds_half_to_even() {
        let size = ImageSize::new(100, 100).unwrap();
        // Edges land on 2.5 and 7.5
        let bbox = to_absolute(&NormalizedBox::new(0.05, 0.05, 0.05, 0.05), size);
        assert_eq!(bbox, BoundingBox::new(2.0, 2.0, 8.0, 8.0));
    }

    #[test]
    fn test_round_trip_is_off_by_at_most_one() {
        let size = ImageSize::new(100, 100).unwrap();
        let original = BoundingBox::new(1.0, 1.0, 10.0, 10.0);
        let back = to_absolute(&to_normalized(&original, size), size);
        assert!((back.left - original.left).abs() <= 1.0);
        assert!((back.top - original.top).abs() <= 1.0);
        assert!((back.right - original.right).abs() <= 1.0);
        assert!((back.bottom - original.bottom).abs() <= 1.0);
        assert_eq!(back, BoundingBox::new(0.0, 0.0, 10.0, 10.0));
    }
}
