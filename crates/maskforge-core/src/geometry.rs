use serde::{Deserialize, Serialize};

/// A 2D point in layout coordinates (micrometers).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub min: Point,
    pub max: Point,
}

impl BBox {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Box spanning two opposite corners given in any order.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            min: Point::new(x1.min(x2), y1.min(y2)),
            max: Point::new(x1.max(x2), y1.max(y2)),
        }
    }

    /// Flat `[min_x, min_y, max_x, max_y]` form used in diagnostics.
    pub fn to_array(&self) -> [f64; 4] {
        [self.min.x, self.min.y, self.max.x, self.max.y]
    }
}

/// The chip footprint: a single rectangle centered on the origin.
///
/// Every final channel is cropped against it, and the release pattern is
/// computed as the part of the outline not covered by device material.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChipOutline {
    pub width: f64,
    pub height: f64,
}

impl ChipOutline {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn square(size: f64) -> Self {
        Self::new(size, size)
    }

    pub fn bbox(&self) -> BBox {
        let half_w = self.width / 2.0;
        let half_h = self.height / 2.0;
        BBox::new(Point::new(-half_w, -half_h), Point::new(half_w, half_h))
    }

    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_corners_normalizes() {
        let b = BBox::from_corners(10.0, 5.0, -2.0, -1.0);
        assert_eq!(b.min, Point::new(-2.0, -1.0));
        assert_eq!(b.max, Point::new(10.0, 5.0));
        assert_eq!(b.to_array(), [-2.0, -1.0, 10.0, 5.0]);
    }

    #[test]
    fn test_chip_outline_is_centered() {
        let outline = ChipOutline::square(6000.0);
        let bb = outline.bbox();
        assert!((bb.min.x + 3000.0).abs() < 1e-10);
        assert!((bb.max.y - 3000.0).abs() < 1e-10);
        assert!(outline.is_valid());
        assert!(!ChipOutline::new(0.0, 10.0).is_valid());
    }
}
