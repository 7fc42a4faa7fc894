use geo::{Area, BoundingRect, Coord, LineString, MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};

use crate::geometry::{BBox, Point};

/// Zero or more planar regions on one layer, possibly disjoint and holed.
///
/// A `PolygonSet` is a value: kernel operations never modify their inputs and
/// always return a new set. Two sets covering the same region may differ in
/// representation, so region equality goes through
/// [`PolygonKernel::equivalent`](crate::kernel::PolygonKernel::equivalent).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolygonSet {
    polygons: MultiPolygon<f64>,
}

impl Default for PolygonSet {
    fn default() -> Self {
        Self::empty()
    }
}

impl PolygonSet {
    pub fn empty() -> Self {
        Self {
            polygons: MultiPolygon::new(Vec::new()),
        }
    }

    pub fn from_multi(polygons: MultiPolygon<f64>) -> Self {
        Self { polygons }
    }

    pub fn from_polygons(polygons: impl IntoIterator<Item = Polygon<f64>>) -> Self {
        Self::from_multi(MultiPolygon::new(polygons.into_iter().collect()))
    }

    /// Axis-aligned rectangle spanning two opposite corners.
    pub fn rect(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self::from_bbox(&BBox::from_corners(x1, y1, x2, y2))
    }

    pub fn from_bbox(bbox: &BBox) -> Self {
        let ring = vec![
            Coord { x: bbox.min.x, y: bbox.min.y },
            Coord { x: bbox.max.x, y: bbox.min.y },
            Coord { x: bbox.max.x, y: bbox.max.y },
            Coord { x: bbox.min.x, y: bbox.max.y },
        ];
        Self::from_polygons([Polygon::new(LineString::new(ring), Vec::new())])
    }

    /// One polygon from an exterior ring and optional holes. Rings are closed
    /// automatically.
    pub fn from_rings(exterior: &[Point], holes: &[Vec<Point>]) -> Self {
        let to_ring = |pts: &[Point]| -> LineString<f64> {
            pts.iter().map(|p| Coord { x: p.x, y: p.y }).collect()
        };
        let interiors = holes.iter().map(|h| to_ring(h)).collect();
        Self::from_polygons([Polygon::new(to_ring(exterior), interiors)])
    }

    /// Concatenate without any boolean evaluation. Overlaps are left for the
    /// kernel to merge when the layer is extracted.
    pub fn concat(&self, other: &PolygonSet) -> PolygonSet {
        let mut polygons = self.polygons.0.clone();
        polygons.extend(other.polygons.0.iter().cloned());
        Self::from_polygons(polygons)
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.polygons.0.len()
    }

    pub fn polygons(&self) -> &[Polygon<f64>] {
        &self.polygons.0
    }

    pub fn as_multi(&self) -> &MultiPolygon<f64> {
        &self.polygons
    }

    pub fn area(&self) -> f64 {
        self.polygons.unsigned_area()
    }

    pub fn bbox(&self) -> Option<BBox> {
        self.polygons.bounding_rect().map(|r| {
            BBox::new(
                Point::new(r.min().x, r.min().y),
                Point::new(r.max().x, r.max().y),
            )
        })
    }
}
