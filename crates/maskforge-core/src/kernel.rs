//! Polygon-set kernel.
//!
//! The resolution engine only talks to polygon geometry through
//! [`PolygonKernel`]. [`ClipperKernel`] is the shipped implementation, built on
//! `geo-clipper`: coordinates are scaled by `factor` onto an integer grid, so
//! results are exact and deterministic at that resolution.

use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::algorithm::orient::{Direction, Orient};
use geo::{Coord, Line, LineString, MultiPolygon};
use geo_clipper::{Clipper, EndType, JoinType};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::device::Device;
use crate::geometry::BBox;
use crate::layer::LayerKey;
use crate::polygon::PolygonSet;

/// Largest scaled coordinate Clipper accepts on its 64-bit grid.
const MAX_SCALED_COORD: f64 = 4.0e18;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum KernelError {
    #[error("Non-finite coordinate in layer {layer}")]
    NonFinite { layer: LayerKey },

    #[error("Degenerate ring in layer {layer}: only {vertices} distinct vertices")]
    DegenerateRing { layer: LayerKey, vertices: usize },

    #[error("Self-intersecting ring in layer {layer} near ({x:.4}, {y:.4})")]
    SelfIntersection { layer: LayerKey, x: f64, y: f64 },

    #[error("Coordinate {value} in layer {layer} exceeds the kernel range at scale {factor}")]
    OutOfRange {
        layer: LayerKey,
        value: f64,
        factor: f64,
    },

    #[error("Invalid offset distance {0}")]
    InvalidDistance(f64),
}

pub type KernelResult<T> = Result<T, KernelError>;

/// The six polygon-set operations the engine is written against.
///
/// All operations are pure: identical inputs give identical outputs, and no
/// input is modified.
pub trait PolygonKernel: Send + Sync {
    fn union(&self, a: &PolygonSet, b: &PolygonSet) -> KernelResult<PolygonSet>;

    fn intersect(&self, a: &PolygonSet, b: &PolygonSet) -> KernelResult<PolygonSet>;

    /// `a` minus `b`.
    fn difference(&self, a: &PolygonSet, b: &PolygonSet) -> KernelResult<PolygonSet>;

    /// Signed offset: positive dilates, negative erodes. Eroding past the
    /// feature size yields the empty set.
    fn offset(&self, a: &PolygonSet, distance: f64) -> KernelResult<PolygonSet>;

    /// Raw, validated and normalized contents of one layer of `device`.
    fn extract(&self, device: &Device, key: LayerKey) -> KernelResult<PolygonSet>;

    fn crop(&self, a: &PolygonSet, rect: &BBox) -> KernelResult<PolygonSet> {
        self.intersect(a, &PolygonSet::from_bbox(rect))
    }

    /// Region equality: the symmetric difference has at most `tolerance` area.
    fn equivalent(&self, a: &PolygonSet, b: &PolygonSet, tolerance: f64) -> KernelResult<bool> {
        let a_only = self.difference(a, b)?;
        let b_only = self.difference(b, a)?;
        Ok(a_only.area() + b_only.area() <= tolerance)
    }

    /// The part of `inner` that `outer` fails to cover, ignoring slivers
    /// thinner than `2 * sliver` left by grid snapping.
    fn uncovered(
        &self,
        outer: &PolygonSet,
        inner: &PolygonSet,
        sliver: f64,
    ) -> KernelResult<PolygonSet> {
        let residue = self.difference(inner, outer)?;
        if residue.is_empty() || sliver <= 0.0 {
            return Ok(residue);
        }
        if self.offset(&residue, -sliver)?.is_empty() {
            Ok(PolygonSet::empty())
        } else {
            Ok(residue)
        }
    }
}

/// Corner treatment for offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinStyle {
    /// Sharp corners; rectilinear shapes offset exactly.
    #[default]
    Miter,
    Round,
    Square,
}

impl From<JoinStyle> for JoinType {
    fn from(style: JoinStyle) -> Self {
        match style {
            JoinStyle::Miter => JoinType::Miter(2.0),
            JoinStyle::Round => JoinType::Round(0.25),
            JoinStyle::Square => JoinType::Square,
        }
    }
}

/// [`PolygonKernel`] backed by the Clipper library.
#[derive(Debug, Clone, Copy)]
pub struct ClipperKernel {
    factor: f64,
    join: JoinStyle,
}

impl Default for ClipperKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl ClipperKernel {
    /// 1 nm grid for micrometer coordinates.
    pub const DEFAULT_FACTOR: f64 = 1000.0;

    pub fn new() -> Self {
        Self {
            factor: Self::DEFAULT_FACTOR,
            join: JoinStyle::default(),
        }
    }

    pub fn with_join(mut self, join: JoinStyle) -> Self {
        self.join = join;
        self
    }

    fn validate(&self, layer: LayerKey, raw: &PolygonSet) -> KernelResult<()> {
        for polygon in raw.polygons() {
            self.check_ring(layer, polygon.exterior())?;
            for hole in polygon.interiors() {
                self.check_ring(layer, hole)?;
            }
        }
        Ok(())
    }

    fn check_ring(&self, layer: LayerKey, ring: &LineString<f64>) -> KernelResult<()> {
        let mut vertices: Vec<Coord<f64>> = Vec::with_capacity(ring.0.len());
        for c in ring.coords() {
            if !c.x.is_finite() || !c.y.is_finite() {
                return Err(KernelError::NonFinite { layer });
            }
            for value in [c.x, c.y] {
                if (value * self.factor).abs() > MAX_SCALED_COORD {
                    return Err(KernelError::OutOfRange {
                        layer,
                        value,
                        factor: self.factor,
                    });
                }
            }
            if vertices.last() != Some(c) {
                vertices.push(*c);
            }
        }
        if vertices.len() > 1 && vertices.first() == vertices.last() {
            vertices.pop();
        }
        if vertices.len() < 3 {
            return Err(KernelError::DegenerateRing {
                layer,
                vertices: vertices.len(),
            });
        }

        let n = vertices.len();
        let edges: Vec<Line<f64>> = (0..n)
            .map(|i| Line::new(vertices[i], vertices[(i + 1) % n]))
            .collect();

        for i in 0..n {
            for j in (i + 1)..n {
                let adjacent = j == i + 1 || (i == 0 && j == n - 1);
                let hit = match line_intersection(edges[i], edges[j]) {
                    None => None,
                    Some(LineIntersection::SinglePoint { intersection, is_proper: true }) => {
                        Some(intersection)
                    }
                    // Touching vertices, including the ends of a keyhole seam.
                    Some(LineIntersection::SinglePoint { .. }) => None,
                    // A keyhole seam is one edge walked out and straight back.
                    Some(LineIntersection::Collinear { .. })
                        if !adjacent
                            && edges[i].start == edges[j].end
                            && edges[i].end == edges[j].start =>
                    {
                        None
                    }
                    Some(LineIntersection::Collinear { intersection }) => Some(intersection.start),
                };
                if let Some(at) = hit {
                    return Err(KernelError::SelfIntersection {
                        layer,
                        x: at.x,
                        y: at.y,
                    });
                }
            }
        }
        Ok(())
    }
}

impl PolygonKernel for ClipperKernel {
    fn union(&self, a: &PolygonSet, b: &PolygonSet) -> KernelResult<PolygonSet> {
        if a.is_empty() {
            return Ok(b.clone());
        }
        if b.is_empty() {
            return Ok(a.clone());
        }
        let result = a.as_multi().union(b.as_multi(), self.factor);
        Ok(PolygonSet::from_multi(result))
    }

    fn intersect(&self, a: &PolygonSet, b: &PolygonSet) -> KernelResult<PolygonSet> {
        if a.is_empty() || b.is_empty() {
            return Ok(PolygonSet::empty());
        }
        let result = a.as_multi().intersection(b.as_multi(), self.factor);
        Ok(PolygonSet::from_multi(result))
    }

    fn difference(&self, a: &PolygonSet, b: &PolygonSet) -> KernelResult<PolygonSet> {
        if a.is_empty() {
            return Ok(PolygonSet::empty());
        }
        if b.is_empty() {
            return Ok(a.clone());
        }
        let result = a.as_multi().difference(b.as_multi(), self.factor);
        Ok(PolygonSet::from_multi(result))
    }

    fn offset(&self, a: &PolygonSet, distance: f64) -> KernelResult<PolygonSet> {
        if !distance.is_finite() {
            return Err(KernelError::InvalidDistance(distance));
        }
        if a.is_empty() || distance == 0.0 {
            return Ok(a.clone());
        }
        let result = a.as_multi().offset(
            distance,
            self.join.into(),
            EndType::ClosedPolygon,
            self.factor,
        );
        Ok(PolygonSet::from_multi(result))
    }

    fn extract(&self, device: &Device, key: LayerKey) -> KernelResult<PolygonSet> {
        let raw = match device.layer(key) {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Ok(PolygonSet::empty()),
        };
        self.validate(key, raw)?;

        // Shape authors freely overlap polygons on one layer; a single-operand
        // union resolves them into disjoint regions.
        let oriented = raw.as_multi().orient(Direction::Default);
        let merged = oriented.union(&MultiPolygon::<f64>::new(Vec::new()), self.factor);
        log::debug!(
            "Extracted {}: {} polygons -> {} regions",
            key,
            raw.len(),
            merged.0.len()
        );
        Ok(PolygonSet::from_multi(merged))
    }
}
