//! # Maskforge Core
//!
//! Geometry primitives, the tagged layer model and the polygon-set kernel
//! shared by the mask resolution passes.
//!
//! Raw device shapes are keyed by [`LayerKey`]: either a prioritized tier
//! (`DEVICE_P3`, `DEVICE_P3_NOISO`, `HANDLE_P7`) or a literal channel
//! (`DEVICE`, `VIAS_ETCH`, ...). All boolean work goes through the
//! [`PolygonKernel`] trait.

pub mod geometry;
pub mod layer;
pub mod polygon;
pub mod kernel;
pub mod device;

pub use device::{Device, ShapeLibrary};
pub use geometry::{BBox, ChipOutline, Point};
pub use kernel::{ClipperKernel, JoinStyle, KernelError, KernelResult, PolygonKernel};
pub use layer::{Channel, LayerKey, Priority, Side, TierKey, Variant, PRIORITY_COUNT, PRIORITY_ORDER};
pub use polygon::PolygonSet;
