use thiserror::Error;

use maskforge_core::{Channel, KernelError, Priority, Side};

/// Fatal resolution errors. Any of these aborts the build before the sink
/// sees a single channel.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Invalid {side} isolation distance {distance} for priority {priority}")]
    InvalidIsolation {
        side: Side,
        priority: Priority,
        distance: f64,
    },

    #[error("Invalid {name} CD compensation {value}")]
    InvalidCompensation { name: &'static str, value: f64 },

    #[error("{channel} cannot be clipped: {reason}")]
    ClipChannelConflict {
        channel: Channel,
        reason: &'static str,
    },

    #[error("Invalid chip outline {width} x {height}")]
    InvalidOutline { width: f64, height: f64 },

    #[error("Polygon kernel failure: {0}")]
    Kernel(#[from] KernelError),

    #[error("{outer} does not contain {inner}: {area:.6} um^2 uncovered")]
    ContainmentViolation {
        outer: Channel,
        inner: Channel,
        area: f64,
    },

    #[error("Base DEVICE pattern not fully retained: {area:.6} um^2 missing")]
    BaseExcluded { area: f64 },

    #[error("Shape library failed: {0}")]
    ShapeLibrary(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Mask sink rejected the output: {0}")]
    Sink(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type ResolveResult<T> = Result<T, ResolveError>;
