//! # Maskforge Resolve
//!
//! Turns a device's prioritized, overlapping layer tiers into final,
//! non-overlapping mask channels.
//!
//! The flow is linear: the device and handle folds run side by side, the
//! single-layer channels are clipped to the chip, CD compensation is applied,
//! and the assembler validates the result before any [`MaskSink`] sees it.

pub mod assemble;
pub mod clip;
pub mod compensation;
pub mod config;
pub mod device_fold;
pub mod diagnostics;
pub mod error;
pub mod handle_fold;
pub mod isolation;
pub mod layers;
pub mod pipeline;

pub use assemble::{AssembledMask, Assembler, AssemblyInput, MaskLayer, MaskSink};
pub use clip::{clip_channel, clip_channels, ClipMode};
pub use compensation::{compensate, compensation_offsets};
pub use config::ResolveConfig;
pub use device_fold::{fold_device, halo, resolve_device, DeviceOutputs, DeviceTiers};
pub use diagnostics::{Diagnostic, DiagnosticKind, Severity};
pub use error::{ResolveError, ResolveResult};
pub use handle_fold::{fold_handle, resolve_handle, HandleOutputs, HandleTiers};
pub use isolation::IsolationTable;
pub use layers::ResolvedLayers;
pub use pipeline::Pipeline;
