//! # Maskforge I/O
//!
//! JSON build settings and JSON device dumps. Binary mask writers plug in
//! through [`maskforge_resolve::MaskSink`].

pub mod device_file;
pub mod settings;

pub use device_file::{DeviceFile, DeviceFileError};
pub use settings::{ArtifactStage, BuildSettings, SettingsError};
