use serde::{Deserialize, Serialize};

use maskforge_core::{Channel, PolygonSet};

/// What a diagnostic is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// An erosion emptied a channel that had material before it.
    DegenerateResult,
    /// DEVICE_REMOVE was passed through without the isolation-carved release.
    UnmergedRelease,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Info,
}

/// A non-fatal finding recorded during resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub channel: Option<Channel>,
    pub message: String,
    /// Extent of the affected geometry: [min_x, min_y, max_x, max_y]
    pub bbox: Option<[f64; 4]>,
}

impl Diagnostic {
    pub fn degenerate(channel: Channel, before: &PolygonSet, distance: f64) -> Self {
        Self {
            kind: DiagnosticKind::DegenerateResult,
            severity: Severity::Warning,
            channel: Some(channel),
            message: format!(
                "{} ({:.3} um^2) vanished after offset by {}",
                channel,
                before.area(),
                distance
            ),
            bbox: before.bbox().map(|b| b.to_array()),
        }
    }

    pub fn unmerged_release() -> Self {
        Self {
            kind: DiagnosticKind::UnmergedRelease,
            severity: Severity::Info,
            channel: Some(Channel::DeviceRemove),
            message: "Device patterns not merged: DEVICE_REMOVE is raw and not isolation-correct"
                .to_string(),
            bbox: None,
        }
    }

    /// Emit through the `log` facade at the matching level.
    pub fn log(&self) {
        match self.severity {
            Severity::Warning => log::warn!("{}", self.message),
            Severity::Info => log::info!("{}", self.message),
        }
    }
}
