use serde::{Deserialize, Serialize};

use maskforge_core::{Channel, JoinStyle, Side};

use crate::error::{ResolveError, ResolveResult};
use crate::isolation::IsolationTable;

pub const DEFAULT_DEVICE_CD_COMPENSATION: f64 = 0.3;
pub const DEFAULT_HANDLE_CD_COMPENSATION: f64 = 0.0;
pub const DEFAULT_DEVICE_ISOLATION: f64 = 5.0;
/// Handle-side clearance: the cavity wall width.
pub const DEFAULT_HANDLE_ISOLATION: f64 = 50.0;
/// Residues thinner than twice this are grid-snapping noise, not violations.
pub const DEFAULT_SLIVER_TOLERANCE: f64 = 0.01;

/// Channels produced by the priority folds. The clip pass may not touch them.
pub const FOLD_OUTPUTS: [Channel; 4] = [
    Channel::Device,
    Channel::DeviceRemove,
    Channel::HandleRemove,
    Channel::HandleStepEtch,
];

/// Everything the resolver needs besides the device and the chip outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolveConfig {
    /// Compute the release pattern from the isolation-carved device. When
    /// off, DEVICE_REMOVE is passed through raw (debug only).
    pub merge_device_patterns: bool,
    /// Positive dilates DEVICE and erodes DEVICE_REMOVE.
    pub device_cd_compensation: f64,
    /// Positive erodes HANDLE_REMOVE.
    pub handle_cd_compensation: f64,
    pub device_isolation: IsolationTable,
    pub handle_isolation: IsolationTable,
    /// Channels kept only inside the chip.
    pub positive_channels: Vec<Channel>,
    /// Channels excluded from the chip footprint.
    pub negative_channels: Vec<Channel>,
    pub sliver_tolerance: f64,
    /// Corner treatment of every offset (halos, borders, CD compensation).
    #[serde(default)]
    pub join: JoinStyle,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            merge_device_patterns: true,
            device_cd_compensation: DEFAULT_DEVICE_CD_COMPENSATION,
            handle_cd_compensation: DEFAULT_HANDLE_CD_COMPENSATION,
            device_isolation: IsolationTable::uniform(DEFAULT_DEVICE_ISOLATION),
            handle_isolation: IsolationTable::uniform(DEFAULT_HANDLE_ISOLATION),
            positive_channels: std::iter::once(Channel::ViasEtch)
                .chain(Channel::TIPS)
                .collect(),
            negative_channels: Vec::new(),
            sliver_tolerance: DEFAULT_SLIVER_TOLERANCE,
            join: JoinStyle::Miter,
        }
    }
}

impl ResolveConfig {
    pub fn with_merge(mut self, merge: bool) -> Self {
        self.merge_device_patterns = merge;
        self
    }

    pub fn with_compensation(mut self, device: f64, handle: f64) -> Self {
        self.device_cd_compensation = device;
        self.handle_cd_compensation = handle;
        self
    }

    pub fn with_device_isolation(mut self, table: IsolationTable) -> Self {
        self.device_isolation = table;
        self
    }

    pub fn with_handle_isolation(mut self, table: IsolationTable) -> Self {
        self.handle_isolation = table;
        self
    }

    pub fn with_join(mut self, join: JoinStyle) -> Self {
        self.join = join;
        self
    }

    pub fn validate(&self) -> ResolveResult<()> {
        self.device_isolation.validate(Side::Device)?;
        self.handle_isolation.validate(Side::Handle)?;

        for (name, value) in [
            ("device", self.device_cd_compensation),
            ("handle", self.handle_cd_compensation),
        ] {
            if !value.is_finite() {
                return Err(ResolveError::InvalidCompensation { name, value });
            }
        }

        let mut seen = Vec::new();
        for &channel in self.positive_channels.iter().chain(&self.negative_channels) {
            if FOLD_OUTPUTS.contains(&channel) {
                return Err(ResolveError::ClipChannelConflict {
                    channel,
                    reason: "produced by a priority fold",
                });
            }
            if seen.contains(&channel) {
                return Err(ResolveError::ClipChannelConflict {
                    channel,
                    reason: "listed more than once",
                });
            }
            seen.push(channel);
        }
        Ok(())
    }
}
