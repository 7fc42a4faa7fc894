use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of priority tiers per side.
pub const PRIORITY_COUNT: usize = 8;

/// Physical wafer side a tier is authored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Device layer (front).
    Device,
    /// Handle wafer (back).
    Handle,
}

impl Side {
    pub fn name(&self) -> &'static str {
        match self {
            Side::Device => "DEVICE",
            Side::Handle => "HANDLE",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether a tier's shapes take part in their own tier's clearance carve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Variant {
    Strict,
    /// Exempt from the carve of its own tier, not from higher-precedence tiers.
    NoIso,
}

/// Tier precedence. 0 is highest, 7 is lowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Priority(u8);

/// Fold order: lowest precedence first, so later tiers override earlier ones.
pub const PRIORITY_ORDER: [Priority; PRIORITY_COUNT] = [
    Priority(7),
    Priority(6),
    Priority(5),
    Priority(4),
    Priority(3),
    Priority(2),
    Priority(1),
    Priority(0),
];

impl Priority {
    pub const HIGHEST: Priority = Priority(0);
    pub const LOWEST: Priority = Priority((PRIORITY_COUNT - 1) as u8);

    pub fn new(value: u8) -> Option<Self> {
        ((value as usize) < PRIORITY_COUNT).then_some(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// All priorities in ascending numeric order (highest precedence first).
    pub fn all() -> impl Iterator<Item = Priority> {
        (0..PRIORITY_COUNT as u8).map(Priority)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for Priority {
    type Error = LayerParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Priority::new(value).ok_or(LayerParseError::PriorityOutOfRange(value))
    }
}

impl From<Priority> for u8 {
    fn from(p: Priority) -> Self {
        p.0
    }
}

/// A prioritized feature layer. Handle tiers are always [`Variant::Strict`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TierKey {
    side: Side,
    priority: Priority,
    variant: Variant,
}

impl TierKey {
    pub fn device(priority: Priority, variant: Variant) -> Self {
        Self {
            side: Side::Device,
            priority,
            variant,
        }
    }

    pub fn handle(priority: Priority) -> Self {
        Self {
            side: Side::Handle,
            priority,
            variant: Variant::Strict,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }
}

/// Priority-independent layers, both raw inputs and final outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Channel {
    /// Scratch layer, never part of a final mask.
    Dummy,
    Device,
    DeviceRemove,
    HandleRemove,
    HandleStepEtch,
    ViasEtch,
    /// Tip level 0, written as `TIP` (alias `TIP0`).
    Tip,
    Tip1,
    Tip2,
    Tip3,
}

impl Channel {
    pub const ALL: [Channel; 10] = [
        Channel::Dummy,
        Channel::Device,
        Channel::DeviceRemove,
        Channel::HandleRemove,
        Channel::HandleStepEtch,
        Channel::ViasEtch,
        Channel::Tip,
        Channel::Tip1,
        Channel::Tip2,
        Channel::Tip3,
    ];

    /// Every tip level, lowest first.
    pub const TIPS: [Channel; 4] = [Channel::Tip, Channel::Tip1, Channel::Tip2, Channel::Tip3];

    pub fn name(&self) -> &'static str {
        match self {
            Channel::Dummy => "DUMMY",
            Channel::Device => "DEVICE",
            Channel::DeviceRemove => "DEVICE_REMOVE",
            Channel::HandleRemove => "HANDLE_REMOVE",
            Channel::HandleStepEtch => "HANDLE_STEP_ETCH",
            Channel::ViasEtch => "VIAS_ETCH",
            Channel::Tip => "TIP",
            Channel::Tip1 => "TIP1",
            Channel::Tip2 => "TIP2",
            Channel::Tip3 => "TIP3",
        }
    }

    /// GDS `(layer, datatype)` pair of this channel in the mask interchange file.
    pub fn gds_pair(&self) -> (u16, u16) {
        match self {
            Channel::Dummy => (0, 0),
            Channel::Device => (1, 0),
            Channel::DeviceRemove => (2, 0),
            Channel::HandleRemove => (12, 0),
            Channel::HandleStepEtch => (13, 0),
            Channel::ViasEtch => (21, 0),
            Channel::Tip => (22, 0),
            Channel::Tip1 => (22, 1),
            Channel::Tip2 => (22, 2),
            Channel::Tip3 => (22, 3),
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const DEVICE_TIER_GDS_LAYER: u16 = 3;
const HANDLE_TIER_GDS_LAYER: u16 = 11;
/// Datatype offset of NOISO tiers in the interchange file only.
const NOISO_GDS_DATATYPE_OFFSET: u16 = 10;

/// Identifies one raw or resolved polygon channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LayerKey {
    Tier(TierKey),
    Channel(Channel),
}

impl LayerKey {
    pub fn device_tier(priority: Priority, variant: Variant) -> Self {
        LayerKey::Tier(TierKey::device(priority, variant))
    }

    pub fn handle_tier(priority: Priority) -> Self {
        LayerKey::Tier(TierKey::handle(priority))
    }

    pub fn side(&self) -> Option<Side> {
        match self {
            LayerKey::Tier(t) => Some(t.side),
            LayerKey::Channel(_) => None,
        }
    }

    pub fn priority(&self) -> Option<Priority> {
        match self {
            LayerKey::Tier(t) => Some(t.priority),
            LayerKey::Channel(_) => None,
        }
    }

    pub fn variant(&self) -> Option<Variant> {
        match self {
            LayerKey::Tier(t) => Some(t.variant),
            LayerKey::Channel(_) => None,
        }
    }

    pub fn gds_pair(&self) -> (u16, u16) {
        match self {
            LayerKey::Channel(c) => c.gds_pair(),
            LayerKey::Tier(t) => {
                let p = t.priority.value() as u16;
                match (t.side, t.variant) {
                    (Side::Device, Variant::Strict) => (DEVICE_TIER_GDS_LAYER, p),
                    (Side::Device, Variant::NoIso) => {
                        (DEVICE_TIER_GDS_LAYER, p + NOISO_GDS_DATATYPE_OFFSET)
                    }
                    (Side::Handle, _) => (HANDLE_TIER_GDS_LAYER, p),
                }
            }
        }
    }
}

impl From<Channel> for LayerKey {
    fn from(c: Channel) -> Self {
        LayerKey::Channel(c)
    }
}

impl From<TierKey> for LayerKey {
    fn from(t: TierKey) -> Self {
        LayerKey::Tier(t)
    }
}

impl fmt::Display for LayerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerKey::Channel(c) => f.write_str(c.name()),
            LayerKey::Tier(t) => {
                write!(f, "{}_P{}", t.side.name(), t.priority)?;
                if t.variant == Variant::NoIso {
                    f.write_str("_NOISO")?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayerParseError {
    #[error("Unknown layer name '{0}'")]
    UnknownLayer(String),

    #[error("Priority {0} is out of range 0..=7")]
    PriorityOutOfRange(u8),

    #[error("Handle tiers have no NOISO variant: '{0}'")]
    HandleNoIso(String),
}

impl FromStr for LayerKey {
    type Err = LayerParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(channel) = Channel::ALL.iter().find(|c| c.name() == s) {
            return Ok(LayerKey::Channel(*channel));
        }
        if s == "TIP0" {
            return Ok(LayerKey::Channel(Channel::Tip));
        }

        let (side, rest) = if let Some(rest) = s.strip_prefix("DEVICE_P") {
            (Side::Device, rest)
        } else if let Some(rest) = s.strip_prefix("HANDLE_P") {
            (Side::Handle, rest)
        } else {
            return Err(LayerParseError::UnknownLayer(s.to_string()));
        };

        let (digits, variant) = match rest.strip_suffix("_NOISO") {
            Some(d) => (d, Variant::NoIso),
            None => (rest, Variant::Strict),
        };
        let value: u8 = digits
            .parse()
            .map_err(|_| LayerParseError::UnknownLayer(s.to_string()))?;
        let priority = Priority::try_from(value)?;

        match (side, variant) {
            (Side::Device, v) => Ok(LayerKey::device_tier(priority, v)),
            (Side::Handle, Variant::Strict) => Ok(LayerKey::handle_tier(priority)),
            (Side::Handle, Variant::NoIso) => Err(LayerParseError::HandleNoIso(s.to_string())),
        }
    }
}

impl TryFrom<String> for LayerKey {
    type Error = LayerParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LayerKey> for String {
    fn from(key: LayerKey) -> Self {
        key.to_string()
    }
}
