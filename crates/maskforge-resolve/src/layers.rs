use std::collections::BTreeMap;

use serde::Serialize;

use maskforge_core::{Channel, PolygonSet};

/// One polygon set per resolved output channel.
///
/// Passes never edit a channel in place: each returns a new `ResolvedLayers`
/// built with [`with_channel`](Self::with_channel).
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolvedLayers {
    channels: BTreeMap<Channel, PolygonSet>,
}

impl ResolvedLayers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_channel(mut self, channel: Channel, set: PolygonSet) -> Self {
        self.channels.insert(channel, set);
        self
    }

    pub fn get(&self, channel: Channel) -> Option<&PolygonSet> {
        self.channels.get(&channel)
    }

    /// The channel's set, or an empty set when the channel was never produced.
    pub fn get_or_empty(&self, channel: Channel) -> PolygonSet {
        self.get(channel).cloned().unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Channel, &PolygonSet)> {
        self.channels.iter().map(|(c, s)| (*c, s))
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn into_inner(self) -> BTreeMap<Channel, PolygonSet> {
        self.channels
    }
}

impl FromIterator<(Channel, PolygonSet)> for ResolvedLayers {
    fn from_iter<I: IntoIterator<Item = (Channel, PolygonSet)>>(iter: I) -> Self {
        Self {
            channels: iter.into_iter().collect(),
        }
    }
}
