//! Handle-side priority fold.
//!
//! Handle tiers mark holes, not material. Each tier punches its shapes out of
//! the accumulated removal pattern and adds the border ring around them, so a
//! support wall of the isolation width is etched around every hole.

use maskforge_core::{
    Channel, Device, KernelResult, LayerKey, PolygonKernel, PolygonSet, Priority, PRIORITY_COUNT,
};

use crate::device_fold::halo;
use crate::isolation::IsolationTable;

/// Raw handle-side inputs.
#[derive(Debug, Clone)]
pub struct HandleTiers {
    /// Hole shapes, indexed by priority.
    pub holes: [PolygonSet; PRIORITY_COUNT],
    /// The literal HANDLE_REMOVE channel.
    pub remove: PolygonSet,
    /// The literal HANDLE_STEP_ETCH channel.
    pub step_etch: PolygonSet,
}

impl HandleTiers {
    pub fn extract<K: PolygonKernel + ?Sized>(kernel: &K, device: &Device) -> KernelResult<Self> {
        let mut tiers = Self::empty();
        for p in Priority::all() {
            tiers.holes[p.index()] = kernel.extract(device, LayerKey::handle_tier(p))?;
        }
        tiers.remove = kernel.extract(device, Channel::HandleRemove.into())?;
        tiers.step_etch = kernel.extract(device, Channel::HandleStepEtch.into())?;
        Ok(tiers)
    }

    pub fn empty() -> Self {
        Self {
            holes: Default::default(),
            remove: PolygonSet::empty(),
            step_etch: PolygonSet::empty(),
        }
    }

    pub fn with_holes(mut self, priority: Priority, set: PolygonSet) -> Self {
        self.holes[priority.index()] = set;
        self
    }

    pub fn with_remove(mut self, set: PolygonSet) -> Self {
        self.remove = set;
        self
    }

    pub fn with_step_etch(mut self, set: PolygonSet) -> Self {
        self.step_etch = set;
        self
    }
}

pub fn fold_handle<K: PolygonKernel + ?Sized>(
    kernel: &K,
    tiers: &HandleTiers,
    isolation: &IsolationTable,
    order: &[Priority],
) -> KernelResult<PolygonSet> {
    let mut remove = PolygonSet::empty();

    for &priority in order {
        let holes = &tiers.holes[priority.index()];
        if holes.is_empty() {
            continue;
        }

        remove = kernel.difference(&remove, holes)?;
        let border = halo(kernel, holes, isolation.get(priority))?;
        remove = kernel.union(&remove, &border)?;

        log::debug!(
            "HANDLE_P{}: {} holes, border {:.3} um^2, accumulated {:.3} um^2",
            priority,
            holes.len(),
            border.area(),
            remove.area()
        );
    }

    Ok(remove)
}

/// Final HANDLE_REMOVE and HANDLE_STEP_ETCH before CD compensation.
#[derive(Debug, Clone)]
pub struct HandleOutputs {
    pub handle_remove: PolygonSet,
    /// Always a superset of `handle_remove`.
    pub handle_step_etch: PolygonSet,
}

pub fn resolve_handle<K: PolygonKernel + ?Sized>(
    kernel: &K,
    tiers: &HandleTiers,
    folded: &PolygonSet,
) -> KernelResult<HandleOutputs> {
    let handle_remove = kernel.union(folded, &tiers.remove)?;
    // The step etch must expose every release feature.
    let handle_step_etch = kernel.union(&tiers.step_etch, &handle_remove)?;
    Ok(HandleOutputs {
        handle_remove,
        handle_step_etch,
    })
}
