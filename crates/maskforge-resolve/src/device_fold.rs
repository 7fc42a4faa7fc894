//! Device-side priority fold.
//!
//! Tiers are folded from lowest precedence to highest. Each tier adds its
//! strict shapes, then carves its clearance halo out of everything
//! accumulated so far, then re-admits its NOISO shapes. A tier processed later
//! (lower number) can therefore carve into every tier processed before it,
//! including earlier NOISO shapes, but never the other way round.

use maskforge_core::{
    Channel, ChipOutline, Device, KernelResult, PolygonKernel, PolygonSet, Priority, Variant,
    LayerKey, PRIORITY_COUNT,
};

use crate::isolation::IsolationTable;

/// Raw device-side inputs, extracted once from the device.
#[derive(Debug, Clone)]
pub struct DeviceTiers {
    /// Strict shapes, indexed by priority.
    pub strict: [PolygonSet; PRIORITY_COUNT],
    /// Clearance-exempt shapes, indexed by priority.
    pub noiso: [PolygonSet; PRIORITY_COUNT],
    /// The literal DEVICE channel, always retained.
    pub base: PolygonSet,
    /// The literal DEVICE_REMOVE channel.
    pub remove: PolygonSet,
}

impl DeviceTiers {
    pub fn extract<K: PolygonKernel + ?Sized>(kernel: &K, device: &Device) -> KernelResult<Self> {
        let mut tiers = Self::empty();
        for p in Priority::all() {
            tiers.strict[p.index()] =
                kernel.extract(device, LayerKey::device_tier(p, Variant::Strict))?;
            tiers.noiso[p.index()] =
                kernel.extract(device, LayerKey::device_tier(p, Variant::NoIso))?;
        }
        tiers.base = kernel.extract(device, Channel::Device.into())?;
        tiers.remove = kernel.extract(device, Channel::DeviceRemove.into())?;
        Ok(tiers)
    }

    /// Empty inputs, filled in with the `with_*` builders.
    pub fn empty() -> Self {
        Self {
            strict: Default::default(),
            noiso: Default::default(),
            base: PolygonSet::empty(),
            remove: PolygonSet::empty(),
        }
    }

    pub fn with_strict(mut self, priority: Priority, set: PolygonSet) -> Self {
        self.strict[priority.index()] = set;
        self
    }

    pub fn with_noiso(mut self, priority: Priority, set: PolygonSet) -> Self {
        self.noiso[priority.index()] = set;
        self
    }

    pub fn with_base(mut self, set: PolygonSet) -> Self {
        self.base = set;
        self
    }

    pub fn with_remove(mut self, set: PolygonSet) -> Self {
        self.remove = set;
        self
    }
}

/// The clearance ring of width `distance` around `shapes`.
pub fn halo<K: PolygonKernel + ?Sized>(
    kernel: &K,
    shapes: &PolygonSet,
    distance: f64,
) -> KernelResult<PolygonSet> {
    if shapes.is_empty() || distance == 0.0 {
        return Ok(PolygonSet::empty());
    }
    let grown = kernel.offset(shapes, distance)?;
    kernel.difference(&grown, shapes)
}

/// Fold all device tiers in `order` into the solid device material.
///
/// `order` is normally [`PRIORITY_ORDER`](maskforge_core::PRIORITY_ORDER).
pub fn fold_device<K: PolygonKernel + ?Sized>(
    kernel: &K,
    tiers: &DeviceTiers,
    isolation: &IsolationTable,
    order: &[Priority],
) -> KernelResult<PolygonSet> {
    let mut dev = PolygonSet::empty();

    for &priority in order {
        let strict = &tiers.strict[priority.index()];
        let noiso = &tiers.noiso[priority.index()];
        if strict.is_empty() && noiso.is_empty() {
            continue;
        }

        dev = kernel.union(&dev, strict)?;
        let ring = halo(kernel, strict, isolation.get(priority))?;
        dev = kernel.difference(&dev, &ring)?;
        dev = kernel.union(&dev, noiso)?;

        log::debug!(
            "DEVICE_P{}: {} strict, {} noiso regions, halo {:.3} um^2, accumulated {:.3} um^2",
            priority,
            strict.len(),
            noiso.len(),
            ring.area(),
            dev.area()
        );
    }

    kernel.union(&dev, &tiers.base)
}

/// Final DEVICE and DEVICE_REMOVE before CD compensation.
#[derive(Debug, Clone)]
pub struct DeviceOutputs {
    /// Solid material from the fold, before cropping.
    pub folded: PolygonSet,
    pub device: PolygonSet,
    pub device_remove: PolygonSet,
}

/// Turn the folded material into the DEVICE / DEVICE_REMOVE pair.
///
/// Merged: the release pattern is everything on the chip not occupied by
/// folded material, plus the explicit removal shapes. Unmerged skips the
/// chip-wide difference and passes DEVICE_REMOVE through raw, so the release
/// pattern ignores the isolation carve.
pub fn resolve_device<K: PolygonKernel + ?Sized>(
    kernel: &K,
    tiers: &DeviceTiers,
    folded: PolygonSet,
    outline: &ChipOutline,
    merge: bool,
) -> KernelResult<DeviceOutputs> {
    if !merge {
        return Ok(DeviceOutputs {
            device: folded.clone(),
            device_remove: tiers.remove.clone(),
            folded,
        });
    }

    let chip = PolygonSet::from_bbox(&outline.bbox());
    let release = kernel.difference(&chip, &folded)?;
    let device_remove = kernel.union(&release, &tiers.remove)?;
    let device = kernel.intersect(&chip, &folded)?;
    Ok(DeviceOutputs {
        folded,
        device,
        device_remove,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use maskforge_core::{ClipperKernel, PRIORITY_ORDER};

    fn p(v: u8) -> Priority {
        Priority::new(v).unwrap()
    }

    #[test]
    fn test_two_tier_clearance_gap() {
        let k = ClipperKernel::new();
        let tiers = DeviceTiers::empty()
            .with_strict(p(0), PolygonSet::rect(0.0, 0.0, 10.0, 10.0))
            .with_strict(p(1), PolygonSet::rect(5.0, 0.0, 15.0, 10.0));
        let iso = IsolationTable::uniform(0.0).with(p(0), 2.0).with(p(1), 1.0);

        let dev = fold_device(&k, &tiers, &iso, &PRIORITY_ORDER).unwrap();

        let expected = k
            .union(
                &PolygonSet::rect(0.0, 0.0, 10.0, 10.0),
                &PolygonSet::rect(12.0, 0.0, 15.0, 10.0),
            )
            .unwrap();
        assert!(k.equivalent(&dev, &expected, 1e-6).unwrap());
        assert!((dev.area() - 130.0).abs() < 1e-6);
    }

    #[test]
    fn test_extract_fills_every_priority_slot() {
        let k = ClipperKernel::new();
        let device = Device::new("slots")
            .with_layer(
                LayerKey::device_tier(Priority::LOWEST, Variant::NoIso),
                PolygonSet::rect(0.0, 0.0, 1.0, 1.0),
            )
            .with_layer(
                LayerKey::device_tier(Priority::HIGHEST, Variant::Strict),
                PolygonSet::rect(5.0, 0.0, 6.0, 1.0),
            );
        let tiers = DeviceTiers::extract(&k, &device).unwrap();
        assert_eq!(tiers.strict.len(), PRIORITY_COUNT);
        assert!(!tiers.noiso[Priority::LOWEST.index()].is_empty());
        assert!(!tiers.strict[Priority::HIGHEST.index()].is_empty());
        assert!(tiers.strict[Priority::LOWEST.index()].is_empty());

        let dev = fold_device(&k, &tiers, &IsolationTable::uniform(1.0), &PRIORITY_ORDER).unwrap();
        assert!((dev.area() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_tiers_give_base() {
        let k = ClipperKernel::new();
        let base = PolygonSet::rect(-1.0, -1.0, 1.0, 1.0);
        let tiers = DeviceTiers::empty().with_base(base.clone());
        let dev = fold_device(&k, &tiers, &IsolationTable::uniform(5.0), &PRIORITY_ORDER).unwrap();
        assert!(k.equivalent(&dev, &base, 1e-9).unwrap());
    }

    #[test]
    fn test_halo_is_ring() {
        let k = ClipperKernel::new();
        let ring = halo(&k, &PolygonSet::rect(0.0, 0.0, 10.0, 10.0), 2.0).unwrap();
        assert!((ring.area() - (196.0 - 100.0)).abs() < 1e-6);
        assert!(halo(&k, &PolygonSet::rect(0.0, 0.0, 10.0, 10.0), 0.0)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_unmerged_passes_remove_through() {
        let k = ClipperKernel::new();
        let remove = PolygonSet::rect(20.0, 20.0, 21.0, 21.0);
        let tiers = DeviceTiers::empty().with_remove(remove.clone());
        let folded = PolygonSet::rect(0.0, 0.0, 10.0, 10.0);
        let out = resolve_device(&k, &tiers, folded, &ChipOutline::square(100.0), false).unwrap();
        assert!(k.equivalent(&out.device_remove, &remove, 1e-9).unwrap());
        assert!((out.device.area() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_merged_release_is_chip_minus_device() {
        let k = ClipperKernel::new();
        let tiers = DeviceTiers::empty().with_remove(PolygonSet::rect(2.0, 2.0, 4.0, 4.0));
        let folded = PolygonSet::rect(0.0, 0.0, 10.0, 10.0);
        let out = resolve_device(&k, &tiers, folded, &ChipOutline::square(100.0), true).unwrap();
        // 100x100 chip minus the 10x10 device, plus the 2x2 removal inside it.
        assert!((out.device_remove.area() - (10_000.0 - 100.0 + 4.0)).abs() < 1e-6);
        assert!((out.device.area() - 100.0).abs() < 1e-6);
    }
}
