//! End-to-end resolution: folds, clip, compensation, assembly.

use maskforge_core::{
    Channel, ChipOutline, ClipperKernel, Device, PolygonKernel, PolygonSet, ShapeLibrary,
    PRIORITY_ORDER,
};

use crate::assemble::{AssembledMask, Assembler, AssemblyInput, MaskSink};
use crate::clip::clip_channels;
use crate::compensation::compensate;
use crate::config::ResolveConfig;
use crate::device_fold::{fold_device, resolve_device, DeviceOutputs, DeviceTiers};
use crate::diagnostics::Diagnostic;
use crate::error::{ResolveError, ResolveResult};
use crate::handle_fold::{fold_handle, resolve_handle, HandleOutputs, HandleTiers};
use crate::layers::ResolvedLayers;

/// A validated configuration bound to a polygon kernel.
pub struct Pipeline<K: PolygonKernel> {
    kernel: K,
    config: ResolveConfig,
}

impl Pipeline<ClipperKernel> {
    /// Clipper-backed pipeline with the configured join style.
    pub fn from_config(config: ResolveConfig) -> ResolveResult<Self> {
        let kernel = ClipperKernel::new().with_join(config.join);
        Self::new(kernel, config)
    }
}

impl<K: PolygonKernel> Pipeline<K> {
    /// Rejects bad isolation tables and compensation values up front, so no
    /// fold ever starts with an invalid configuration.
    pub fn new(kernel: K, config: ResolveConfig) -> ResolveResult<Self> {
        config.validate()?;
        Ok(Self { kernel, config })
    }

    pub fn config(&self) -> &ResolveConfig {
        &self.config
    }

    /// Resolve every channel up to (not including) CD compensation.
    pub fn resolve(&self, device: &Device, outline: &ChipOutline) -> ResolveResult<ResolvedLayers> {
        Ok(self.resolve_sides(device, outline)?.0)
    }

    /// Run the whole flow and return the validated mask.
    pub fn run(&self, device: &Device, outline: &ChipOutline) -> ResolveResult<AssembledMask> {
        log::info!(
            "Resolving '{}' ({} layers) on a {} x {} chip",
            device.name,
            device.layer_count(),
            outline.width,
            outline.height
        );

        let (resolved, base) = self.resolve_sides(device, outline)?;

        let (compensated, mut diagnostics) = compensate(
            &self.kernel,
            &resolved,
            self.config.device_cd_compensation,
            self.config.handle_cd_compensation,
        )?;
        log::info!(
            "CD compensation applied (device {:+}, handle {:+})",
            self.config.device_cd_compensation,
            self.config.handle_cd_compensation
        );

        if !self.config.merge_device_patterns {
            let d = Diagnostic::unmerged_release();
            d.log();
            diagnostics.push(d);
        }

        Assembler::new(&self.kernel, self.config.sliver_tolerance).assemble(AssemblyInput {
            name: device.name.clone(),
            outline: *outline,
            base,
            resolved,
            compensated,
            merged: self.config.merge_device_patterns,
            diagnostics,
        })
    }

    /// Build the device through a shape library, then run.
    pub fn run_library<L: ShapeLibrary>(
        &self,
        library: &L,
        label: &str,
        outline: &ChipOutline,
    ) -> ResolveResult<AssembledMask> {
        let device = library
            .build_device(label)
            .map_err(|e| ResolveError::ShapeLibrary(Box::new(e)))?;
        self.run(&device, outline)
    }

    /// Run and hand the result to `sink`. The sink is not called unless every
    /// pass and check succeeded.
    pub fn emit<S: MaskSink>(
        &self,
        device: &Device,
        outline: &ChipOutline,
        sink: &mut S,
    ) -> ResolveResult<AssembledMask> {
        let mask = self.run(device, outline)?;
        sink.accept(&mask)
            .map_err(|e| ResolveError::Sink(Box::new(e)))?;
        log::info!("Mask '{}' written", mask.name);
        Ok(mask)
    }

    fn resolve_sides(
        &self,
        device: &Device,
        outline: &ChipOutline,
    ) -> ResolveResult<(ResolvedLayers, PolygonSet)> {
        if !outline.is_valid() {
            return Err(ResolveError::InvalidOutline {
                width: outline.width,
                height: outline.height,
            });
        }

        let (device_side, handle_side) = rayon::join(
            || self.device_side(device, outline),
            || self.handle_side(device),
        );
        let (base, dev) = device_side?;
        let handle = handle_side?;
        log::info!(
            "Priority folds done: DEVICE {:.3} um^2, HANDLE_REMOVE {:.3} um^2",
            dev.device.area(),
            handle.handle_remove.area()
        );

        let clipped = clip_channels(
            &self.kernel,
            device,
            outline,
            &self.config.positive_channels,
            &self.config.negative_channels,
        )?;
        log::info!("Clipped {} single-layer channels", clipped.len());

        let resolved = clipped
            .into_iter()
            .collect::<ResolvedLayers>()
            .with_channel(Channel::Device, dev.device)
            .with_channel(Channel::DeviceRemove, dev.device_remove)
            .with_channel(Channel::HandleRemove, handle.handle_remove)
            .with_channel(Channel::HandleStepEtch, handle.handle_step_etch);

        Ok((resolved, base))
    }

    fn device_side(
        &self,
        device: &Device,
        outline: &ChipOutline,
    ) -> ResolveResult<(PolygonSet, DeviceOutputs)> {
        let tiers = DeviceTiers::extract(&self.kernel, device)?;
        let folded = fold_device(
            &self.kernel,
            &tiers,
            &self.config.device_isolation,
            &PRIORITY_ORDER,
        )?;
        let outputs = resolve_device(
            &self.kernel,
            &tiers,
            folded,
            outline,
            self.config.merge_device_patterns,
        )?;
        Ok((tiers.base, outputs))
    }

    fn handle_side(&self, device: &Device) -> ResolveResult<HandleOutputs> {
        let tiers = HandleTiers::extract(&self.kernel, device)?;
        let folded = fold_handle(
            &self.kernel,
            &tiers,
            &self.config.handle_isolation,
            &PRIORITY_ORDER,
        )?;
        Ok(resolve_handle(&self.kernel, &tiers, &folded)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maskforge_core::{JoinStyle, LayerKey, Priority, Variant};

    #[test]
    fn test_invalid_outline_rejected() {
        let pipeline = Pipeline::new(ClipperKernel::new(), ResolveConfig::default()).unwrap();
        let err = pipeline
            .run(&Device::new("empty"), &ChipOutline::new(0.0, 10.0))
            .unwrap_err();
        assert!(matches!(err, ResolveError::InvalidOutline { .. }));
    }

    #[test]
    fn test_empty_device_gives_full_release() {
        let pipeline = Pipeline::new(
            ClipperKernel::new(),
            ResolveConfig::default().with_compensation(0.0, 0.0),
        )
        .unwrap();
        let mask = pipeline
            .run(&Device::new("empty"), &ChipOutline::square(100.0))
            .unwrap();
        assert!(mask.layer(Channel::Device).unwrap().is_empty());
        assert!((mask.layer(Channel::DeviceRemove).unwrap().area() - 10_000.0).abs() < 1e-6);
        assert!(mask.diagnostics.is_empty());
    }

    #[test]
    fn test_from_config_keeps_join() {
        let pipeline =
            Pipeline::from_config(ResolveConfig::default().with_join(JoinStyle::Round)).unwrap();
        assert_eq!(pipeline.config().join, JoinStyle::Round);
    }

    #[test]
    fn test_resolve_stops_before_compensation() {
        let device = Device::new("one").with_layer(
            LayerKey::device_tier(Priority::HIGHEST, Variant::Strict),
            PolygonSet::rect(0.0, 0.0, 10.0, 10.0),
        );
        let pipeline = Pipeline::from_config(ResolveConfig::default()).unwrap();
        let resolved = pipeline.resolve(&device, &ChipOutline::square(100.0)).unwrap();
        assert!((resolved.get(Channel::Device).unwrap().area() - 100.0).abs() < 1e-6);

        let mask = pipeline.run(&device, &ChipOutline::square(100.0)).unwrap();
        assert!((mask.layer(Channel::Device).unwrap().area() - 10.6 * 10.6).abs() < 1e-6);
    }
}
