use maskforge_core::{Channel, KernelResult, PolygonKernel};

use crate::diagnostics::Diagnostic;
use crate::layers::ResolvedLayers;

/// Signed offsets of the CD compensation pass. DEVICE and DEVICE_REMOVE move
/// in opposite directions so the pair stays complementary.
pub fn compensation_offsets(device: f64, handle: f64) -> [(Channel, f64); 3] {
    [
        (Channel::Device, device),
        (Channel::DeviceRemove, -device),
        (Channel::HandleRemove, -handle),
    ]
}

/// Apply the CD compensation offsets. Channels absent from `layers` are
/// skipped; a channel eroded to nothing yields a degenerate-result warning.
pub fn compensate<K: PolygonKernel + ?Sized>(
    kernel: &K,
    layers: &ResolvedLayers,
    device: f64,
    handle: f64,
) -> KernelResult<(ResolvedLayers, Vec<Diagnostic>)> {
    let mut out = layers.clone();
    let mut diagnostics = Vec::new();

    for (channel, distance) in compensation_offsets(device, handle) {
        let Some(before) = layers.get(channel) else {
            continue;
        };
        let after = kernel.offset(before, distance)?;
        if !before.is_empty() && after.is_empty() {
            let d = Diagnostic::degenerate(channel, before, distance);
            d.log();
            diagnostics.push(d);
        }
        log::debug!(
            "CD compensation {} by {:+}: {:.3} -> {:.3} um^2",
            channel,
            distance,
            before.area(),
            after.area()
        );
        out = out.with_channel(channel, after);
    }

    Ok((out, diagnostics))
}
