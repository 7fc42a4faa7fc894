use rayon::prelude::*;

use maskforge_core::{Channel, ChipOutline, Device, KernelResult, PolygonKernel, PolygonSet};

/// How a single-layer channel relates to the chip footprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipMode {
    /// Keep only what lies inside the chip.
    Positive,
    /// Keep the chip area not covered by the raw shapes.
    Negative,
}

pub fn clip_channel<K: PolygonKernel + ?Sized>(
    kernel: &K,
    raw: &PolygonSet,
    outline: &ChipOutline,
    mode: ClipMode,
) -> KernelResult<PolygonSet> {
    let chip = PolygonSet::from_bbox(&outline.bbox());
    match mode {
        ClipMode::Positive => kernel.intersect(&chip, raw),
        ClipMode::Negative => kernel.difference(&chip, raw),
    }
}

/// Clip every listed channel against the outline. Channels are independent
/// and processed in parallel; output order follows the input lists.
pub fn clip_channels<K: PolygonKernel + ?Sized>(
    kernel: &K,
    device: &Device,
    outline: &ChipOutline,
    positive: &[Channel],
    negative: &[Channel],
) -> KernelResult<Vec<(Channel, PolygonSet)>> {
    let jobs: Vec<(Channel, ClipMode)> = positive
        .iter()
        .map(|c| (*c, ClipMode::Positive))
        .chain(negative.iter().map(|c| (*c, ClipMode::Negative)))
        .collect();

    jobs.par_iter()
        .map(|&(channel, mode)| {
            let raw = kernel.extract(device, channel.into())?;
            let clipped = clip_channel(kernel, &raw, outline, mode)?;
            log::debug!(
                "Clipped {} ({:?}): {:.3} -> {:.3} um^2",
                channel,
                mode,
                raw.area(),
                clipped.area()
            );
            Ok((channel, clipped))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use maskforge_core::ClipperKernel;

    #[test]
    fn test_positive_clip_drops_outside() {
        let k = ClipperKernel::new();
        let raw = PolygonSet::rect(40.0, -5.0, 60.0, 5.0);
        let out = clip_channel(&k, &raw, &ChipOutline::square(100.0), ClipMode::Positive).unwrap();
        assert!((out.area() - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_negative_clip_inverts_within_chip() {
        let k = ClipperKernel::new();
        let raw = PolygonSet::rect(-5.0, -5.0, 5.0, 5.0);
        let out = clip_channel(&k, &raw, &ChipOutline::square(100.0), ClipMode::Negative).unwrap();
        assert!((out.area() - 9_900.0).abs() < 1e-6);
    }

    #[test]
    fn test_positive_clip_is_idempotent() {
        let k = ClipperKernel::new();
        let outline = ChipOutline::square(20.0);
        let raw = PolygonSet::rect(-30.0, 0.0, 5.0, 2.0);
        let once = clip_channel(&k, &raw, &outline, ClipMode::Positive).unwrap();
        let twice = clip_channel(&k, &once, &outline, ClipMode::Positive).unwrap();
        assert!(k.equivalent(&once, &twice, 1e-9).unwrap());
    }

    #[test]
    fn test_clip_channels_keeps_order() {
        let k = ClipperKernel::new();
        let device = Device::new("clip")
            .with_layer(Channel::ViasEtch, PolygonSet::rect(0.0, 0.0, 1.0, 1.0))
            .with_layer(Channel::Tip, PolygonSet::rect(-1.0, -1.0, 1.0, 1.0));
        let out = clip_channels(
            &k,
            &device,
            &ChipOutline::square(10.0),
            &[Channel::ViasEtch, Channel::Tip],
            &[],
        )
        .unwrap();
        let channels: Vec<Channel> = out.iter().map(|(c, _)| *c).collect();
        assert_eq!(channels, vec![Channel::ViasEtch, Channel::Tip]);
        assert!((out[1].1.area() - 4.0).abs() < 1e-6);
    }
}
