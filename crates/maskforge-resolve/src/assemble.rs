use serde::Serialize;

use maskforge_core::{Channel, ChipOutline, PolygonKernel, PolygonSet};

use crate::diagnostics::Diagnostic;
use crate::error::{ResolveError, ResolveResult};
use crate::layers::ResolvedLayers;

/// One final mask channel with its interchange layer pair.
#[derive(Debug, Clone, Serialize)]
pub struct MaskLayer {
    pub channel: Channel,
    pub gds_layer: u16,
    pub gds_datatype: u16,
    pub polygons: PolygonSet,
}

/// The validated, flattened output of one build.
#[derive(Debug, Clone, Serialize)]
pub struct AssembledMask {
    pub name: String,
    pub outline: ChipOutline,
    pub layers: Vec<MaskLayer>,
    pub diagnostics: Vec<Diagnostic>,
}

impl AssembledMask {
    pub fn layer(&self, channel: Channel) -> Option<&PolygonSet> {
        self.layers
            .iter()
            .find(|l| l.channel == channel)
            .map(|l| &l.polygons)
    }

    pub fn channels(&self) -> impl Iterator<Item = Channel> + '_ {
        self.layers.iter().map(|l| l.channel)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == crate::diagnostics::Severity::Warning)
    }
}

/// Writer for assembled masks (GDS, reticle placement, ...). Only ever sees
/// a fully validated mask.
pub trait MaskSink {
    type Error: std::error::Error + Send + Sync + 'static;

    fn accept(&mut self, mask: &AssembledMask) -> Result<(), Self::Error>;
}

/// Everything the assembler checks and flattens.
#[derive(Debug, Clone)]
pub struct AssemblyInput {
    pub name: String,
    pub outline: ChipOutline,
    /// The literal DEVICE channel as extracted from the device.
    pub base: PolygonSet,
    /// Channels before CD compensation.
    pub resolved: ResolvedLayers,
    /// Channels after CD compensation.
    pub compensated: ResolvedLayers,
    pub merged: bool,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct Assembler<'k, K: PolygonKernel + ?Sized> {
    kernel: &'k K,
    sliver_tolerance: f64,
}

impl<'k, K: PolygonKernel + ?Sized> Assembler<'k, K> {
    pub fn new(kernel: &'k K, sliver_tolerance: f64) -> Self {
        Self {
            kernel,
            sliver_tolerance,
        }
    }

    pub fn assemble(&self, input: AssemblyInput) -> ResolveResult<AssembledMask> {
        self.check_base(&input)?;

        // Compensation may have grown HANDLE_REMOVE past the step etch.
        let handle_remove = input.compensated.get_or_empty(Channel::HandleRemove);
        let step_etch = self.kernel.union(
            &input.compensated.get_or_empty(Channel::HandleStepEtch),
            &handle_remove,
        )?;
        let layers = input
            .compensated
            .with_channel(Channel::HandleStepEtch, step_etch);

        self.check_contains(&layers, Channel::HandleStepEtch, Channel::HandleRemove)?;

        let layers: Vec<MaskLayer> = layers
            .into_inner()
            .into_iter()
            .filter(|(channel, _)| *channel != Channel::Dummy)
            .map(|(channel, polygons)| {
                let (gds_layer, gds_datatype) = channel.gds_pair();
                MaskLayer {
                    channel,
                    gds_layer,
                    gds_datatype,
                    polygons,
                }
            })
            .collect();

        log::info!(
            "Assembled '{}': {} channels, {} diagnostics",
            input.name,
            layers.len(),
            input.diagnostics.len()
        );

        Ok(AssembledMask {
            name: input.name,
            outline: input.outline,
            layers,
            diagnostics: input.diagnostics,
        })
    }

    /// The base DEVICE pattern (within the chip, when merged) must survive
    /// every isolation carve. Checked before compensation, which is free to
    /// shrink device material.
    fn check_base(&self, input: &AssemblyInput) -> ResolveResult<()> {
        if input.base.is_empty() {
            return Ok(());
        }
        let expected = if input.merged {
            self.kernel.crop(&input.base, &input.outline.bbox())?
        } else {
            input.base.clone()
        };
        let device = input.resolved.get_or_empty(Channel::Device);
        let missing = self
            .kernel
            .uncovered(&device, &expected, self.sliver_tolerance)?;
        if !missing.is_empty() {
            return Err(ResolveError::BaseExcluded {
                area: missing.area(),
            });
        }
        Ok(())
    }

    fn check_contains(
        &self,
        layers: &ResolvedLayers,
        outer: Channel,
        inner: Channel,
    ) -> ResolveResult<()> {
        let residue = self.kernel.uncovered(
            &layers.get_or_empty(outer),
            &layers.get_or_empty(inner),
            self.sliver_tolerance,
        )?;
        if !residue.is_empty() {
            return Err(ResolveError::ContainmentViolation {
                outer,
                inner,
                area: residue.area(),
            });
        }
        Ok(())
    }
}
