//! Turns scalar handle input into DeltaV updates along orbit-relative axes.

use maneuver_config::Settings;
use maneuver_core::vector::{self, Vector3};
use maneuver_orbits::{Gizmo, ModelError, NodeId, OrbitModel};
use tracing::{debug, warn};

use crate::frames::{ControlAxis, VectorFrameResolver};

/// Upper bound on slices per input; larger inputs get wider slices.
pub const MAX_SLICES: usize = 1_000;

/// Result of one accumulated input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Applied {
    /// Node DeltaV after the input.
    pub delta_v: Vector3,
    /// Number of slices the input was split into.
    pub slices: usize,
}

/// Applies input in slices no larger than `threshold`, re-resolving frames between slices so each
/// slice sees the post-maneuver patch produced by the previous one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeltaVAccumulator {
    threshold: f64,
}

impl DeltaVAccumulator {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.threshold())
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// `ceil(|amount| / threshold)`, at least one and at most [`MAX_SLICES`].
    pub fn slice_count(&self, amount: f64) -> usize {
        let magnitude = amount.abs();
        if magnitude > self.threshold && self.threshold > 0.0 {
            (magnitude / self.threshold).ceil().min(MAX_SLICES as f64) as usize
        } else {
            1
        }
    }

    /// Drag on a gizmo handle: shaped by the gizmo, applied to its working copy, callback raised.
    pub fn drag<M: OrbitModel + ?Sized>(
        &self,
        model: &mut M,
        gizmo: &mut Gizmo,
        axis: ControlAxis,
        raw: f64,
    ) -> Result<Applied, ModelError> {
        let shaped = gizmo.shape(raw);
        let node = gizmo.node();
        self.apply(model, node, Some(gizmo), axis, shaped, true)
    }

    /// Add `amount` (m/s, unshaped) along `axis`.
    ///
    /// With a gizmo the working copy is edited and every slice is committed to the model; the gizmo's
    /// update callback is raised per slice when `raise_callback` is set. Without a gizmo the node itself
    /// is edited.
    pub fn apply<M: OrbitModel + ?Sized>(
        &self,
        model: &mut M,
        node: NodeId,
        mut gizmo: Option<&mut Gizmo>,
        axis: ControlAxis,
        amount: f64,
        raise_callback: bool,
    ) -> Result<Applied, ModelError> {
        if !amount.is_finite() {
            warn!(%node, amount, "non-finite delta-v input dropped");
            let delta_v = model.node(node).ok_or(ModelError::UnknownNode(node))?.delta_v;
            return Ok(Applied { delta_v, slices: 0 });
        }
        let slices = self.slice_count(amount);
        let slice = amount / slices as f64;

        for _ in 0..slices {
            let current = *model.node(node).ok_or(ModelError::UnknownNode(node))?;
            let ut = gizmo.as_deref().map_or(current.ut, |g| g.ut);
            let Some(frames) = VectorFrameResolver::at_node(&*model, node, ut) else {
                warn!(%node, ut, "no frames at node; input dropped");
                break;
            };
            let step = vector::scale(&frames.direction(axis), slice);

            match gizmo.as_deref_mut() {
                Some(g) => {
                    g.delta_v = vector::add(&g.delta_v, &step);
                    model.commit(node, g.ut, g.delta_v)?;
                    if raise_callback {
                        g.raise_update();
                    }
                }
                None => model.commit(node, current.ut, vector::add(&current.delta_v, &step))?,
            }
        }

        let delta_v = model.node(node).ok_or(ModelError::UnknownNode(node))?.delta_v;
        debug!(%node, axis = axis.key(), amount, slices, "delta-v input applied");
        Ok(Applied { delta_v, slices })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_round_up_and_stay_bounded() {
        let accumulator = DeltaVAccumulator::new(1.0);
        assert_eq!(accumulator.slice_count(0.5), 1);
        assert_eq!(accumulator.slice_count(-2.5), 3);
        assert_eq!(accumulator.slice_count(1e12), MAX_SLICES);
        assert_eq!(accumulator.slice_count(f64::INFINITY), MAX_SLICES);
        assert_eq!(DeltaVAccumulator::new(0.0).slice_count(50.0), 1);
    }
}
