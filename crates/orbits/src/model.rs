//! The seam between editing logic and whatever propagates the trajectory.

use maneuver_core::vector::Vector3;
use thiserror::Error;

use crate::node::{ManeuverNode, NodeId};
use crate::plan::{FlightPlan, PatchCursor};

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("unknown maneuver {0}")]
    UnknownNode(NodeId),
    #[error("non-finite time or delta-v for {0}")]
    NonFinite(NodeId),
}

/// Patch geometry and node storage consumed by the solvers and the editor.
///
/// Implementations rebuild their patches wholesale in [`OrbitModel::recompute`]; cursors handed out
/// before a recompute must not be held across it (the borrow checker enforces this).
pub trait OrbitModel {
    /// Current universal time (s).
    fn now(&self) -> f64;

    /// Nodes in UT order.
    fn nodes(&self) -> &[ManeuverNode];

    fn node_mut(&mut self, id: NodeId) -> Option<&mut ManeuverNode>;

    /// Full trajectory including every node.
    fn flight_plan(&self) -> &FlightPlan;

    /// Patch the node burns on (its DeltaV is expressed in this patch's frame).
    fn patch_before(&self, id: NodeId) -> Option<PatchCursor<'_>>;

    /// Patch produced by the node's burn.
    fn patch_after(&self, id: NodeId) -> Option<PatchCursor<'_>>;

    /// Rebuild every patch from the current nodes.
    fn recompute(&mut self);

    fn node(&self, id: NodeId) -> Option<&ManeuverNode> {
        self.nodes().iter().find(|n| n.id == id)
    }

    fn node_index(&self, id: NodeId) -> Option<usize> {
        self.nodes().iter().position(|n| n.id == id)
    }

    /// Write a node's UT/DeltaV and recompute the plan.
    fn commit(&mut self, id: NodeId, ut: f64, delta_v: Vector3) -> Result<(), ModelError> {
        if !ut.is_finite() || delta_v.iter().any(|c| !c.is_finite()) {
            return Err(ModelError::NonFinite(id));
        }
        let node = self.node_mut(id).ok_or(ModelError::UnknownNode(id))?;
        node.ut = ut;
        node.delta_v = delta_v;
        self.recompute();
        Ok(())
    }
}
