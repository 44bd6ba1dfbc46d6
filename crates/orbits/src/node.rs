//! Maneuver nodes and their transient gizmo working copies.

use std::fmt;

use maneuver_core::vector::{self, Vector3};

/// DeltaV component indices (radial, normal, prograde).
pub mod axis {
    pub const RADIAL: usize = 0;
    pub const NORMAL: usize = 1;
    pub const PROGRADE: usize = 2;
}

/// Stable identity of a maneuver node across plan rebuilds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// A planned impulsive velocity change.
///
/// `delta_v` is expressed in the basis of the pre-maneuver patch at `ut`:
/// x = radial, y = normal, z = prograde (m/s).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManeuverNode {
    pub id: NodeId,
    pub ut: f64,
    pub delta_v: Vector3,
}

impl ManeuverNode {
    pub fn new(id: NodeId, ut: f64, delta_v: Vector3) -> Self {
        Self { id, ut, delta_v }
    }

    pub fn magnitude(&self) -> f64 {
        vector::norm(&self.delta_v)
    }
}

/// Callback raised when the gizmo's working copy should be pushed to its node.
pub type GizmoHandler = Box<dyn FnMut(NodeId, f64, &Vector3)>;

/// Transient working copy of a node's UT and DeltaV, plus input shaping parameters.
pub struct Gizmo {
    node: NodeId,
    pub ut: f64,
    pub delta_v: Vector3,
    pub sensitivity: f64,
    pub multiplier: f64,
    orbits_added: u32,
    handler: Option<GizmoHandler>,
    updates_raised: u64,
}

impl Gizmo {
    pub fn new(node: &ManeuverNode, sensitivity: f64, multiplier: f64) -> Self {
        Self {
            node: node.id,
            ut: node.ut,
            delta_v: node.delta_v,
            sensitivity,
            multiplier,
            orbits_added: 0,
            handler: None,
            updates_raised: 0,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Copy the node's committed state back into the working copy.
    pub fn sync_from(&mut self, node: &ManeuverNode) {
        self.ut = node.ut;
        self.delta_v = node.delta_v;
    }

    /// `sign(raw) × |raw|^sensitivity × multiplier`.
    pub fn shape(&self, raw: f64) -> f64 {
        if raw == 0.0 {
            return 0.0;
        }
        raw.abs().powf(self.sensitivity) * self.multiplier * raw.signum()
    }

    pub fn orbits_added(&self) -> u32 {
        self.orbits_added
    }

    pub fn set_orbits_added(&mut self, orbits: u32) {
        self.orbits_added = orbits;
    }

    pub fn add_orbit(&mut self) {
        self.orbits_added = self.orbits_added.saturating_add(1);
    }

    pub fn remove_orbit(&mut self) {
        self.orbits_added = self.orbits_added.saturating_sub(1);
    }

    pub fn reset_orbits(&mut self) {
        self.orbits_added = 0;
    }

    /// Replace the update callback (e.g. with an editor-owned handler).
    pub fn set_update_handler(&mut self, handler: GizmoHandler) {
        self.handler = Some(handler);
    }

    pub fn clear_update_handler(&mut self) {
        self.handler = None;
    }

    pub fn has_update_handler(&self) -> bool {
        self.handler.is_some()
    }

    /// Invoke the update callback with the current working copy.
    pub fn raise_update(&mut self) {
        self.updates_raised += 1;
        if let Some(handler) = self.handler.as_mut() {
            handler(self.node, self.ut, &self.delta_v);
        }
    }

    pub fn updates_raised(&self) -> u64 {
        self.updates_raised
    }
}

impl fmt::Debug for Gizmo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gizmo")
            .field("node", &self.node)
            .field("ut", &self.ut)
            .field("delta_v", &self.delta_v)
            .field("sensitivity", &self.sensitivity)
            .field("multiplier", &self.multiplier)
            .field("orbits_added", &self.orbits_added)
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shaping_keeps_sign_and_zero() {
        let node = ManeuverNode::new(NodeId(1), 0.0, vector::ZERO);
        let gizmo = Gizmo::new(&node, 2.0, 0.5);
        assert_eq!(gizmo.shape(0.0), 0.0);
        assert!((gizmo.shape(3.0) - 4.5).abs() < 1e-12);
        assert!((gizmo.shape(-3.0) + 4.5).abs() < 1e-12);
    }

    #[test]
    fn orbits_added_never_negative() {
        let node = ManeuverNode::new(NodeId(1), 0.0, vector::ZERO);
        let mut gizmo = Gizmo::new(&node, 1.0, 1.0);
        gizmo.remove_orbit();
        assert_eq!(gizmo.orbits_added(), 0);
        gizmo.add_orbit();
        gizmo.add_orbit();
        gizmo.remove_orbit();
        assert_eq!(gizmo.orbits_added(), 1);
    }
}
