//! Single-body patched-conic reference model.

use maneuver_core::vector::{self, Vector3};
use tracing::{debug, warn};

use crate::conic::Conic;
use crate::frame::OrbitFrame;
use crate::model::{ModelError, OrbitModel};
use crate::node::{ManeuverNode, NodeId};
use crate::patch::{Body, Patch, Transition};
use crate::plan::{FlightPlan, PatchCursor, PatchId};

/// Propagates a vessel around one body, splitting the trajectory at every maneuver node.
///
/// `plan` holds every node's burn. `owners[k]` is the trajectory through the nodes before `k`; its last
/// patch is the one node `k` burns on. That patch ends FINAL only for the last node; otherwise it is cut
/// at the following node with a MANEUVER transition. Trajectories leaving the SOI end FINAL at the exit
/// since no parent body is modelled.
#[derive(Debug, Clone)]
pub struct PatchedConicModel {
    body: Body,
    initial: Conic,
    start_ut: f64,
    now: f64,
    nodes: Vec<ManeuverNode>,
    next_node_id: u64,
    plan: FlightPlan,
    owners: Vec<FlightPlan>,
}

impl PatchedConicModel {
    pub fn new(body: Body, initial: Conic, start_ut: f64) -> Self {
        let mut model = Self {
            body,
            initial,
            start_ut,
            now: start_ut,
            nodes: Vec::new(),
            next_node_id: 1,
            plan: FlightPlan::new(),
            owners: Vec::new(),
        };
        model.recompute();
        model
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn set_now(&mut self, ut: f64) {
        self.now = ut;
    }

    /// Insert a node and rebuild the plan.
    pub fn add_node(&mut self, ut: f64, delta_v: Vector3) -> Result<NodeId, ModelError> {
        let id = NodeId(self.next_node_id);
        if !ut.is_finite() || delta_v.iter().any(|c| !c.is_finite()) {
            return Err(ModelError::NonFinite(id));
        }
        self.next_node_id += 1;
        self.nodes.push(ManeuverNode::new(id, ut, delta_v));
        self.recompute();
        Ok(id)
    }

    pub fn remove_node(&mut self, id: NodeId) -> Option<ManeuverNode> {
        let index = self.node_index(id)?;
        let removed = self.nodes.remove(index);
        self.recompute();
        Some(removed)
    }

    /// Trajectory up to the burn of the node at `index`.
    pub fn owning_plan(&self, index: usize) -> Option<&FlightPlan> {
        self.owners.get(index)
    }
}

/// Chain the legs into a plan. Each leg ends where the next one starts; the last one ends at `cut`
/// when given, otherwise it is the FINAL patch.
fn build_plan(body: &Body, legs: &[(Conic, f64, Transition)], cut: Option<f64>) -> FlightPlan {
    let mut plan = FlightPlan::new();
    for (index, (conic, start, transition)) in legs.iter().enumerate() {
        let mut patch = Patch::new(*conic, body.clone(), *start);
        patch.start_transition = *transition;
        let end = legs.get(index + 1).map(|(_, next_start, _)| *next_start).or(cut);
        if let Some(end) = end {
            patch.end_transition = Transition::Maneuver;
            patch.end_ut = end;
            patch.soi_exit_ut = patch.soi_exit_ut.filter(|exit| *exit < end);
        }
        plan.push(patch);
    }
    plan
}

impl OrbitModel for PatchedConicModel {
    fn now(&self) -> f64 {
        self.now
    }

    fn nodes(&self) -> &[ManeuverNode] {
        &self.nodes
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut ManeuverNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    fn flight_plan(&self) -> &FlightPlan {
        &self.plan
    }

    fn patch_before(&self, id: NodeId) -> Option<PatchCursor<'_>> {
        let index = self.node_index(id)?;
        self.owning_plan(index)?.last()
    }

    fn patch_after(&self, id: NodeId) -> Option<PatchCursor<'_>> {
        let index = self.node_index(id)?;
        self.plan.cursor(PatchId(index + 1))
    }

    fn recompute(&mut self) {
        self.nodes.sort_by(|a, b| a.ut.total_cmp(&b.ut));

        let mut legs = vec![(self.initial, self.start_ut, Transition::Initial)];
        let mut owners = Vec::with_capacity(self.nodes.len());

        for (index, node) in self.nodes.iter().enumerate() {
            let cut = self.nodes.get(index + 1).map(|later| later.ut);
            owners.push(build_plan(&self.body, &legs, cut));
            let Some(&(conic, _, _)) = legs.last() else { break };
            let (position, velocity) = conic.state_at(node.ut);
            let Some(frame) = OrbitFrame::from_state(&position, &velocity) else {
                warn!(node = %node.id, ut = node.ut, "degenerate state at node; later patches dropped");
                break;
            };
            let burned = vector::add(&velocity, &frame.to_inertial(&node.delta_v));
            let Some(next) = Conic::from_state_vectors(&position, &burned, conic.mu, node.ut) else {
                warn!(node = %node.id, ut = node.ut, "burn produced a degenerate conic; later patches dropped");
                break;
            };
            legs.push((next, node.ut, Transition::Maneuver));
        }

        self.plan = build_plan(&self.body, &legs, None);
        self.owners = owners;

        debug!(
            nodes = self.nodes.len(),
            patches = legs.len(),
            "flight plan recomputed"
        );
    }
}
