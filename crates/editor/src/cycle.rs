//! Exclusive-access state machine over maneuver nodes and their panels.

use std::collections::BTreeMap;

use maneuver_config::{DebounceConfig, GizmoDefaults, Settings};
use maneuver_orbits::{Gizmo, ManeuverNode, NodeId, OrbitModel};
use thiserror::Error;
use tracing::{debug, info};

use crate::panels::{InputPanel, ManualInputMemory, PanelIds, SnapPanel};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CycleError {
    #[error("the flight plan has no maneuver nodes")]
    NoNodes,
    #[error("no maneuver node is active")]
    NotActive,
    #[error("node index {index} out of range for {len} nodes")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("cycling needs at least two nodes, found {0}")]
    TooFewNodes(usize),
}

/// Observable controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Inactive,
    Active(usize),
}

/// Result of the keyboard toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Attached(NodeId),
    Detached(NodeId),
}

/// What the controller spawns on attach.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelOptions {
    pub spawn_panels: bool,
    pub remember_manual_input: bool,
    pub gizmo: GizmoDefaults,
    pub debounce: DebounceConfig,
}

impl From<&Settings> for PanelOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            spawn_panels: settings.replace_gizmo_buttons,
            remember_manual_input: settings.remember_manual_input,
            gizmo: settings.gizmo,
            debounce: settings.debounce,
        }
    }
}

/// The active node with its gizmo and visible panels.
#[derive(Debug)]
pub struct Attachment {
    pub node: NodeId,
    pub gizmo: Gizmo,
    pub snap: Option<SnapPanel>,
    pub input: Option<InputPanel>,
}

/// Locked panels kept alive after their node was detached.
#[derive(Debug, Default)]
pub struct PooledPanels {
    pub snap: Option<SnapPanel>,
    pub input: Option<InputPanel>,
}

impl PooledPanels {
    pub fn is_empty(&self) -> bool {
        self.snap.is_none() && self.input.is_none()
    }
}

#[derive(Debug)]
pub struct NodeCycleController {
    options: PanelOptions,
    active: Option<Attachment>,
    pool: BTreeMap<NodeId, PooledPanels>,
    last_active_index: Option<usize>,
    ids: PanelIds,
    memory: ManualInputMemory,
}

impl NodeCycleController {
    pub fn new(options: PanelOptions) -> Self {
        Self {
            options,
            active: None,
            pool: BTreeMap::new(),
            last_active_index: None,
            ids: PanelIds::default(),
            memory: ManualInputMemory::default(),
        }
    }

    /// Active state with the node's current position in the plan, which moves when snaps and shifts
    /// reorder the nodes.
    pub fn state<M: OrbitModel + ?Sized>(&self, model: &M) -> CycleState {
        match &self.active {
            Some(attachment) => CycleState::Active(self.active_index(model, attachment)),
            None => CycleState::Inactive,
        }
    }

    fn active_index<M: OrbitModel + ?Sized>(&self, model: &M, attachment: &Attachment) -> usize {
        model
            .node_index(attachment.node)
            .or(self.last_active_index)
            .unwrap_or_default()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<&Attachment> {
        self.active.as_ref()
    }

    pub fn active_mut(&mut self) -> Option<&mut Attachment> {
        self.active.as_mut()
    }

    pub fn last_active_index(&self) -> Option<usize> {
        self.last_active_index
    }

    pub fn pooled(&self, node: NodeId) -> Option<&PooledPanels> {
        self.pool.get(&node)
    }

    pub fn pool_mut(&mut self) -> impl Iterator<Item = (&NodeId, &mut PooledPanels)> {
        self.pool.iter_mut()
    }

    pub fn pool_len(&self) -> usize {
        self.pool.len()
    }

    pub fn memory(&self) -> ManualInputMemory {
        self.memory
    }

    /// Make the node at `index` active, detaching any current node first.
    pub fn attach<M: OrbitModel + ?Sized>(&mut self, model: &M, index: usize) -> Result<NodeId, CycleError> {
        let nodes = model.nodes();
        if nodes.is_empty() {
            return Err(CycleError::NoNodes);
        }
        let node = *nodes.get(index).ok_or(CycleError::IndexOutOfRange {
            index,
            len: nodes.len(),
        })?;
        if self.active.is_some() {
            self.detach()?;
        }

        let mut gizmo = Gizmo::new(&node, self.options.gizmo.sensitivity, self.options.gizmo.multiplier);
        let mut pooled = self.pool.remove(&node.id).unwrap_or_default();
        let (snap, input) = if self.options.spawn_panels {
            (
                Some(self.restore_snap(pooled.snap.take(), &node, &gizmo)),
                Some(self.restore_input(pooled.input.take(), &node)),
            )
        } else {
            (None, None)
        };
        if !pooled.is_empty() {
            self.pool.insert(node.id, pooled);
        }
        if let Some(panel) = &snap {
            gizmo.set_orbits_added(panel.orbits_added());
        }

        info!(node = %node.id, index, "maneuver node attached");
        self.active = Some(Attachment {
            node: node.id,
            gizmo,
            snap,
            input,
        });
        self.last_active_index = Some(index);
        Ok(node.id)
    }

    fn restore_snap(&mut self, pooled: Option<SnapPanel>, node: &ManeuverNode, gizmo: &Gizmo) -> SnapPanel {
        match pooled {
            Some(mut panel) => {
                panel.rebind(node);
                panel
            }
            None => SnapPanel::open(
                self.ids.allocate(),
                node,
                Some(gizmo),
                self.options.debounce,
                self.initial_memory().shift_index,
            ),
        }
    }

    fn restore_input(&mut self, pooled: Option<InputPanel>, node: &ManeuverNode) -> InputPanel {
        match pooled {
            Some(mut panel) => {
                panel.rebind(node);
                panel
            }
            None => InputPanel::open(self.ids.allocate(), node, self.initial_memory().increments),
        }
    }

    fn initial_memory(&self) -> ManualInputMemory {
        if self.options.remember_manual_input {
            self.memory
        } else {
            ManualInputMemory::default()
        }
    }

    /// Drop the gizmo; locked panels move to the pool, unlocked ones are destroyed.
    pub fn detach(&mut self) -> Result<NodeId, CycleError> {
        let attachment = self.active.take().ok_or(CycleError::NotActive)?;
        if let Some(snap) = &attachment.snap {
            self.memory.shift_index = snap.shift_index();
        }
        if let Some(input) = &attachment.input {
            self.memory.increments = input.increments();
        }

        let snap = attachment.snap.filter(SnapPanel::is_locked);
        let input = attachment.input.filter(InputPanel::is_locked);
        if snap.is_some() || input.is_some() {
            let entry = self.pool.entry(attachment.node).or_default();
            if snap.is_some() {
                entry.snap = snap;
            }
            if input.is_some() {
                entry.input = input;
            }
        }
        info!(node = %attachment.node, pooled = self.pool.contains_key(&attachment.node), "maneuver node detached");
        Ok(attachment.node)
    }

    pub fn cycle_forward<M: OrbitModel + ?Sized>(&mut self, model: &M) -> Result<NodeId, CycleError> {
        self.cycle(model, 1)
    }

    pub fn cycle_backward<M: OrbitModel + ?Sized>(&mut self, model: &M) -> Result<NodeId, CycleError> {
        self.cycle(model, -1)
    }

    fn cycle<M: OrbitModel + ?Sized>(&mut self, model: &M, step: isize) -> Result<NodeId, CycleError> {
        let attachment = self.active.as_ref().ok_or(CycleError::NotActive)?;
        let len = model.nodes().len();
        if len < 2 {
            return Err(CycleError::TooFewNodes(len));
        }
        let current = self.active_index(model, attachment);
        let next = (current as isize + step).rem_euclid(len as isize) as usize;
        debug!(from = current, to = next, "cycling maneuver nodes");
        self.detach()?;
        self.attach(model, next)
    }

    /// Keyboard toggle: detach when active; otherwise attach the camera's node, else the last active
    /// index if it still exists, else the first node.
    pub fn toggle<M: OrbitModel + ?Sized>(
        &mut self,
        model: &M,
        camera_target: Option<NodeId>,
    ) -> Result<Toggle, CycleError> {
        if self.active.is_some() {
            return self.detach().map(Toggle::Detached);
        }
        let len = model.nodes().len();
        let index = camera_target
            .and_then(|id| model.node_index(id))
            .or(self.last_active_index.filter(|i| *i < len))
            .unwrap_or(0);
        self.attach(model, index).map(Toggle::Attached)
    }

    /// Forget pooled panels of nodes that left the plan, detaching the active node if it is one of them.
    pub fn evict_missing<M: OrbitModel + ?Sized>(&mut self, model: &M) -> usize {
        let before = self.pool.len();
        self.pool.retain(|id, _| model.node(*id).is_some());
        let mut evicted = before - self.pool.len();
        let removed = self.active.as_ref().map(|a| a.node).filter(|id| model.node(*id).is_none());
        if let Some(node) = removed {
            if self.detach().is_ok() {
                self.pool.remove(&node);
                evicted += 1;
            }
        }
        if evicted > 0 {
            debug!(evicted, "dropped panels of removed nodes");
        }
        evicted
    }
}
