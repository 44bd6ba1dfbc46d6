//! Time-snap panel: event table, snapping, manual shifts, and reset.

use maneuver_config::DebounceConfig;
use maneuver_core::time::{Calendar, format_countdown};
use maneuver_events::{
    EventKind, EventTime, Target, apoapsis, closest_approach, equatorial_node, next_orbit, next_patch,
    orbits_reset_required, periapsis, previous_orbit, previous_patch, recurrence_applies, relative_node,
    with_recurrence,
};
use maneuver_orbits::{Gizmo, ManeuverNode, ModelError, NodeId, OrbitModel, PatchCursor, Transition};
use tracing::debug;

use super::debounce::{Debounce, DebounceAction};
use super::{PanelId, SHIFT_INCREMENTS};

const COUNTDOWN_UNITS: usize = 3;

/// Read-only context needed to evaluate snap targets.
#[derive(Debug, Clone, Copy)]
pub struct SnapEnv<'a> {
    pub target: Option<&'a Target>,
    pub calendar: &'a Calendar,
}

/// Time at which a snap action would place a node, with validity.
///
/// Periodic events are shifted by `orbits_added` revolutions; events already in the past are invalid.
pub fn evaluate(
    kind: EventKind,
    patch: &PatchCursor<'_>,
    node_ut: f64,
    now: f64,
    orbits_added: u32,
    target: Option<&Target>,
) -> EventTime {
    let periodic = |event: EventTime| with_recurrence(event, patch, orbits_added);
    let event = match kind {
        EventKind::Apoapsis => periodic(apoapsis(patch)),
        EventKind::Periapsis => periodic(periapsis(patch)),
        EventKind::NextOrbit => next_orbit(patch, node_ut),
        EventKind::PreviousOrbit => previous_orbit(patch, node_ut, now),
        EventKind::NextPatch => next_patch(patch),
        EventKind::PreviousPatch => previous_patch(patch),
        EventKind::EquatorialAscending => periodic(equatorial_node(patch, true)),
        EventKind::EquatorialDescending => periodic(equatorial_node(patch, false)),
        EventKind::RelativeAscending => target.map_or(EventTime::INVALID, |t| periodic(relative_node(patch, t, true))),
        EventKind::RelativeDescending => target.map_or(EventTime::INVALID, |t| periodic(relative_node(patch, t, false))),
        EventKind::ClosestApproach => target
            .and_then(|t| closest_approach(patch, t, true, None))
            .map_or(EventTime::INVALID, EventTime::at),
    };
    if event.valid && event.ut < now {
        EventTime { valid: false, ..event }
    } else {
        event
    }
}

/// One row of the snap table.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapSlot {
    pub kind: EventKind,
    pub enabled: bool,
    pub ut: f64,
    pub countdown: String,
}

/// Everything the panel displays.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapTable {
    pub slots: Vec<SnapSlot>,
    /// Signed time relative to the node: `"- 5m 3s"` before it, `"+ 5m 3s"` after.
    pub node_countdown: String,
    /// Time to the UT captured when the panel opened.
    pub reset_countdown: String,
}

impl SnapTable {
    /// Table with every slot disabled (no patch available).
    pub fn unavailable() -> Self {
        Self {
            slots: EventKind::ALL
                .into_iter()
                .map(|kind| SnapSlot {
                    kind,
                    enabled: false,
                    ut: f64::NAN,
                    countdown: String::new(),
                })
                .collect(),
            node_countdown: String::new(),
            reset_countdown: String::new(),
        }
    }

    fn build(
        patch: &PatchCursor<'_>,
        node: &ManeuverNode,
        now: f64,
        orbits_added: u32,
        reset_ut: f64,
        env: &SnapEnv<'_>,
    ) -> Self {
        let mut table = Self {
            slots: EventKind::ALL
                .into_iter()
                .map(|kind| {
                    let event = evaluate(kind, patch, node.ut, now, orbits_added, env.target);
                    SnapSlot {
                        kind,
                        enabled: event.valid,
                        ut: event.ut,
                        countdown: String::new(),
                    }
                })
                .collect(),
            node_countdown: String::new(),
            reset_countdown: String::new(),
        };
        table.refresh(now, node.ut, reset_ut, env.calendar);
        table
    }

    /// Recompute countdown text without re-solving event times.
    pub fn refresh(&mut self, now: f64, node_ut: f64, reset_ut: f64, calendar: &Calendar) {
        for slot in &mut self.slots {
            slot.countdown = if slot.enabled {
                format_countdown(slot.ut - now, calendar, COUNTDOWN_UNITS, false)
            } else {
                String::new()
            };
        }
        self.node_countdown = format_countdown(now - node_ut, calendar, COUNTDOWN_UNITS, true);
        self.reset_countdown = format_countdown(reset_ut - now, calendar, COUNTDOWN_UNITS, false);
    }

    pub fn slot(&self, kind: EventKind) -> Option<&SnapSlot> {
        self.slots.iter().find(|s| s.kind == kind)
    }

    pub fn is_enabled(&self, kind: EventKind) -> bool {
        self.slot(kind).is_some_and(|s| s.enabled)
    }

    pub fn enabled(&self) -> impl Iterator<Item = &SnapSlot> {
        self.slots.iter().filter(|s| s.enabled)
    }
}

/// What a poll did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Resolved,
    Refreshed,
    Idle,
}

/// Time-snap panel bound to one node.
#[derive(Debug, Clone)]
pub struct SnapPanel {
    id: PanelId,
    node: NodeId,
    locked: bool,
    start_ut: f64,
    orbits_added: u32,
    shift_index: usize,
    table: SnapTable,
    debounce: Debounce,
}

impl SnapPanel {
    pub fn open(
        id: PanelId,
        node: &ManeuverNode,
        gizmo: Option<&Gizmo>,
        debounce: DebounceConfig,
        shift_index: usize,
    ) -> Self {
        Self {
            id,
            node: node.id,
            locked: false,
            start_ut: node.ut,
            orbits_added: gizmo.map_or(0, Gizmo::orbits_added),
            shift_index: shift_index.min(SHIFT_INCREMENTS.len() - 1),
            table: SnapTable::unavailable(),
            debounce: Debounce::new(debounce, node.magnitude()),
        }
    }

    /// Re-capture the node's state when the panel is shown again for it. The panel keeps its
    /// `orbits_added`; the caller copies it onto the fresh gizmo.
    pub fn rebind(&mut self, node: &ManeuverNode) {
        self.start_ut = node.ut;
        self.debounce.mark_resolved(node.magnitude());
    }

    pub fn id(&self) -> PanelId {
        self.id
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    pub fn toggle_locked(&mut self) -> bool {
        self.locked = !self.locked;
        self.locked
    }

    pub fn start_ut(&self) -> f64 {
        self.start_ut
    }

    pub fn orbits_added(&self) -> u32 {
        self.orbits_added
    }

    pub fn table(&self) -> &SnapTable {
        &self.table
    }

    pub fn shift_index(&self) -> usize {
        self.shift_index
    }

    /// Current manual shift step (s).
    pub fn shift_increment(&self) -> f64 {
        SHIFT_INCREMENTS[self.shift_index]
    }

    pub fn increment_up(&mut self) -> f64 {
        self.shift_index = (self.shift_index + 1).min(SHIFT_INCREMENTS.len() - 1);
        self.shift_increment()
    }

    pub fn increment_down(&mut self) -> f64 {
        self.shift_index = self.shift_index.saturating_sub(1);
        self.shift_increment()
    }

    /// Re-solve every event for the node's current patch.
    pub fn resolve<M: OrbitModel + ?Sized>(&mut self, model: &M, gizmo: Option<&mut Gizmo>, env: &SnapEnv<'_>) {
        let (Some(node), Some(patch)) = (model.node(self.node), model.patch_before(self.node)) else {
            self.table = SnapTable::unavailable();
            return;
        };
        if orbits_reset_required(&patch) {
            self.orbits_added = 0;
            if let Some(gizmo) = gizmo {
                gizmo.reset_orbits();
            }
        }
        self.table = SnapTable::build(&patch, node, model.now(), self.orbits_added, self.start_ut, env);
        self.debounce.mark_resolved(node.magnitude());
        debug!(panel = %self.id, node = %self.node, enabled = self.table.enabled().count(), "snap table resolved");
    }

    /// Per-frame update: full re-solve after a large DeltaV change, else a throttled countdown refresh.
    pub fn poll<M: OrbitModel + ?Sized>(
        &mut self,
        dt: f64,
        model: &M,
        gizmo: Option<&mut Gizmo>,
        env: &SnapEnv<'_>,
    ) -> PollOutcome {
        let Some(node) = model.node(self.node) else {
            return PollOutcome::Idle;
        };
        match self.debounce.check(dt, node.magnitude()) {
            DebounceAction::Resolve => {
                self.resolve(model, gizmo, env);
                PollOutcome::Resolved
            }
            DebounceAction::Refresh => {
                self.table.refresh(model.now(), node.ut, self.start_ut, env.calendar);
                PollOutcome::Refreshed
            }
            DebounceAction::Idle => PollOutcome::Idle,
        }
    }

    /// Move the node to the given event. Returns `false` when the event is unavailable.
    pub fn snap<M: OrbitModel + ?Sized>(
        &mut self,
        kind: EventKind,
        model: &mut M,
        mut gizmo: Option<&mut Gizmo>,
        env: &SnapEnv<'_>,
    ) -> Result<bool, ModelError> {
        let node = *model.node(self.node).ok_or(ModelError::UnknownNode(self.node))?;
        let event = match model.patch_before(self.node) {
            Some(patch) => evaluate(kind, &patch, node.ut, model.now(), self.orbits_added, env.target),
            None => EventTime::INVALID,
        };
        if !event.valid {
            return Ok(false);
        }
        match kind {
            EventKind::NextOrbit => {
                self.orbits_added += 1;
                if let Some(g) = gizmo.as_deref_mut() {
                    g.add_orbit();
                }
            }
            EventKind::PreviousOrbit => {
                self.orbits_added = self.orbits_added.saturating_sub(1);
                if let Some(g) = gizmo.as_deref_mut() {
                    g.remove_orbit();
                }
            }
            _ => {}
        }
        self.set_node_time(event.ut, model, gizmo, env)
    }

    /// Shift the node later by the selected increment, staying inside the SOI and, on a closed
    /// INITIAL→FINAL patch, inside the current revolution window.
    pub fn shift_up<M: OrbitModel + ?Sized>(
        &mut self,
        model: &mut M,
        gizmo: Option<&mut Gizmo>,
        env: &SnapEnv<'_>,
    ) -> Result<bool, ModelError> {
        let node = *model.node(self.node).ok_or(ModelError::UnknownNode(self.node))?;
        let Some(patch) = model.patch_before(self.node) else {
            return Ok(false);
        };
        let mut time = node.ut + self.shift_increment();
        if patch.soi_exit_ut.is_some_and(|exit| exit - 1.0 <= time) {
            return Ok(false);
        }
        let window_end = model.now() + f64::from(self.orbits_added + 1) * patch.period();
        if spans_whole_plan(&patch) && patch.is_closed() && time >= window_end {
            time -= patch.period();
        }
        self.set_node_time(time, model, gizmo, env)
    }

    /// Shift the node earlier by the selected increment; wraps forward a revolution on a closed
    /// INITIAL→FINAL patch, otherwise refuses to leave the patch start.
    pub fn shift_down<M: OrbitModel + ?Sized>(
        &mut self,
        model: &mut M,
        gizmo: Option<&mut Gizmo>,
        env: &SnapEnv<'_>,
    ) -> Result<bool, ModelError> {
        let node = *model.node(self.node).ok_or(ModelError::UnknownNode(self.node))?;
        let Some(patch) = model.patch_before(self.node) else {
            return Ok(false);
        };
        let mut time = node.ut - self.shift_increment();
        if spans_whole_plan(&patch) {
            let window_start = model.now() + f64::from(self.orbits_added) * patch.period();
            if patch.is_closed() && time < window_start {
                time += patch.period();
            }
        } else if patch.start_ut + 1.0 > time {
            return Ok(false);
        }
        self.set_node_time(time, model, gizmo, env)
    }

    /// Return the node to the UT captured when the panel opened.
    pub fn reset<M: OrbitModel + ?Sized>(
        &mut self,
        model: &mut M,
        mut gizmo: Option<&mut Gizmo>,
        env: &SnapEnv<'_>,
    ) -> Result<bool, ModelError> {
        if !self.set_node_time(self.start_ut, model, gizmo.as_deref_mut(), env)? {
            return Ok(false);
        }
        let restored = model.patch_before(self.node).and_then(|patch| {
            recurrence_applies(&patch).then(|| ((self.start_ut - patch.start_ut) / patch.period()).max(0.0) as u32)
        });
        if let Some(orbits) = restored {
            self.orbits_added = orbits;
            if let Some(g) = gizmo.as_deref_mut() {
                g.set_orbits_added(orbits);
            }
            self.resolve(&*model, gizmo, env);
        }
        Ok(true)
    }

    fn set_node_time<M: OrbitModel + ?Sized>(
        &mut self,
        time: f64,
        model: &mut M,
        mut gizmo: Option<&mut Gizmo>,
        env: &SnapEnv<'_>,
    ) -> Result<bool, ModelError> {
        if !time.is_finite() {
            return Ok(false);
        }
        let node = *model.node(self.node).ok_or(ModelError::UnknownNode(self.node))?;
        model.commit(node.id, time, node.delta_v)?;
        if let Some(g) = gizmo.as_deref_mut() {
            g.ut = time;
            g.raise_update();
        }
        debug!(node = %self.node, from = node.ut, to = time, "node time moved");
        self.resolve(&*model, gizmo, env);
        Ok(true)
    }
}

fn spans_whole_plan(patch: &PatchCursor<'_>) -> bool {
    patch.start_transition == Transition::Initial && patch.end_transition == Transition::Final
}
