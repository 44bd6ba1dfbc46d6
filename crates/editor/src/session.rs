//! The editor façade driven by the UI layer once per frame.

use maneuver_config::Settings;
use maneuver_core::time::Calendar;
use maneuver_core::vector::Vector3;
use maneuver_events::{EventKind, Suggestion, Target, suggest};
use maneuver_orbits::{ModelError, NodeId, OrbitModel};
use thiserror::Error;
use tracing::{debug, warn};

use crate::accumulator::{Applied, DeltaVAccumulator};
use crate::cycle::{CycleError, CycleState, NodeCycleController, PanelOptions, Toggle};
use crate::frames::ControlAxis;
use crate::panels::{InputPanel, InputReadout, PanelKind, PollOutcome, SnapEnv, SnapPanel, SnapTable};

#[derive(Debug, Error, PartialEq)]
pub enum EditorError {
    #[error(transparent)]
    Cycle(#[from] CycleError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("the active node has no {0:?} panel")]
    NoPanel(PanelKind),
}

/// Panel polling summary for one `update` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateReport {
    pub evicted: usize,
    pub resolved: usize,
    pub refreshed: usize,
}

/// Snapshot of what the UI should show.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorStatus {
    pub state: CycleState,
    pub node_count: usize,
    pub active_node: Option<NodeId>,
    pub delta_v: Option<Vector3>,
    pub snap_table: Option<SnapTable>,
    /// Cycle buttons are shown only with two or more nodes.
    pub show_cycle_buttons: bool,
}

pub struct Editor {
    settings: Settings,
    accumulator: DeltaVAccumulator,
    controller: NodeCycleController,
    target: Option<Target>,
    calendar: Calendar,
    clock: f64,
}

impl Editor {
    pub fn new(settings: Settings) -> Self {
        Self {
            accumulator: DeltaVAccumulator::from_settings(&settings),
            controller: NodeCycleController::new(PanelOptions::from(&settings)),
            settings,
            target: None,
            calendar: Calendar::default(),
            clock: 0.0,
        }
    }

    pub fn with_calendar(mut self, calendar: Calendar) -> Self {
        self.calendar = calendar;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn accumulator(&self) -> &DeltaVAccumulator {
        &self.accumulator
    }

    pub fn controller(&self) -> &NodeCycleController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut NodeCycleController {
        &mut self.controller
    }

    pub fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    /// Wall-clock seconds accumulated through `update`.
    pub fn clock(&self) -> f64 {
        self.clock
    }

    /// Change the target; visible snap tables are re-solved immediately.
    pub fn set_target<M: OrbitModel + ?Sized>(&mut self, model: &M, target: Option<Target>) {
        self.target = target;
        self.resolve_all(model);
    }

    pub fn attach<M: OrbitModel + ?Sized>(&mut self, model: &M, index: usize) -> Result<NodeId, EditorError> {
        let node = self.controller.attach(model, index)?;
        self.resolve_active(model);
        Ok(node)
    }

    pub fn detach(&mut self) -> Result<NodeId, EditorError> {
        Ok(self.controller.detach()?)
    }

    pub fn cycle_forward<M: OrbitModel + ?Sized>(&mut self, model: &M) -> Result<NodeId, EditorError> {
        let node = self.controller.cycle_forward(model)?;
        self.resolve_active(model);
        Ok(node)
    }

    pub fn cycle_backward<M: OrbitModel + ?Sized>(&mut self, model: &M) -> Result<NodeId, EditorError> {
        let node = self.controller.cycle_backward(model)?;
        self.resolve_active(model);
        Ok(node)
    }

    pub fn toggle<M: OrbitModel + ?Sized>(
        &mut self,
        model: &M,
        camera_target: Option<NodeId>,
    ) -> Result<Toggle, EditorError> {
        let toggle = self.controller.toggle(model, camera_target)?;
        if matches!(toggle, Toggle::Attached(_)) {
            self.resolve_active(model);
        }
        Ok(toggle)
    }

    /// Keyboard entry point; ignored unless keyboard use is enabled and `key` is the shortcut.
    pub fn on_key<M: OrbitModel + ?Sized>(
        &mut self,
        model: &M,
        key: &str,
        camera_target: Option<NodeId>,
    ) -> Result<Option<Toggle>, EditorError> {
        if !self.settings.use_keyboard || !key.eq_ignore_ascii_case(&self.settings.keyboard_shortcut) {
            return Ok(None);
        }
        self.toggle(model, camera_target).map(Some)
    }

    /// Continuous handle drag on the active gizmo.
    pub fn drag<M: OrbitModel + ?Sized>(
        &mut self,
        model: &mut M,
        axis: ControlAxis,
        raw: f64,
    ) -> Result<Applied, EditorError> {
        let attachment = self.controller.active_mut().ok_or(CycleError::NotActive)?;
        Ok(self.accumulator.drag(model, &mut attachment.gizmo, axis, raw)?)
    }

    /// Unshaped delta-v input along a post-burn axis of the active node, callback raised per slice.
    pub fn apply<M: OrbitModel + ?Sized>(
        &mut self,
        model: &mut M,
        axis: ControlAxis,
        amount: f64,
    ) -> Result<Applied, EditorError> {
        let attachment = self.controller.active_mut().ok_or(CycleError::NotActive)?;
        let node = attachment.node;
        Ok(self
            .accumulator
            .apply(model, node, Some(&mut attachment.gizmo), axis, amount, true)?)
    }

    /// Input-panel step button on the active node.
    pub fn step_input<M: OrbitModel + ?Sized>(
        &mut self,
        model: &mut M,
        axis: ControlAxis,
        positive: bool,
    ) -> Result<Vector3, EditorError> {
        let align = self.settings.align_to_orbit;
        let attachment = self.controller.active_mut().ok_or(CycleError::NotActive)?;
        let panel = attachment.input.as_mut().ok_or(EditorError::NoPanel(PanelKind::Input))?;
        Ok(panel.step(axis, positive, model, Some(&mut attachment.gizmo), &self.accumulator, align)?)
    }

    /// Input-panel numeric entry on the active node.
    pub fn enter_component<M: OrbitModel + ?Sized>(
        &mut self,
        model: &mut M,
        axis: ControlAxis,
        text: &str,
    ) -> Result<Option<Vector3>, EditorError> {
        let attachment = self.controller.active_mut().ok_or(CycleError::NotActive)?;
        let panel = attachment.input.as_mut().ok_or(EditorError::NoPanel(PanelKind::Input))?;
        Ok(panel.enter_component(axis, text, model, Some(&mut attachment.gizmo))?)
    }

    pub fn reset_delta_v<M: OrbitModel + ?Sized>(&mut self, model: &mut M) -> Result<Vector3, EditorError> {
        let attachment = self.controller.active_mut().ok_or(CycleError::NotActive)?;
        let panel = attachment.input.as_mut().ok_or(EditorError::NoPanel(PanelKind::Input))?;
        Ok(panel.reset(model, Some(&mut attachment.gizmo))?)
    }

    /// Snap the active node to an event.
    pub fn snap<M: OrbitModel + ?Sized>(&mut self, model: &mut M, kind: EventKind) -> Result<bool, EditorError> {
        let env = SnapEnv {
            target: self.target.as_ref(),
            calendar: &self.calendar,
        };
        let attachment = self.controller.active_mut().ok_or(CycleError::NotActive)?;
        let panel = attachment.snap.as_mut().ok_or(EditorError::NoPanel(PanelKind::Snap))?;
        let moved = panel.snap(kind, model, Some(&mut attachment.gizmo), &env)?;
        if !moved {
            warn!(event = kind.key(), "snap target unavailable");
        }
        Ok(moved)
    }

    /// Manual time shift of the active node by the snap panel's increment.
    pub fn shift_time<M: OrbitModel + ?Sized>(&mut self, model: &mut M, later: bool) -> Result<bool, EditorError> {
        let env = SnapEnv {
            target: self.target.as_ref(),
            calendar: &self.calendar,
        };
        let attachment = self.controller.active_mut().ok_or(CycleError::NotActive)?;
        let panel = attachment.snap.as_mut().ok_or(EditorError::NoPanel(PanelKind::Snap))?;
        let gizmo = Some(&mut attachment.gizmo);
        let moved = if later {
            panel.shift_up(model, gizmo, &env)?
        } else {
            panel.shift_down(model, gizmo, &env)?
        };
        Ok(moved)
    }

    pub fn reset_time<M: OrbitModel + ?Sized>(&mut self, model: &mut M) -> Result<bool, EditorError> {
        let env = SnapEnv {
            target: self.target.as_ref(),
            calendar: &self.calendar,
        };
        let attachment = self.controller.active_mut().ok_or(CycleError::NotActive)?;
        let panel = attachment.snap.as_mut().ok_or(EditorError::NoPanel(PanelKind::Snap))?;
        Ok(panel.reset(model, Some(&mut attachment.gizmo), &env)?)
    }

    /// Flip the lock of one of the active node's panels; returns the new lock state.
    pub fn toggle_lock(&mut self, kind: PanelKind) -> Result<bool, EditorError> {
        let attachment = self.controller.active_mut().ok_or(CycleError::NotActive)?;
        match kind {
            PanelKind::Snap => attachment.snap.as_mut().map(SnapPanel::toggle_locked),
            PanelKind::Input => attachment.input.as_mut().map(InputPanel::toggle_locked),
        }
        .ok_or(EditorError::NoPanel(kind))
    }

    /// Step the snap panel's shift increment; returns the new increment (s).
    pub fn cycle_shift_increment(&mut self, up: bool) -> Result<f64, EditorError> {
        let attachment = self.controller.active_mut().ok_or(CycleError::NotActive)?;
        let panel = attachment.snap.as_mut().ok_or(EditorError::NoPanel(PanelKind::Snap))?;
        Ok(if up { panel.increment_up() } else { panel.increment_down() })
    }

    /// Scale one input increment by ten; returns the new increment (m/s).
    pub fn cycle_input_increment(&mut self, axis: ControlAxis, up: bool) -> Result<f64, EditorError> {
        let attachment = self.controller.active_mut().ok_or(CycleError::NotActive)?;
        let panel = attachment.input.as_mut().ok_or(EditorError::NoPanel(PanelKind::Input))?;
        Ok(if up { panel.increment_up(axis) } else { panel.increment_down(axis) })
    }

    pub fn input_readout<M: OrbitModel + ?Sized>(&self, model: &M) -> Result<InputReadout, EditorError> {
        let attachment = self.controller.active().ok_or(CycleError::NotActive)?;
        let panel = attachment.input.as_ref().ok_or(EditorError::NoPanel(PanelKind::Input))?;
        let node = model
            .node(attachment.node)
            .ok_or(ModelError::UnknownNode(attachment.node))?;
        let index = model.node_index(attachment.node).unwrap_or_default();
        Ok(panel.readout(node, index))
    }

    /// Per-frame tick: evict panels of removed nodes and poll every visible snap panel.
    pub fn update<M: OrbitModel + ?Sized>(&mut self, model: &M, dt: f64) -> UpdateReport {
        self.clock += dt;
        let mut report = UpdateReport {
            evicted: self.controller.evict_missing(model),
            ..UpdateReport::default()
        };
        let env = SnapEnv {
            target: self.target.as_ref(),
            calendar: &self.calendar,
        };
        let mut tally = |outcome: PollOutcome| match outcome {
            PollOutcome::Resolved => report.resolved += 1,
            PollOutcome::Refreshed => report.refreshed += 1,
            PollOutcome::Idle => {}
        };

        if let Some(attachment) = self.controller.active_mut() {
            if let Some(panel) = attachment.snap.as_mut() {
                tally(panel.poll(dt, model, Some(&mut attachment.gizmo), &env));
            }
        }
        for (_, pooled) in self.controller.pool_mut() {
            if let Some(panel) = pooled.snap.as_mut() {
                tally(panel.poll(dt, model, None, &env));
            }
        }
        report
    }

    /// Context-menu suggestions for a clicked UT on the plan.
    pub fn suggestions<M: OrbitModel + ?Sized>(&self, model: &M, clicked_ut: f64) -> Vec<Suggestion> {
        suggest(
            model.flight_plan(),
            clicked_ut,
            self.settings.selection_tolerance_deg,
            self.target.as_ref(),
        )
    }

    pub fn status<M: OrbitModel + ?Sized>(&self, model: &M) -> EditorStatus {
        let active = self.controller.active();
        let node_count = model.nodes().len();
        EditorStatus {
            state: self.controller.state(model),
            node_count,
            active_node: active.map(|a| a.node),
            delta_v: active.and_then(|a| model.node(a.node)).map(|n| n.delta_v),
            snap_table: active.and_then(|a| a.snap.as_ref()).map(|p| p.table().clone()),
            show_cycle_buttons: self.settings.show_maneuver_cycle && node_count > 1,
        }
    }

    fn resolve_active<M: OrbitModel + ?Sized>(&mut self, model: &M) {
        let env = SnapEnv {
            target: self.target.as_ref(),
            calendar: &self.calendar,
        };
        if let Some(attachment) = self.controller.active_mut() {
            if let Some(panel) = attachment.snap.as_mut() {
                panel.resolve(model, Some(&mut attachment.gizmo), &env);
            }
        }
    }

    fn resolve_all<M: OrbitModel + ?Sized>(&mut self, model: &M) {
        self.resolve_active(model);
        let env = SnapEnv {
            target: self.target.as_ref(),
            calendar: &self.calendar,
        };
        for (_, pooled) in self.controller.pool_mut() {
            if let Some(panel) = pooled.snap.as_mut() {
                panel.resolve(model, None, &env);
            }
        }
        debug!(pooled = self.controller.pool_len(), "snap tables re-solved");
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use maneuver_orbits::{Body, BodyId, Conic, PatchedConicModel};

    use super::*;

    fn model_with_nodes(count: usize) -> PatchedConicModel {
        let body = Body {
            id: BodyId(1),
            name: "Kerbin".into(),
            mu: 3.5316e12,
            radius: 600_000.0,
            soi_radius: 84_159_286.0,
        };
        let conic = Conic::from_degrees(body.mu, 700_000.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        let mut model = PatchedConicModel::new(body, conic, 0.0);
        for i in 0..count {
            model.add_node(300.0 + 200.0 * i as f64, [0.0; 3]).expect("node");
        }
        model
    }

    #[test]
    fn shortcut_toggles_only_when_enabled() {
        let model = model_with_nodes(2);
        let mut editor = Editor::new(Settings::default());
        assert_eq!(editor.on_key(&model, "x", None).unwrap(), None);
        assert!(matches!(editor.on_key(&model, "N", None).unwrap(), Some(Toggle::Attached(_))));
        assert!(matches!(editor.on_key(&model, "n", None).unwrap(), Some(Toggle::Detached(_))));

        let settings = Settings {
            use_keyboard: false,
            ..Settings::default()
        };
        let mut editor = Editor::new(settings);
        assert_eq!(editor.on_key(&model, "n", None).unwrap(), None);
        assert!(!editor.controller().is_active());
    }

    #[test]
    fn drag_raises_callback_once_per_slice() {
        let mut model = model_with_nodes(1);
        let mut editor = Editor::new(Settings::default());
        editor.attach(&model, 0).unwrap();

        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        let attachment = editor.controller_mut().active_mut().unwrap();
        attachment
            .gizmo
            .set_update_handler(Box::new(move |_, _, _| seen.set(seen.get() + 1)));

        let applied = editor.drag(&mut model, ControlAxis::Prograde, 5.0).unwrap();
        assert_eq!(applied.slices, 5);
        assert_eq!(calls.get(), 5);
        assert!((applied.delta_v[2] - 5.0).abs() < 1e-6);
    }

    #[test]
    fn aligned_step_does_not_raise_callback() {
        let mut model = model_with_nodes(1);
        let mut editor = Editor::new(Settings::default());
        editor.attach(&model, 0).unwrap();
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        editor
            .controller_mut()
            .active_mut()
            .unwrap()
            .gizmo
            .set_update_handler(Box::new(move |_, _, _| seen.set(seen.get() + 1)));

        let dv = editor.step_input(&mut model, ControlAxis::Prograde, true).unwrap();
        assert!((dv[2] - 0.1).abs() < 1e-9);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn locked_panels_survive_cycling() {
        let model = model_with_nodes(3);
        let mut editor = Editor::new(Settings::default());
        let first = editor.attach(&model, 0).unwrap();
        let snap_id = editor.controller().active().unwrap().snap.as_ref().unwrap().id();
        let input_id = editor.controller().active().unwrap().input.as_ref().unwrap().id();
        assert!(editor.toggle_lock(PanelKind::Snap).unwrap());

        for _ in 0..3 {
            editor.cycle_forward(&model).unwrap();
        }
        let attachment = editor.controller().active().unwrap();
        assert_eq!(attachment.node, first);
        assert_eq!(attachment.snap.as_ref().unwrap().id(), snap_id);
        assert_ne!(attachment.input.as_ref().unwrap().id(), input_id);
    }

    #[test]
    fn update_polls_pooled_panels_and_evicts_removed_nodes() {
        let mut model = model_with_nodes(2);
        let mut editor = Editor::new(Settings::default());
        let first = editor.attach(&model, 0).unwrap();
        editor.toggle_lock(PanelKind::Snap).unwrap();
        editor.attach(&model, 1).unwrap();
        assert_eq!(editor.controller().pool_len(), 1);

        let report = editor.update(&model, 0.6);
        assert_eq!(report.refreshed, 2);
        assert_eq!(report.evicted, 0);

        model.remove_node(first);
        let report = editor.update(&model, 0.1);
        assert_eq!(report.evicted, 1);
        assert_eq!(editor.controller().pool_len(), 0);
        assert_eq!(editor.controller().state(&model), CycleState::Active(0));
    }

    #[test]
    fn status_hides_cycle_buttons_for_single_node() {
        let model = model_with_nodes(1);
        let mut editor = Editor::new(Settings::default());
        assert!(!editor.status(&model).show_cycle_buttons);
        editor.attach(&model, 0).unwrap();
        let status = editor.status(&model);
        assert_eq!(status.state, CycleState::Active(0));
        assert!(status.snap_table.is_some());
        assert_eq!(editor.cycle_forward(&model), Err(EditorError::Cycle(CycleError::TooFewNodes(1))));
    }
}
