use std::f64::consts::PI;

use maneuver_planner::config::Settings;
use maneuver_planner::editor::{
    ControlAxis, CycleState, DeltaVAccumulator, Editor, EditorError, MAX_SLICES, PanelKind, Toggle,
};
use maneuver_planner::events::{EventKind, Target};
use maneuver_planner::orbits::{Body, BodyId, Conic, NodeId, OrbitModel, PatchedConicModel};

const PERIOD: f64 = 600.0;
const SMA: f64 = 1_000_000.0;

fn body() -> Body {
    Body {
        id: BodyId(1),
        name: "Test".into(),
        mu: 4.0 * PI * PI * SMA.powi(3) / (PERIOD * PERIOD),
        radius: 10_000.0,
        soi_radius: f64::INFINITY,
    }
}

/// Eccentric orbit at periapsis at UT 0, with nodes at the given times.
fn model(node_times: &[f64]) -> PatchedConicModel {
    let body = body();
    let conic = Conic::from_degrees(body.mu, SMA, 0.3, 0.0, 0.0, 0.0, 0.0, 0.0);
    let mut model = PatchedConicModel::new(body, conic, 0.0);
    for &ut in node_times {
        model.add_node(ut, [0.0; 3]).expect("node");
    }
    model
}

fn node_ut(model: &PatchedConicModel, id: NodeId) -> f64 {
    model.node(id).expect("node present").ut
}

fn slot_ut(editor: &Editor, model: &PatchedConicModel, kind: EventKind) -> Option<f64> {
    let table = editor.status(model).snap_table.expect("snap panel open");
    table.slot(kind).filter(|slot| slot.enabled).map(|slot| slot.ut)
}

#[test]
fn snap_to_apoapsis_and_reset() {
    let mut model = model(&[100.0]);
    let mut editor = Editor::new(Settings::default());
    let id = editor.attach(&model, 0).expect("attach");

    assert!(editor.snap(&mut model, EventKind::Apoapsis).expect("snap"));
    assert!((node_ut(&model, id) - 300.0).abs() < 1e-6);

    assert!(editor.shift_time(&mut model, true).expect("shift"));
    assert!((node_ut(&model, id) - 301.0).abs() < 1e-6);

    assert!(editor.reset_time(&mut model).expect("reset"));
    assert!((node_ut(&model, id) - 100.0).abs() < 1e-9);
}

#[test]
fn next_orbit_shifts_periodic_events() {
    let mut model = model(&[100.0]);
    let mut editor = Editor::new(Settings::default());
    let id = editor.attach(&model, 0).expect("attach");

    assert!(editor.snap(&mut model, EventKind::NextOrbit).expect("snap"));
    assert!((node_ut(&model, id) - 700.0).abs() < 1e-6);
    let apo = slot_ut(&editor, &model, EventKind::Apoapsis).expect("apoapsis enabled");
    assert!((apo - 900.0).abs() < 1e-6, "apoapsis one orbit later, got {apo}");
    let previous = slot_ut(&editor, &model, EventKind::PreviousOrbit).expect("previous orbit enabled");
    assert!((previous - 100.0).abs() < 1e-6);

    assert!(editor.snap(&mut model, EventKind::PreviousOrbit).expect("snap back"));
    assert!((node_ut(&model, id) - 100.0).abs() < 1e-6);
    let apo = slot_ut(&editor, &model, EventKind::Apoapsis).expect("apoapsis enabled");
    assert!((apo - 300.0).abs() < 1e-6);
}

#[test]
fn manual_shifts_wrap_inside_the_current_revolution() {
    let mut model = model(&[0.5]);
    let mut editor = Editor::new(Settings::default());
    let id = editor.attach(&model, 0).expect("attach");

    assert!(editor.shift_time(&mut model, false).expect("shift down"));
    assert!((node_ut(&model, id) - 599.5).abs() < 1e-9, "wrapped forward to {}", node_ut(&model, id));

    assert!(editor.shift_time(&mut model, true).expect("shift up"));
    assert!((node_ut(&model, id) - 0.5).abs() < 1e-9, "wrapped back to {}", node_ut(&model, id));

    assert_eq!(editor.cycle_shift_increment(true).expect("increment"), 10.0);
}

#[test]
fn chunked_input_matches_repeated_small_steps() {
    let accumulator = DeltaVAccumulator::new(1.0);
    let mut once = model(&[150.0]);
    let mut stepped = model(&[150.0]);
    let id = once.nodes()[0].id;

    let applied = accumulator
        .apply(&mut once, id, None, ControlAxis::Radial, 5.0, true)
        .expect("apply");
    assert_eq!(applied.slices, 5);
    for _ in 0..5 {
        accumulator
            .apply(&mut stepped, id, None, ControlAxis::Radial, 1.0, true)
            .expect("step");
    }

    let a = once.node(id).expect("node").delta_v;
    let b = stepped.node(id).expect("node").delta_v;
    for i in 0..3 {
        assert!((a[i] - b[i]).abs() < 1e-9, "component {i}: {} vs {}", a[i], b[i]);
    }
    assert!(a[0] > 4.9, "mostly radial: {a:?}");
}

#[test]
fn input_below_threshold_is_one_slice() {
    let accumulator = DeltaVAccumulator::new(1.0);
    let mut once = model(&[150.0]);
    let mut stepped = model(&[150.0]);
    let id = once.nodes()[0].id;

    let applied = accumulator
        .apply(&mut once, id, None, ControlAxis::Prograde, 0.9, true)
        .expect("apply");
    assert_eq!(applied.slices, 1);
    for _ in 0..3 {
        accumulator
            .apply(&mut stepped, id, None, ControlAxis::Prograde, 0.3, true)
            .expect("step");
    }
    let a = once.node(id).expect("node").delta_v;
    let b = stepped.node(id).expect("node").delta_v;
    assert!((a[2] - 0.9).abs() < 1e-9);
    assert!((a[2] - b[2]).abs() < 1e-9, "{} vs {}", a[2], b[2]);
}

#[test]
fn large_input_is_split_into_a_bounded_number_of_slices() {
    let accumulator = DeltaVAccumulator::new(1.0);
    let mut model = model(&[150.0]);
    let id = model.nodes()[0].id;

    let applied = accumulator
        .apply(&mut model, id, None, ControlAxis::Prograde, 2_000.0, true)
        .expect("apply");
    assert_eq!(applied.slices, MAX_SLICES);
    assert!((applied.delta_v[2] - 2_000.0).abs() < 1e-6, "{:?}", applied.delta_v);

    let dropped = accumulator
        .apply(&mut model, id, None, ControlAxis::Prograde, f64::NAN, true)
        .expect("non-finite input is ignored");
    assert_eq!(dropped.slices, 0);
    assert_eq!(dropped.delta_v, applied.delta_v);
}

#[test]
fn cycling_through_every_node_returns_to_the_start() {
    let model = model(&[100.0, 200.0, 300.0, 400.0]);
    let mut editor = Editor::new(Settings::default());
    let start = editor.attach(&model, 1).expect("attach");
    for _ in 0..4 {
        editor.cycle_forward(&model).expect("cycle");
    }
    assert_eq!(editor.controller().active().map(|a| a.node), Some(start));

    editor.attach(&model, 0).expect("attach first");
    editor.cycle_backward(&model).expect("cycle back");
    assert_eq!(editor.controller().state(&model), CycleState::Active(3));
}

#[test]
fn locked_input_panel_is_restored_unlocked_snap_is_recreated() {
    let model = model(&[100.0, 200.0]);
    let mut editor = Editor::new(Settings::default());
    editor.attach(&model, 0).expect("attach");
    let active = editor.controller().active().expect("active");
    let input_id = active.input.as_ref().expect("input").id();
    let snap_id = active.snap.as_ref().expect("snap").id();
    assert!(editor.toggle_lock(PanelKind::Input).expect("lock"));

    editor.cycle_forward(&model).expect("away");
    editor.cycle_forward(&model).expect("back");
    let active = editor.controller().active().expect("active");
    assert_eq!(active.input.as_ref().expect("input").id(), input_id);
    assert_ne!(active.snap.as_ref().expect("snap").id(), snap_id);
}

#[test]
fn remembered_increments_carry_to_new_panels() {
    let model = model(&[100.0, 200.0]);
    let mut editor = Editor::new(Settings::default());
    editor.attach(&model, 0).expect("attach");
    editor.cycle_input_increment(ControlAxis::Prograde, true).expect("increment");
    editor.cycle_forward(&model).expect("cycle");
    let input = editor.controller().active().and_then(|a| a.input.as_ref()).expect("input");
    assert_eq!(input.increment(ControlAxis::Prograde), 1.0);

    let settings = Settings {
        remember_manual_input: false,
        ..Settings::default()
    };
    let mut editor = Editor::new(settings);
    editor.attach(&model, 0).expect("attach");
    editor.cycle_input_increment(ControlAxis::Prograde, true).expect("increment");
    editor.cycle_forward(&model).expect("cycle");
    let input = editor.controller().active().and_then(|a| a.input.as_ref()).expect("input");
    assert_eq!(input.increment(ControlAxis::Prograde), 0.1);
}

#[test]
fn toggle_prefers_the_camera_node() {
    let model = model(&[100.0, 200.0, 300.0]);
    let mut editor = Editor::new(Settings::default());
    let camera = model.nodes()[2].id;
    assert_eq!(editor.toggle(&model, Some(camera)).expect("toggle"), Toggle::Attached(camera));
    assert_eq!(editor.toggle(&model, None).expect("toggle"), Toggle::Detached(camera));
    assert_eq!(editor.toggle(&model, None).expect("toggle"), Toggle::Attached(camera));
}

#[test]
fn editing_without_an_active_node_fails() {
    let mut model = model(&[100.0]);
    let mut editor = Editor::new(Settings::default());
    assert!(matches!(
        editor.snap(&mut model, EventKind::Apoapsis),
        Err(EditorError::Cycle(_))
    ));

    let settings = Settings {
        replace_gizmo_buttons: false,
        ..Settings::default()
    };
    let mut editor = Editor::new(settings);
    editor.attach(&model, 0).expect("attach");
    assert_eq!(
        editor.snap(&mut model, EventKind::Apoapsis),
        Err(EditorError::NoPanel(PanelKind::Snap))
    );
    let applied = editor.drag(&mut model, ControlAxis::Prograde, 2.0).expect("gizmo drag still works");
    assert_eq!(applied.slices, 2);
}

#[test]
fn target_enables_relative_events() {
    let model = model(&[100.0]);
    let mut editor = Editor::new(Settings::default());
    editor.attach(&model, 0).expect("attach");
    assert!(slot_ut(&editor, &model, EventKind::RelativeAscending).is_none());

    let body = body();
    let inclined = Conic::from_degrees(body.mu, 1.1 * SMA, 0.0, 30.0, 45.0, 0.0, 0.0, 0.0);
    editor.set_target(&model, Some(Target::vessel("Station", body.id, inclined)));
    let an = slot_ut(&editor, &model, EventKind::RelativeAscending).expect("relative AN");
    let dn = slot_ut(&editor, &model, EventKind::RelativeDescending).expect("relative DN");
    assert!(an >= 0.0 && an <= PERIOD);
    assert!(dn >= 0.0 && dn <= PERIOD);
}

#[test]
fn suggestions_follow_the_clicked_position() {
    let model = model(&[]);
    let editor = Editor::new(Settings::default());
    let near_apoapsis = editor.suggestions(&model, 300.0);
    assert!(near_apoapsis.iter().any(|s| s.kind == EventKind::Apoapsis));
    assert!(!near_apoapsis.iter().any(|s| s.kind == EventKind::Periapsis));
}

#[test]
fn pooled_snap_panel_keeps_its_revolution_count() {
    let mut model = model(&[100.0, 200.0]);
    let mut editor = Editor::new(Settings::default());
    let id = editor.attach(&model, 1).expect("attach last node");
    assert!(editor.snap(&mut model, EventKind::NextOrbit).expect("next orbit"));
    assert!((node_ut(&model, id) - 800.0).abs() < 1e-6);
    assert!(editor.toggle_lock(PanelKind::Snap).expect("lock"));

    editor.cycle_forward(&model).expect("away");
    editor.attach(&model, 1).expect("back");

    let active = editor.controller().active().expect("active");
    assert_eq!(active.node, id);
    assert_eq!(active.gizmo.orbits_added(), 1);
    assert_eq!(active.snap.as_ref().expect("snap").orbits_added(), 1);
}

#[test]
fn whole_orbit_snaps_are_only_offered_on_the_last_node() {
    let mut model = model(&[100.0, 200.0]);
    let mut editor = Editor::new(Settings::default());
    let first = editor.attach(&model, 0).expect("attach first node");

    assert!(slot_ut(&editor, &model, EventKind::NextOrbit).is_none());
    assert!(slot_ut(&editor, &model, EventKind::PreviousOrbit).is_none());
    assert!(!editor.snap(&mut model, EventKind::NextOrbit).expect("snap"));
    assert!((node_ut(&model, first) - 100.0).abs() < 1e-9, "node must stay ahead of the second one");
    assert_eq!(model.node_index(first), Some(0));

    let second = editor.attach(&model, 1).expect("attach second node");
    assert!(editor.snap(&mut model, EventKind::NextOrbit).expect("next orbit"));
    assert_eq!(editor.controller().active().expect("active").gizmo.orbits_added(), 1);

    // a later node takes over the terminus, so the revolution count drops
    model.add_node(1_000.0, [0.0; 3]).expect("third node");
    assert!(editor.shift_time(&mut model, true).expect("shift"));
    let active = editor.controller().active().expect("active");
    assert_eq!(active.node, second);
    assert_eq!(active.gizmo.orbits_added(), 0);
    assert_eq!(active.snap.as_ref().expect("snap").orbits_added(), 0);
    assert!(slot_ut(&editor, &model, EventKind::NextOrbit).is_none());
}

#[test]
fn active_state_tracks_reordered_nodes() {
    let mut model = model(&[100.0, 200.0]);
    let mut editor = Editor::new(Settings::default());
    let id = editor.attach(&model, 0).expect("attach");
    assert_eq!(editor.controller().state(&model), CycleState::Active(0));

    model.commit(id, 250.0, [0.0; 3]).expect("move past the second node");
    assert_eq!(editor.controller().state(&model), CycleState::Active(1));
    assert_eq!(editor.status(&model).state, CycleState::Active(1));
}

#[test]
fn removing_the_active_node_detaches_it() {
    let mut model = model(&[100.0, 200.0]);
    let mut editor = Editor::new(Settings::default());
    let id = editor.attach(&model, 0).expect("attach");
    assert!(editor.toggle_lock(PanelKind::Snap).expect("lock"));

    model.remove_node(id).expect("removed");
    let report = editor.update(&model, 0.1);
    assert_eq!(report.evicted, 1);
    assert!(!editor.controller().is_active());
    assert!(editor.controller().pooled(id).is_none(), "locked panel of a removed node is dropped");
    assert_eq!(editor.controller().pool_len(), 0);
}
