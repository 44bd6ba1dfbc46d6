use std::fs;

use maneuver_planner::config::Settings;
use maneuver_planner::editor::Editor;
use maneuver_planner::events::{EventKind, TargetKind};
use maneuver_planner::orbits::{OrbitModel, Transition};
use maneuver_planner::report::event_report;
use maneuver_planner::scenario::{self, ScenarioError};

const SCENARIOS: &str = "data/scenarios/kerbin.yaml";

#[test]
fn bundled_scenarios_build_valid_plans() {
    let scenarios = scenario::load(SCENARIOS).expect("bundled scenarios");
    assert_eq!(scenarios.len(), 3);
    for scenario in &scenarios {
        scenario
            .model
            .flight_plan()
            .validate()
            .unwrap_or_else(|err| panic!("{}: {err}", scenario.name));
        assert!(!scenario.model.nodes().is_empty());
    }

    let mun = scenarios.iter().find(|s| s.name == "mun-transfer").expect("mun-transfer");
    let target = mun.target.as_ref().expect("Mun target");
    assert_eq!(target.kind, TargetKind::Body);
    assert_ne!(target.body, mun.model.body().id, "the Mun target declares its own body");
}

#[test]
fn escape_burn_leaves_the_soi() {
    let escape = scenario::load_named(SCENARIOS, Some("escape")).expect("escape scenario");
    let first = escape.model.nodes()[0].id;
    let after = escape.model.patch_after(first).expect("post-burn patch");
    assert!(!after.is_closed());
    assert_eq!(after.start_transition, Transition::Maneuver);
    assert_eq!(after.end_transition, Transition::Maneuver, "the correction burn follows");

    let terminus = escape.model.flight_plan().terminus().expect("FINAL patch");
    assert!(!terminus.is_closed());
    assert!(terminus.soi_exit_ut.is_some(), "hyperbola must exit the SOI");
    assert_eq!(escape.calendar.seconds_per_day, 86_400.0);
}

#[test]
fn report_lists_every_event_for_every_node() {
    let parking = scenario::load_named(SCENARIOS, None).expect("first scenario");
    assert_eq!(parking.name, "eccentric-parking");
    let mut editor = Editor::new(Settings::default()).with_calendar(parking.calendar);
    editor.set_target(&parking.model, parking.target.clone());

    let report = event_report(&parking, &mut editor).expect("report");
    assert!(!editor.controller().is_active(), "report leaves the editor detached");
    assert_eq!(report.nodes.len(), 2);
    assert_eq!(report.target.as_deref(), Some("Relay Alpha"));
    for node in &report.nodes {
        assert_eq!(node.events.len(), EventKind::ALL.len());
        let apo = node.events.iter().find(|row| row.event == "apoapsis").expect("apoapsis row");
        assert!(apo.enabled, "node {} should offer its apoapsis", node.index);
        assert!(apo.ut_s.is_some_and(|ut| ut >= report.now_s));
    }
    let relative = report.nodes[0]
        .events
        .iter()
        .find(|row| row.event == "relative_an")
        .expect("relative AN row");
    assert!(relative.enabled, "inclined target gives a relative node");
}

#[test]
fn toml_directory_scenarios_load() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        dir.path().join("polar.toml"),
        r#"
name = "polar"
now_s = 50.0

[body]
name = "Kerbin"
id = 1
mu_m3_s2 = 3.5316e12
radius_m = 600000.0

[orbit]
semi_major_axis_m = 800000.0
eccentricity = 0.05
inclination_deg = 90.0

[[nodes]]
ut_s = 400.0
delta_v_m_s = [0.0, 0.0, 10.0]
"#,
    )
    .expect("write scenario");

    let scenarios = scenario::load(dir.path()).expect("toml directory");
    assert_eq!(scenarios.len(), 1);
    let polar = &scenarios[0];
    assert_eq!(polar.model.now(), 50.0);
    assert!(polar.model.body().soi_radius.is_infinite());
    assert!((polar.model.nodes()[0].ut - 400.0).abs() < 1e-12);
}

#[test]
fn invalid_orbits_and_missing_names_are_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("bad.yaml");
    fs::write(
        &path,
        "- name: bad\n  body: { name: Kerbin, mu_m3_s2: 3.5316e12, radius_m: 600000 }\n  orbit: { semi_major_axis_m: 700000, eccentricity: 1.4 }\n",
    )
    .expect("write scenario");
    assert!(matches!(scenario::load(&path), Err(ScenarioError::Config(_))));

    assert!(matches!(
        scenario::load_named(SCENARIOS, Some("duna")),
        Err(ScenarioError::NotFound(name)) if name == "duna"
    ));
}
