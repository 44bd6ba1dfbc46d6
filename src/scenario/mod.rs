use std::path::Path;

use maneuver_config::{CalendarChoice, ConfigError, OrbitConfig, ScenarioConfig, TargetConfig, load_scenarios};
use maneuver_core::time::Calendar;
use maneuver_events::Target;
use maneuver_orbits::{Body, BodyId, Conic, ModelError, PatchedConicModel};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to place maneuver node: {0}")]
    Model(#[from] ModelError),
    #[error("no scenario named {0:?}")]
    NotFound(String),
}

/// A scenario record turned into a live model.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub model: PatchedConicModel,
    pub target: Option<Target>,
    pub calendar: Calendar,
}

impl Scenario {
    pub fn from_config(config: &ScenarioConfig) -> Result<Self, ScenarioError> {
        config.validate()?;
        let body = Body {
            id: BodyId(config.body.id),
            name: config.body.name.clone(),
            mu: config.body.mu_m3_s2,
            radius: config.body.radius_m,
            soi_radius: config.body.soi_radius_m.unwrap_or(f64::INFINITY),
        };

        let initial = conic(&config.orbit, body.mu);
        let target = config.target.as_ref().map(|t| target(t, &body));
        let mut model = PatchedConicModel::new(body, initial, config.orbit.epoch_s);
        model.set_now(config.now());
        for node in &config.nodes {
            model.add_node(node.ut_s, node.delta_v_m_s)?;
        }
        debug!(scenario = %config.name, nodes = config.nodes.len(), "scenario built");

        Ok(Self {
            name: config.name.clone(),
            model,
            target,
            calendar: match config.calendar {
                CalendarChoice::Kerbin => Calendar::KERBIN,
                CalendarChoice::Earth => Calendar::EARTH,
            },
        })
    }
}

/// Load every scenario from a YAML/TOML file or a directory of records.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<Scenario>, ScenarioError> {
    load_scenarios(path)?.iter().map(Scenario::from_config).collect()
}

/// Load one scenario by name, or the first one when `name` is `None`.
pub fn load_named<P: AsRef<Path>>(path: P, name: Option<&str>) -> Result<Scenario, ScenarioError> {
    let configs = load_scenarios(path)?;
    let config = match name {
        Some(name) => configs
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| ScenarioError::NotFound(name.to_string()))?,
        None => configs
            .first()
            .ok_or_else(|| ScenarioError::NotFound("<first>".to_string()))?,
    };
    Scenario::from_config(config)
}

fn conic(orbit: &OrbitConfig, mu: f64) -> Conic {
    Conic::from_degrees(
        mu,
        orbit.semi_major_axis_m,
        orbit.eccentricity,
        orbit.inclination_deg,
        orbit.lan_deg,
        orbit.arg_periapsis_deg,
        orbit.mean_anomaly_deg,
        orbit.epoch_s,
    )
}

fn target(config: &TargetConfig, body: &Body) -> Target {
    let orbits = config.body_id().map_or(body.id, BodyId);
    let conic = conic(config.orbit(), body.mu);
    match config {
        TargetConfig::Vessel { name, .. } => Target::vessel(name.clone(), orbits, conic),
        TargetConfig::Body { name, .. } => Target::body(name.clone(), orbits, conic),
    }
}
