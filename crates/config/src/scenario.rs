//! Scenario records: a body, a vessel orbit, planned nodes, and an optional target.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Central body of the scenario.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BodyConfig {
    pub name: String,
    #[serde(default)]
    pub id: u32,
    pub mu_m3_s2: f64,
    pub radius_m: f64,
    /// Sphere-of-influence radius; omitted for an unbounded root body.
    #[serde(default)]
    pub soi_radius_m: Option<f64>,
}

/// Keplerian elements in metres and degrees.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OrbitConfig {
    pub semi_major_axis_m: f64,
    pub eccentricity: f64,
    #[serde(default)]
    pub inclination_deg: f64,
    #[serde(default)]
    pub lan_deg: f64,
    #[serde(default)]
    pub arg_periapsis_deg: f64,
    #[serde(default)]
    pub mean_anomaly_deg: f64,
    #[serde(default)]
    pub epoch_s: f64,
}

impl OrbitConfig {
    fn validate(&self, what: &str) -> Result<(), ConfigError> {
        let e = self.eccentricity;
        if !(e >= 0.0) || (e - 1.0).abs() < 1e-9 {
            return Err(ConfigError::Invalid(format!(
                "{what}: eccentricity must be non-negative and not parabolic, got {e}"
            )));
        }
        let a = self.semi_major_axis_m;
        let consistent = if e < 1.0 { a > 0.0 } else { a < 0.0 };
        if !consistent || !a.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "{what}: semi-major axis {a} does not match eccentricity {e}"
            )));
        }
        Ok(())
    }
}

/// A planned maneuver: UT plus DeltaV as `[radial, normal, prograde]` (m/s).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NodeConfig {
    pub ut_s: f64,
    #[serde(default)]
    pub delta_v_m_s: [f64; 3],
}

/// Target used for relative nodes and closest approach.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TargetConfig {
    Vessel {
        name: String,
        orbit: OrbitConfig,
        /// Body the target orbits; defaults to the scenario body.
        #[serde(default)]
        body_id: Option<u32>,
    },
    Body {
        name: String,
        orbit: OrbitConfig,
        #[serde(default)]
        body_id: Option<u32>,
    },
}

impl TargetConfig {
    pub fn name(&self) -> &str {
        match self {
            TargetConfig::Vessel { name, .. } | TargetConfig::Body { name, .. } => name,
        }
    }

    pub fn orbit(&self) -> &OrbitConfig {
        match self {
            TargetConfig::Vessel { orbit, .. } | TargetConfig::Body { orbit, .. } => orbit,
        }
    }

    pub fn body_id(&self) -> Option<u32> {
        match self {
            TargetConfig::Vessel { body_id, .. } | TargetConfig::Body { body_id, .. } => *body_id,
        }
    }
}

/// Calendar used when printing countdowns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CalendarChoice {
    #[default]
    Kerbin,
    Earth,
}

/// One planning scenario.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScenarioConfig {
    pub name: String,
    pub body: BodyConfig,
    pub orbit: OrbitConfig,
    /// Current UT; defaults to the orbit epoch.
    #[serde(default)]
    pub now_s: Option<f64>,
    #[serde(default)]
    pub nodes: Vec<NodeConfig>,
    #[serde(default)]
    pub target: Option<TargetConfig>,
    #[serde(default)]
    pub calendar: CalendarChoice,
}

impl ScenarioConfig {
    pub fn now(&self) -> f64 {
        self.now_s.unwrap_or(self.orbit.epoch_s)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.body.mu_m3_s2 > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "{}: body mu must be positive",
                self.name
            )));
        }
        if let Some(soi) = self.body.soi_radius_m {
            if !(soi > self.body.radius_m) {
                return Err(ConfigError::Invalid(format!(
                    "{}: SOI radius must exceed the body radius",
                    self.name
                )));
            }
        }
        self.orbit.validate(&self.name)?;
        if let Some(target) = &self.target {
            target.orbit().validate(target.name())?;
        }
        if let Some(node) = self.nodes.iter().find(|n| !n.ut_s.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "{}: node time {} is not finite",
                self.name, node.ut_s
            )));
        }
        Ok(())
    }
}
