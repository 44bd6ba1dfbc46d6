//! Configuration models and loaders for the maneuver planner.

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod scenario;

pub use scenario::{
    BodyConfig, CalendarChoice, NodeConfig, OrbitConfig, ScenarioConfig, TargetConfig,
};

/// Errors that can occur while loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("no records found in {0}")]
    Empty(PathBuf),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Step-chunking accuracy of drag and button input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccuracyPreset {
    Low,
    Normal,
    #[default]
    High,
}

impl AccuracyPreset {
    /// Largest single DeltaV slice (m/s) applied before frames are recomputed.
    pub fn threshold(self) -> f64 {
        match self {
            AccuracyPreset::Low => 4.0,
            AccuracyPreset::Normal => 2.0,
            AccuracyPreset::High => 1.0,
        }
    }
}

/// Default input shaping copied onto every new gizmo.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GizmoDefaults {
    pub sensitivity: f64,
    pub multiplier: f64,
}

impl Default for GizmoDefaults {
    fn default() -> Self {
        Self {
            sensitivity: 1.0,
            multiplier: 1.0,
        }
    }
}

/// Re-solve guard for the snap panel.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DebounceConfig {
    /// DeltaV magnitude drift (m/s) that forces a full re-solve of event times.
    pub dv_drift_m_s: f64,
    /// Minimum interval (s) between countdown refreshes.
    pub refresh_interval_s: f64,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            dv_drift_m_s: 10.0,
            refresh_interval_s: 0.5,
        }
    }
}

/// Editor behaviour settings. Every field has a default, so partial files are accepted.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub accuracy: AccuracyPreset,
    /// Explicit chunk threshold (m/s) overriding the preset.
    pub accuracy_threshold: Option<f64>,
    /// Route vector-input steps through the orbit-aligned accumulator.
    pub align_to_orbit: bool,
    /// Spawn the snap and input panels alongside the gizmo.
    pub replace_gizmo_buttons: bool,
    pub show_maneuver_cycle: bool,
    /// Carry manual shift and input increments over to newly opened panels.
    pub remember_manual_input: bool,
    pub use_keyboard: bool,
    pub keyboard_shortcut: String,
    /// Half-width (degrees of true anomaly) of the context-suggestion window.
    pub selection_tolerance_deg: f64,
    pub gizmo: GizmoDefaults,
    pub debounce: DebounceConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            accuracy: AccuracyPreset::default(),
            accuracy_threshold: None,
            align_to_orbit: true,
            replace_gizmo_buttons: true,
            show_maneuver_cycle: true,
            remember_manual_input: true,
            use_keyboard: true,
            keyboard_shortcut: "n".to_string(),
            selection_tolerance_deg: 10.0,
            gizmo: GizmoDefaults::default(),
            debounce: DebounceConfig::default(),
        }
    }
}

impl Settings {
    /// Chunk threshold in effect (override, else preset).
    pub fn threshold(&self) -> f64 {
        self.accuracy_threshold
            .unwrap_or_else(|| self.accuracy.threshold())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |name: &str, value: f64| {
            if value > 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(ConfigError::Invalid(format!("{name} must be positive, got {value}")))
            }
        };
        positive("accuracy_threshold", self.threshold())?;
        positive("gizmo.sensitivity", self.gizmo.sensitivity)?;
        positive("gizmo.multiplier", self.gizmo.multiplier)?;
        positive("debounce.refresh_interval_s", self.debounce.refresh_interval_s)?;
        if self.debounce.dv_drift_m_s < 0.0 {
            return Err(ConfigError::Invalid("debounce.dv_drift_m_s must not be negative".into()));
        }
        if !(0.0..=180.0).contains(&self.selection_tolerance_deg) {
            return Err(ConfigError::Invalid(format!(
                "selection_tolerance_deg must lie in [0, 180], got {}",
                self.selection_tolerance_deg
            )));
        }
        Ok(())
    }
}

/// Load editor settings from a YAML or TOML file.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings, ConfigError> {
    let settings: Settings = load_record(path)?;
    settings.validate()?;
    Ok(settings)
}

/// Load scenario records from a YAML list, a single TOML file, or a directory of TOML files.
pub fn load_scenarios<P: AsRef<Path>>(path: P) -> Result<Vec<ScenarioConfig>, ConfigError> {
    let scenarios: Vec<ScenarioConfig> = load_records(path)?;
    for scenario in &scenarios {
        scenario.validate()?;
    }
    Ok(scenarios)
}

/// Load the first scenario found at `path`.
pub fn load_scenario<P: AsRef<Path>>(path: P) -> Result<ScenarioConfig, ConfigError> {
    let path = path.as_ref();
    load_scenarios(path)?
        .into_iter()
        .next()
        .ok_or_else(|| ConfigError::Empty(path.to_path_buf()))
}

fn is_toml(path: &Path) -> bool {
    path.extension().map(|ext| ext == "toml").unwrap_or(false)
}

fn load_record<T, P>(path: P) -> Result<T, ConfigError>
where
    T: for<'de> Deserialize<'de>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if is_toml(path) {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    } else {
        let reader = File::open(path)?;
        Ok(serde_yaml::from_reader(reader)?)
    }
}

fn load_records<T, P>(path: P) -> Result<Vec<T>, ConfigError>
where
    T: for<'de> Deserialize<'de>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if path.is_dir() {
        read_dir_records(path)
    } else if is_toml(path) {
        Ok(vec![load_record(path)?])
    } else {
        let reader = File::open(path)?;
        Ok(serde_yaml::from_reader(reader)?)
    }
}

fn read_dir_records<T>(dir: &Path) -> Result<Vec<T>, ConfigError>
where
    T: for<'de> Deserialize<'de>,
{
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| is_toml(path))
        .collect();
    entries.sort();
    entries.iter().map(load_record::<T, &PathBuf>).collect()
}
