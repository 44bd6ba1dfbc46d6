//! Conic patches, transitions, and reference bodies.

use std::fmt;

use maneuver_core::units::rad_to_deg;

use crate::conic::Conic;
use crate::plan::PatchId;

/// Stable identifier of a celestial body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub u32);

/// Central body of a patch.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub id: BodyId,
    pub name: String,
    /// Gravitational parameter (m^3/s^2).
    pub mu: f64,
    /// Mean radius (m).
    pub radius: f64,
    /// Sphere-of-influence radius (m); infinite for the root body.
    pub soi_radius: f64,
}

/// How a patch starts or ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    Initial,
    Maneuver,
    Encounter,
    Escape,
    Impact,
    Final,
}

impl Transition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transition::Initial => "INITIAL",
            Transition::Maneuver => "MANEUVER",
            Transition::Encounter => "ENCOUNTER",
            Transition::Escape => "ESCAPE",
            Transition::Impact => "IMPACT",
            Transition::Final => "FINAL",
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One conic segment of a flight plan.
///
/// `time_to_apoapsis` / `time_to_periapsis` are measured from `start_ut`. `soi_exit_ut`, when present,
/// bounds every event time derived from the patch.
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    pub conic: Conic,
    pub body: Body,
    pub start_ut: f64,
    pub end_ut: f64,
    pub soi_exit_ut: Option<f64>,
    pub start_transition: Transition,
    pub end_transition: Transition,
    pub time_to_apoapsis: f64,
    pub time_to_periapsis: f64,
    pub previous: Option<PatchId>,
    pub next: Option<PatchId>,
}

impl Patch {
    /// Unlinked INITIAL→FINAL patch starting at `start_ut`, with apsis timing and SOI exit derived from
    /// the conic.
    pub fn new(conic: Conic, body: Body, start_ut: f64) -> Self {
        let soi_exit_ut = soi_exit_ut(&conic, body.soi_radius, start_ut);
        let end_ut = match soi_exit_ut {
            Some(exit) => exit,
            None if conic.is_closed() => start_ut + conic.period(),
            None => f64::INFINITY,
        };
        Self {
            time_to_apoapsis: conic.time_to_apoapsis(start_ut),
            time_to_periapsis: conic.time_to_periapsis(start_ut),
            conic,
            body,
            start_ut,
            end_ut,
            soi_exit_ut,
            start_transition: Transition::Initial,
            end_transition: Transition::Final,
            previous: None,
            next: None,
        }
    }

    pub fn with_transitions(mut self, start: Transition, end: Transition) -> Self {
        self.start_transition = start;
        self.end_transition = end;
        self
    }

    pub fn eccentricity(&self) -> f64 {
        self.conic.eccentricity
    }

    pub fn period(&self) -> f64 {
        self.conic.period()
    }

    pub fn apoapsis_radius(&self) -> f64 {
        self.conic.apoapsis_radius()
    }

    pub fn periapsis_radius(&self) -> f64 {
        self.conic.periapsis_radius()
    }

    pub fn inclination_deg(&self) -> f64 {
        rad_to_deg(self.conic.inclination)
    }

    pub fn arg_periapsis_deg(&self) -> f64 {
        rad_to_deg(self.conic.arg_periapsis)
    }

    /// Closed orbit with a finite period.
    pub fn is_closed(&self) -> bool {
        self.conic.is_closed() && self.period().is_finite()
    }

    pub fn is_terminus(&self) -> bool {
        self.end_transition == Transition::Final
    }

    /// Latest UT an event on this patch may take: SOI exit when bounded, else the patch end.
    pub fn upper_bound(&self) -> f64 {
        self.soi_exit_ut.unwrap_or(self.end_ut)
    }

    pub fn contains(&self, ut: f64) -> bool {
        ut >= self.start_ut && ut <= self.upper_bound()
    }
}

fn soi_exit_ut(conic: &Conic, soi_radius: f64, start_ut: f64) -> Option<f64> {
    if !soi_radius.is_finite() || conic.apoapsis_radius() <= soi_radius {
        return None;
    }
    if conic.periapsis_radius() >= soi_radius {
        return Some(start_ut);
    }
    let cos_nu = (conic.semi_latus_rectum() / soi_radius - 1.0) / conic.eccentricity;
    let exit_anomaly = cos_nu.clamp(-1.0, 1.0).acos();
    let ut = conic.ut_for_true_anomaly(exit_anomaly, start_ut);
    ut.is_finite().then(|| ut.max(start_ut))
}
