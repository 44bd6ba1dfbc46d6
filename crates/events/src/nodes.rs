//! Equatorial and relative node crossings.

use std::f64::consts::{PI, TAU};

use maneuver_core::units::wrap_two_pi;
use maneuver_core::vector;
use maneuver_orbits::Patch;

use crate::EventTime;
use crate::target::Target;

/// Inclinations (degrees) closer than this to the reference plane have no usable node line.
const EQUATORIAL_EPSILON_DEG: f64 = 0.001;

/// UT at which the patch reaches `true_anomaly`, wrapped forward one period if already passed, and
/// valid only inside the patch bounds.
fn crossing(patch: &Patch, true_anomaly: f64) -> EventTime {
    let mut dt = patch.conic.dt_for_true_anomaly(true_anomaly, patch.start_ut);
    if dt < 0.0 {
        dt += patch.period();
    }
    let ut = patch.start_ut + dt;
    EventTime::when(patch.contains(ut), ut)
}

/// Crossing of the body's equatorial plane (`ascending` going north).
pub fn equatorial_node(patch: &Patch, ascending: bool) -> EventTime {
    let inclination = patch.inclination_deg().abs();
    if inclination < EQUATORIAL_EPSILON_DEG || (180.0 - inclination).abs() < EQUATORIAL_EPSILON_DEG {
        return EventTime::INVALID;
    }
    let base = if ascending { TAU } else { PI };
    crossing(patch, wrap_two_pi(base - patch.conic.arg_periapsis))
}

/// Crossing of the target's orbital plane.
pub fn relative_node(patch: &Patch, target: &Target, ascending: bool) -> EventTime {
    if patch.body.id != target.body {
        return EventTime::INVALID;
    }
    let reference = patch.conic.normal();
    let other = target.conic.normal();
    let line = if ascending {
        vector::cross(&other, &reference)
    } else {
        vector::cross(&reference, &other)
    };
    match vector::normalize(&line) {
        Some(direction) => crossing(patch, patch.conic.true_anomaly_of_direction(&direction)),
        None => EventTime::INVALID,
    }
}
