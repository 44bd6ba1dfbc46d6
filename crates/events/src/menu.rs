//! Snap suggestions for a point clicked on the trajectory.

use std::f64::consts::PI;

use maneuver_core::units::{deg_to_rad, wrap_two_pi};
use maneuver_orbits::{FlightPlan, Patch};

use crate::approach::{ApproachWindow, closest_approach};
use crate::apsis::{apoapsis, periapsis};
use crate::nodes::{equatorial_node, relative_node};
use crate::target::Target;
use crate::{EventKind, EventTime};

/// Extra half-width (degrees) of the window used for equatorial nodes.
const WIDE_EXTRA_DEG: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Suggestion {
    pub kind: EventKind,
    pub ut: f64,
}

/// UT windows around the clicked point, spanning `±tolerance` and `±(tolerance + 5°)` of true anomaly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SuggestionWindows {
    pub narrow: ApproachWindow,
    pub wide: ApproachWindow,
}

impl SuggestionWindows {
    pub fn around(patch: &Patch, clicked_ut: f64, tolerance_deg: f64) -> Self {
        let nu = patch.conic.true_anomaly_at(clicked_ut);
        let window = |half_width_deg: f64| {
            let half_width = deg_to_rad(half_width_deg);
            ApproachWindow::new(
                offset_ut(patch, clicked_ut, nu, -half_width),
                offset_ut(patch, clicked_ut, nu, half_width),
            )
        };
        Self {
            narrow: window(tolerance_deg),
            wide: window(tolerance_deg + WIDE_EXTRA_DEG),
        }
    }
}

/// UT at which the patch is `delta` radians of true anomaly away from `nu` (reached at `ut`).
fn offset_ut(patch: &Patch, ut: f64, nu: f64, delta: f64) -> f64 {
    let conic = &patch.conic;
    if conic.is_closed() && delta.abs() >= PI {
        return ut + 0.5 * patch.period().copysign(delta);
    }
    let from = conic.mean_anomaly_for_true_anomaly(nu);
    let to = conic.mean_anomaly_for_true_anomaly(nu + delta);
    let mean_step = match (conic.is_closed(), delta >= 0.0) {
        (true, true) => wrap_two_pi(to - from),
        (true, false) => -wrap_two_pi(from - to),
        (false, _) => to - from,
    };
    let shifted = ut + mean_step / conic.mean_motion();
    if shifted.is_finite() {
        shifted
    } else if delta < 0.0 {
        patch.start_ut
    } else {
        patch.upper_bound()
    }
}

/// Move an event on a closed terminal orbit forward by whole periods until it reaches `min_ut`.
fn align(patch: &Patch, ut: f64, min_ut: f64) -> f64 {
    if !patch.is_closed() || !patch.is_terminus() || ut >= min_ut {
        return ut;
    }
    let period = patch.period();
    ut + ((min_ut - ut) / period).ceil() * period
}

/// Events worth offering near `clicked_ut`, ordered by time.
pub fn suggest(
    plan: &FlightPlan,
    clicked_ut: f64,
    tolerance_deg: f64,
    target: Option<&Target>,
) -> Vec<Suggestion> {
    let Some(cursor) = plan.reference_patch(clicked_ut) else {
        return Vec::new();
    };
    let patch = cursor.patch();
    let windows = SuggestionWindows::around(patch, clicked_ut, tolerance_deg);
    let mut suggestions = Vec::new();

    let mut offer = |kind: EventKind, event: EventTime, window: ApproachWindow| {
        let Some(ut) = event.value() else { return };
        let ut = align(patch, ut, window.min_ut);
        if window.contains(ut) && (patch.is_terminus() || patch.contains(ut)) {
            suggestions.push(Suggestion { kind, ut });
        }
    };

    offer(EventKind::Apoapsis, apoapsis(patch), windows.narrow);
    offer(EventKind::Periapsis, periapsis(patch), windows.narrow);
    offer(EventKind::EquatorialAscending, equatorial_node(patch, true), windows.wide);
    offer(EventKind::EquatorialDescending, equatorial_node(patch, false), windows.wide);

    if let Some(target) = target {
        offer(EventKind::RelativeAscending, relative_node(patch, target, true), windows.narrow);
        offer(EventKind::RelativeDescending, relative_node(patch, target, false), windows.narrow);

        let shift = if patch.is_closed() && patch.is_terminus() {
            ((windows.narrow.min_ut - patch.start_ut) / patch.period()).floor().max(0.0) * patch.period()
        } else {
            0.0
        };
        let first_revolution = ApproachWindow::new(windows.narrow.min_ut - shift, windows.narrow.max_ut - shift);
        if let Some(ut) = closest_approach(patch, target, false, Some(first_revolution)) {
            offer(EventKind::ClosestApproach, EventTime::at(ut + shift), windows.narrow);
        }
    }

    suggestions.sort_by(|a, b| a.ut.total_cmp(&b.ut));
    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use maneuver_orbits::{Body, BodyId, Conic};

    #[test]
    fn clicking_near_apoapsis_offers_it() {
        let body = Body {
            id: BodyId(1),
            name: "Kerbin".into(),
            mu: 3.5316e12,
            radius: 600_000.0,
            soi_radius: 84_159_286.0,
        };
        let conic = Conic::from_degrees(body.mu, 1_000_000.0, 0.2, 10.0, 0.0, 0.0, 0.0, 0.0);
        let mut plan = FlightPlan::new();
        plan.push(Patch::new(conic, body, 0.0));
        let period = conic.period();

        let near_apo = suggest(&plan, 0.51 * period, 10.0, None);
        assert!(near_apo.iter().any(|s| s.kind == EventKind::Apoapsis));
        assert!(!near_apo.iter().any(|s| s.kind == EventKind::Periapsis));

        let second_lap = suggest(&plan, 1.49 * period, 10.0, None);
        let apo = second_lap.iter().find(|s| s.kind == EventKind::Apoapsis).expect("apoapsis");
        assert!((apo.ut - 1.5 * period).abs() < 1e-3 * period);
    }
}
