//! Closest approach between a reference patch and a target orbit.

use std::f64::consts::{PI, TAU};

use maneuver_core::units::wrap_pi;
use maneuver_core::vector::{self, Vector3};
use maneuver_orbits::{Conic, Patch};
use tracing::debug;

use crate::target::Target;

/// Slack (m) allowed when comparing apsis envelopes.
const ENVELOPE_MARGIN_M: f64 = 20_000.0;
/// Convergence tolerance on both true anomalies (rad).
const ANOMALY_TOLERANCE: f64 = 1e-3;
const MAX_ITERATIONS: usize = 10;
/// Largest change of either anomaly in one iteration (rad).
const MAX_STEP: f64 = 0.5;
/// Below this sine of the relative inclination the node line is meaningless.
const COPLANAR_SINE: f64 = 1e-3;
/// Reference anomalies sampled when seeding coplanar orbits; the target gets twice as many.
const COARSE_SAMPLES: usize = 36;

/// Inclusive UT window a caller is interested in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApproachWindow {
    pub min_ut: f64,
    pub max_ut: f64,
}

impl ApproachWindow {
    pub fn new(min_ut: f64, max_ut: f64) -> Self {
        Self { min_ut, max_ut }
    }

    pub fn contains(&self, ut: f64) -> bool {
        ut >= self.min_ut && ut <= self.max_ut
    }
}

/// Whether the radial ranges `[periapsis, apoapsis]` of both orbits overlap (within a margin).
pub fn envelopes_overlap(reference: &Conic, target: &Conic) -> bool {
    reference.periapsis_radius() <= target.apoapsis_radius() + ENVELOPE_MARGIN_M
        && target.periapsis_radius() <= reference.apoapsis_radius() + ENVELOPE_MARGIN_M
}

/// Up to two `(reference, target)` true-anomaly pairs that locally minimise the distance between the
/// two orbit curves.
///
/// Inclined orbits are seeded on both ends of the mutual node line, coplanar ones at the best local
/// minima of a coarse sampling. Each seed is refined by damped Gauss-Newton steps on the pair.
pub fn critical_anomalies(reference: &Conic, target: &Conic) -> Vec<(f64, f64)> {
    let line = vector::cross(&target.normal(), &reference.normal());
    let seeds = match vector::normalize(&line) {
        Some(direction) if vector::norm(&line) > COPLANAR_SINE => {
            let opposite = vector::scale(&direction, -1.0);
            vec![
                (reference.true_anomaly_of_direction(&direction), target.true_anomaly_of_direction(&direction)),
                (reference.true_anomaly_of_direction(&opposite), target.true_anomaly_of_direction(&opposite)),
            ]
        }
        _ => coplanar_seeds(reference, target),
    };
    seeds
        .into_iter()
        .map(|seed| refine(reference, target, seed))
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .collect()
}

fn refine(reference: &Conic, target: &Conic, seed: (f64, f64)) -> (f64, f64) {
    let (mut a, mut b) = (clamp_anomaly(reference, seed.0), clamp_anomaly(target, seed.1));
    let mut gap = vector::sub(&reference.position_at_true_anomaly(a), &target.position_at_true_anomaly(b));
    let mut cost = vector::dot(&gap, &gap);

    for iteration in 0..MAX_ITERATIONS {
        let ta = tangent(reference, a);
        let tb = vector::scale(&tangent(target, b), -1.0);
        let (aa, ab, bb) = (vector::dot(&ta, &ta), vector::dot(&ta, &tb), vector::dot(&tb, &tb));
        let damping = 1e-9 * (aa + bb);
        let (m00, m11) = (aa + damping, bb + damping);
        let det = m00 * m11 - ab * ab;
        if !(det.is_finite() && det > 0.0) {
            break;
        }
        let (ga, gb) = (vector::dot(&ta, &gap), vector::dot(&tb, &gap));
        let mut step_a = ((-ga * m11 + gb * ab) / det).clamp(-MAX_STEP, MAX_STEP);
        let mut step_b = ((-gb * m00 + ga * ab) / det).clamp(-MAX_STEP, MAX_STEP);

        let mut accepted = false;
        for _ in 0..4 {
            let (na, nb) = (clamp_anomaly(reference, a + step_a), clamp_anomaly(target, b + step_b));
            let trial = vector::sub(&reference.position_at_true_anomaly(na), &target.position_at_true_anomaly(nb));
            let trial_cost = vector::dot(&trial, &trial);
            if trial_cost <= cost {
                (a, b, gap, cost) = (na, nb, trial, trial_cost);
                accepted = true;
                break;
            }
            step_a *= 0.5;
            step_b *= 0.5;
        }
        if !accepted || step_a.abs().max(step_b.abs()) < ANOMALY_TOLERANCE {
            debug!(iteration, reference = a, target = b, distance = cost.sqrt(), "closest-approach pair converged");
            break;
        }
    }
    (a, b)
}

/// Derivative of position with respect to true anomaly.
fn tangent(conic: &Conic, true_anomaly: f64) -> Vector3 {
    let r = conic.radius_at_true_anomaly(true_anomaly);
    let h = (conic.mu * conic.semi_latus_rectum()).sqrt();
    vector::scale(&conic.velocity_at_true_anomaly(true_anomaly), r * r / h)
}

/// Largest usable |true anomaly| on an open conic, just inside the asymptote.
fn asymptote_limit(conic: &Conic) -> f64 {
    (-1.0 / conic.eccentricity).clamp(-1.0, 1.0).acos() - ANOMALY_TOLERANCE
}

fn clamp_anomaly(conic: &Conic, true_anomaly: f64) -> f64 {
    let wrapped = wrap_pi(true_anomaly);
    if conic.is_closed() {
        wrapped
    } else {
        let limit = asymptote_limit(conic);
        wrapped.clamp(-limit, limit)
    }
}

fn anomaly_samples(conic: &Conic, count: usize) -> Vec<f64> {
    let n = count as f64;
    if conic.is_closed() {
        (0..count).map(|i| TAU * i as f64 / n - PI).collect()
    } else {
        let limit = asymptote_limit(conic);
        (0..count).map(|i| limit * (2.0 * (i as f64 + 0.5) / n - 1.0)).collect()
    }
}

/// Seeds for orbits sharing a plane: the two best local minima of the sampled curve distance.
fn coplanar_seeds(reference: &Conic, target: &Conic) -> Vec<(f64, f64)> {
    let target_points: Vec<(f64, Vector3)> = anomaly_samples(target, 2 * COARSE_SAMPLES)
        .into_iter()
        .map(|nu| (nu, target.position_at_true_anomaly(nu)))
        .collect();
    let ring: Vec<(f64, f64, f64)> = anomaly_samples(reference, COARSE_SAMPLES)
        .into_iter()
        .map(|nu| {
            let point = reference.position_at_true_anomaly(nu);
            let (nearest, distance) = target_points
                .iter()
                .map(|(other, position)| (*other, vector::distance(&point, position)))
                .min_by(|x, y| x.1.total_cmp(&y.1))
                .unwrap_or((0.0, f64::INFINITY));
            (nu, nearest, distance)
        })
        .collect();

    let n = ring.len();
    let wraps = reference.is_closed();
    let neighbour = |i: usize, forward: bool| -> Option<f64> {
        let j = match (forward, i) {
            (true, i) if i + 1 < n => i + 1,
            (true, _) if wraps => 0,
            (false, 0) if wraps => n.checked_sub(1)?,
            (false, i) if i > 0 => i - 1,
            _ => return None,
        };
        Some(ring[j].2)
    };
    let mut minima: Vec<(f64, f64, f64)> = (0..n)
        .filter(|&i| {
            let d = ring[i].2;
            neighbour(i, false).is_none_or(|p| d <= p) && neighbour(i, true).is_none_or(|q| d <= q)
        })
        .map(|i| ring[i])
        .collect();
    minima.sort_by(|x, y| x.2.total_cmp(&y.2));
    minima.truncate(2);
    minima.into_iter().map(|(a, b, _)| (a, b)).collect()
}

/// UT of the closest approach to `target` on `patch`, or `None`.
///
/// Candidates outside the patch bounds are discarded. With `prefer_closest` the candidate with the
/// smaller physical separation wins. Otherwise the closer candidate inside `window` wins, falling back to
/// the other one if only it lies inside; without a window this is the same as `prefer_closest`.
pub fn closest_approach(
    patch: &Patch,
    target: &Target,
    prefer_closest: bool,
    window: Option<ApproachWindow>,
) -> Option<f64> {
    if patch.body.id != target.body || !envelopes_overlap(&patch.conic, &target.conic) {
        return None;
    }

    let mut survivors: Vec<(f64, f64)> = critical_anomalies(&patch.conic, &target.conic)
        .into_iter()
        .map(|(nu, _)| patch.conic.ut_for_true_anomaly(nu, patch.start_ut))
        .filter(|ut| ut.is_finite() && patch.contains(*ut))
        .map(|ut| (ut, separation(patch, target, ut)))
        .collect();
    survivors.sort_by(|a, b| a.1.total_cmp(&b.1));
    debug!(candidates = survivors.len(), target = %target.name, "closest approach candidates");

    match window {
        Some(window) if !prefer_closest => survivors
            .iter()
            .find(|(ut, _)| window.contains(*ut))
            .map(|(ut, _)| *ut),
        _ => survivors.first().map(|(ut, _)| *ut),
    }
}

/// Physical distance between the vessel on `patch` and the target at `ut`.
pub fn separation(patch: &Patch, target: &Target, ut: f64) -> f64 {
    vector::distance(&patch.conic.position_at(ut), &target.conic.position_at(ut))
}

#[cfg(test)]
mod tests {
    use super::*;
    use maneuver_orbits::{Body, BodyId};

    fn body() -> Body {
        Body {
            id: BodyId(1),
            name: "Kerbin".into(),
            mu: 3.5316e12,
            radius: 600_000.0,
            soi_radius: 84_159_286.0,
        }
    }

    #[test]
    fn disjoint_envelopes_have_no_approach() {
        let body = body();
        let low = Conic::from_degrees(body.mu, 700_000.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        let high = Conic::from_degrees(body.mu, 3_000_000.0, 0.1, 0.0, 0.0, 0.0, 0.0, 0.0);
        let patch = Patch::new(low, body.clone(), 0.0);
        let target = Target::vessel("high", body.id, high);
        assert_eq!(closest_approach(&patch, &target, true, None), None);
    }

    #[test]
    fn other_body_targets_are_rejected() {
        let body = body();
        let orbit = Conic::from_degrees(body.mu, 700_000.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        let patch = Patch::new(orbit, body, 0.0);
        let target = Target::body("Mun", BodyId(2), orbit);
        assert_eq!(closest_approach(&patch, &target, true, None), None);
    }

    #[test]
    fn inclined_circles_meet_on_the_node_line() {
        let body = body();
        let reference = Conic::from_degrees(body.mu, 700_000.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        let other = Conic::from_degrees(body.mu, 705_000.0, 0.0, 45.0, 0.0, 0.0, 90.0, 0.0);
        let patch = Patch::new(reference, body.clone(), 0.0);
        let target = Target::vessel("station", body.id, other);

        let ut = closest_approach(&patch, &target, true, None).expect("approach");
        let position = patch.conic.position_at(ut);
        assert!(position[1].abs() < 2_000.0, "approach off the node line: y = {}", position[1]);

        let period = patch.period();
        let around_half = ApproachWindow::new(0.4 * period, 0.6 * period);
        let windowed = closest_approach(&patch, &target, false, Some(around_half)).expect("windowed");
        assert!((windowed - 0.5 * period).abs() < 0.01 * period, "windowed approach at {windowed}");
        let empty = ApproachWindow::new(0.1 * period, 0.2 * period);
        assert_eq!(closest_approach(&patch, &target, false, Some(empty)), None);
    }

    #[test]
    fn coplanar_crossing_orbits_meet_where_they_intersect() {
        let body = body();
        let circle = Conic::from_degrees(body.mu, 1_000_000.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        let ellipse = Conic::from_degrees(body.mu, 1_000_000.0, 0.2, 0.0, 0.0, 0.0, 0.0, 0.0);
        let patch = Patch::new(circle, body.clone(), 0.0);
        let target = Target::vessel("crossing", body.id, ellipse);

        let pairs = critical_anomalies(&circle, &ellipse);
        assert_eq!(pairs.len(), 2);
        for (a, b) in &pairs {
            let gap = vector::distance(&circle.position_at_true_anomaly(*a), &ellipse.position_at_true_anomaly(*b));
            assert!(gap < 500.0, "pair ({a}, {b}) still {gap} m apart");
            // r = a on the ellipse where cos(nu) = -e
            assert!((a.cos() + 0.2).abs() < 2e-3, "crossing at nu = {a}");
        }

        let ut = closest_approach(&patch, &target, true, None).expect("approach");
        let point = patch.conic.position_at(ut);
        let on_target = ellipse.radius_at_true_anomaly(ellipse.true_anomaly_of_direction(&point));
        assert!((vector::norm(&point) - on_target).abs() < 500.0, "approach point off the target orbit");
    }

    #[test]
    fn eccentric_inclined_pairs_are_local_minima() {
        let body = body();
        let reference = Conic::from_degrees(body.mu, 1_000_000.0, 0.3, 0.0, 0.0, 0.0, 0.0, 0.0);
        let target = Conic::from_degrees(body.mu, 1_050_000.0, 0.1, 20.0, 30.0, 50.0, 0.0, 0.0);
        let distance = |a: f64, b: f64| {
            vector::distance(&reference.position_at_true_anomaly(a), &target.position_at_true_anomaly(b))
        };

        let pairs = critical_anomalies(&reference, &target);
        assert_eq!(pairs.len(), 2);
        for (a, b) in pairs {
            let found = distance(a, b);
            for da in [-0.01, 0.0, 0.01] {
                for db in [-0.01, 0.0, 0.01] {
                    let nearby = distance(a + da, b + db);
                    assert!(nearby >= found - 25.0, "({a}, {b}) at {found} m, neighbour at {nearby} m");
                }
            }
        }
    }

    #[test]
    fn without_a_window_the_nearest_candidate_wins() {
        let body = body();
        let reference = Conic::from_degrees(body.mu, 700_000.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        let other = Conic::from_degrees(body.mu, 705_000.0, 0.05, 45.0, 0.0, 0.0, 90.0, 0.0);
        let patch = Patch::new(reference, body.clone(), 0.0);
        let target = Target::vessel("station", body.id, other);
        assert_eq!(
            closest_approach(&patch, &target, false, None),
            closest_approach(&patch, &target, true, None)
        );
    }
}
