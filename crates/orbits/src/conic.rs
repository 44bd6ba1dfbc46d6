//! Two-body conic geometry: Kepler's equation, anomaly conversions, and state vectors.

use std::f64::consts::{PI, TAU};

use maneuver_core::units::{deg_to_rad, wrap_pi, wrap_two_pi};
use maneuver_core::vector::{self, UNIT_X, UNIT_Z, Vector3};

const KEPLER_TOLERANCE: f64 = 1e-12;
const KEPLER_MAX_ITERATIONS: usize = 64;
const CIRCULAR_ECCENTRICITY: f64 = 1e-10;

/// Keplerian conic about a central body (ellipse or hyperbola).
///
/// Angles are radians. The semi-major axis is negative for hyperbolic conics. The mean anomaly is
/// anchored at `epoch` (UT seconds).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conic {
    pub mu: f64,
    pub semi_major_axis: f64,
    pub eccentricity: f64,
    pub inclination: f64,
    pub lan: f64,
    pub arg_periapsis: f64,
    pub mean_anomaly_at_epoch: f64,
    pub epoch: f64,
}

impl Conic {
    /// Build a conic from angles given in degrees (convenience constructor).
    #[allow(clippy::too_many_arguments)]
    pub fn from_degrees(
        mu: f64,
        semi_major_axis: f64,
        eccentricity: f64,
        inclination_deg: f64,
        lan_deg: f64,
        arg_periapsis_deg: f64,
        mean_anomaly_deg: f64,
        epoch: f64,
    ) -> Self {
        Self {
            mu,
            semi_major_axis,
            eccentricity,
            inclination: deg_to_rad(inclination_deg),
            lan: deg_to_rad(lan_deg),
            arg_periapsis: deg_to_rad(arg_periapsis_deg),
            mean_anomaly_at_epoch: deg_to_rad(mean_anomaly_deg),
            epoch,
        }
    }

    /// Conic through the given position/velocity at `ut`.
    ///
    /// Returns `None` for degenerate states: zero radius, purely radial motion, or an exactly
    /// parabolic energy.
    pub fn from_state_vectors(position: &Vector3, velocity: &Vector3, mu: f64, ut: f64) -> Option<Self> {
        let r = vector::norm(position);
        if !(r > 0.0) || !r.is_finite() || !(mu > 0.0) {
            return None;
        }
        let v2 = vector::dot(velocity, velocity);
        let angular_momentum = vector::cross(position, velocity);
        let normal = vector::normalize(&angular_momentum)?;

        let energy = 0.5 * v2 - mu / r;
        if energy == 0.0 || !energy.is_finite() {
            return None;
        }
        let semi_major_axis = -mu / (2.0 * energy);

        let radial_velocity = vector::dot(position, velocity);
        let e_vec = vector::scale(
            &vector::sub(
                &vector::scale(position, v2 - mu / r),
                &vector::scale(velocity, radial_velocity),
            ),
            1.0 / mu,
        );
        let eccentricity = vector::norm(&e_vec);
        let inclination = normal[2].clamp(-1.0, 1.0).acos();

        let node_line = vector::cross(&UNIT_Z, &angular_momentum);
        let (node_dir, lan) = match vector::normalize(&node_line) {
            Some(dir) if inclination.sin().abs() > 1e-12 => (dir, wrap_two_pi(dir[1].atan2(dir[0]))),
            _ => (UNIT_X, 0.0),
        };

        let periapsis_dir = if eccentricity > CIRCULAR_ECCENTRICITY {
            vector::scale(&e_vec, 1.0 / eccentricity)
        } else {
            node_dir
        };
        let ahead_of_node = vector::cross(&normal, &node_dir);
        let arg_periapsis = wrap_two_pi(
            vector::dot(&periapsis_dir, &ahead_of_node).atan2(vector::dot(&periapsis_dir, &node_dir)),
        );

        let q_dir = vector::cross(&normal, &periapsis_dir);
        let true_anomaly = vector::dot(position, &q_dir).atan2(vector::dot(position, &periapsis_dir));

        let mut conic = Self {
            mu,
            semi_major_axis,
            eccentricity,
            inclination,
            lan,
            arg_periapsis,
            mean_anomaly_at_epoch: 0.0,
            epoch: ut,
        };
        conic.mean_anomaly_at_epoch = conic.mean_anomaly_for_true_anomaly(true_anomaly);
        conic.mean_anomaly_at_epoch.is_finite().then_some(conic)
    }

    pub fn is_closed(&self) -> bool {
        self.eccentricity < 1.0
    }

    /// Mean motion (rad/s).
    pub fn mean_motion(&self) -> f64 {
        (self.mu / self.semi_major_axis.abs().powi(3)).sqrt()
    }

    /// Orbital period (s); infinite for open conics.
    pub fn period(&self) -> f64 {
        if self.is_closed() {
            TAU / self.mean_motion()
        } else {
            f64::INFINITY
        }
    }

    pub fn semi_latus_rectum(&self) -> f64 {
        self.semi_major_axis * (1.0 - self.eccentricity * self.eccentricity)
    }

    pub fn periapsis_radius(&self) -> f64 {
        self.semi_major_axis * (1.0 - self.eccentricity)
    }

    /// Apoapsis radius; infinite for open conics.
    pub fn apoapsis_radius(&self) -> f64 {
        if self.is_closed() {
            self.semi_major_axis * (1.0 + self.eccentricity)
        } else {
            f64::INFINITY
        }
    }

    /// Unwrapped mean anomaly at `ut`.
    pub fn mean_anomaly_at(&self, ut: f64) -> f64 {
        self.mean_anomaly_at_epoch + self.mean_motion() * (ut - self.epoch)
    }

    /// True anomaly at `ut`, in `(-π, π]`.
    pub fn true_anomaly_at(&self, ut: f64) -> f64 {
        self.true_anomaly_for_mean_anomaly(self.mean_anomaly_at(ut))
    }

    pub fn true_anomaly_for_mean_anomaly(&self, mean_anomaly: f64) -> f64 {
        let e = self.eccentricity;
        if self.is_closed() {
            let ecc_anomaly = solve_elliptic(wrap_pi(mean_anomaly), e);
            2.0 * ((1.0 + e).sqrt() * (0.5 * ecc_anomaly).sin())
                .atan2((1.0 - e).sqrt() * (0.5 * ecc_anomaly).cos())
        } else {
            let hyp_anomaly = solve_hyperbolic(mean_anomaly, e);
            2.0 * (((e + 1.0) / (e - 1.0)).sqrt() * (0.5 * hyp_anomaly).tanh()).atan()
        }
    }

    /// Mean anomaly for a true anomaly: `[0, 2π)` for ellipses, signed for hyperbolas, NaN when the
    /// anomaly lies beyond a hyperbola's asymptotes.
    pub fn mean_anomaly_for_true_anomaly(&self, true_anomaly: f64) -> f64 {
        let e = self.eccentricity;
        if self.is_closed() {
            let half = 0.5 * true_anomaly;
            let ecc_anomaly = 2.0 * ((1.0 - e).sqrt() * half.sin()).atan2((1.0 + e).sqrt() * half.cos());
            wrap_two_pi(ecc_anomaly - e * ecc_anomaly.sin())
        } else {
            let nu = wrap_pi(true_anomaly);
            if 1.0 + e * nu.cos() <= 0.0 {
                return f64::NAN;
            }
            let x = ((e - 1.0) / (e + 1.0)).sqrt() * (0.5 * nu).tan();
            if x.abs() >= 1.0 {
                return f64::NAN;
            }
            let hyp_anomaly = 2.0 * x.atanh();
            e * hyp_anomaly.sinh() - hyp_anomaly
        }
    }

    /// Time from periapsis to the given true anomaly.
    pub fn time_since_periapsis(&self, true_anomaly: f64) -> f64 {
        self.mean_anomaly_for_true_anomaly(true_anomaly) / self.mean_motion()
    }

    /// Signed time from `from_ut` to the true anomaly within the current revolution.
    ///
    /// Ellipses return a value in `(-period, period)`; callers wrap forward as needed. Hyperbolas return
    /// the direct difference, which is negative when the anomaly has already been passed.
    pub fn dt_for_true_anomaly(&self, true_anomaly: f64, from_ut: f64) -> f64 {
        let n = self.mean_motion();
        let target = self.mean_anomaly_for_true_anomaly(true_anomaly) / n;
        let current = if self.is_closed() {
            wrap_two_pi(self.mean_anomaly_at(from_ut)) / n
        } else {
            self.mean_anomaly_at(from_ut) / n
        };
        target - current
    }

    /// Next UT at or after `from_ut` when the conic reaches the true anomaly (NaN if unreachable).
    pub fn ut_for_true_anomaly(&self, true_anomaly: f64, from_ut: f64) -> f64 {
        let mut dt = self.dt_for_true_anomaly(true_anomaly, from_ut);
        if dt < 0.0 && self.is_closed() {
            dt += self.period();
        }
        from_ut + dt
    }

    /// Time from `from_ut` to the next periapsis passage (negative once a hyperbola has passed it).
    pub fn time_to_periapsis(&self, from_ut: f64) -> f64 {
        let dt = self.dt_for_true_anomaly(0.0, from_ut);
        if self.is_closed() && dt < 0.0 { dt + self.period() } else { dt }
    }

    /// Time from `from_ut` to the next apoapsis passage; NaN for open conics.
    pub fn time_to_apoapsis(&self, from_ut: f64) -> f64 {
        if !self.is_closed() {
            return f64::NAN;
        }
        let dt = self.dt_for_true_anomaly(PI, from_ut);
        if dt < 0.0 { dt + self.period() } else { dt }
    }

    /// Perifocal basis `(P, Q, W)`: periapsis direction, in-plane normal, orbit normal.
    pub fn perifocal_basis(&self) -> [Vector3; 3] {
        let (so, co) = self.lan.sin_cos();
        let (sw, cw) = self.arg_periapsis.sin_cos();
        let (si, ci) = self.inclination.sin_cos();
        let p = [co * cw - so * sw * ci, so * cw + co * sw * ci, sw * si];
        let q = [-co * sw - so * cw * ci, -so * sw + co * cw * ci, cw * si];
        let w = [so * si, -co * si, ci];
        [p, q, w]
    }

    /// Unit orbit normal (direction of the specific angular momentum).
    pub fn normal(&self) -> Vector3 {
        self.perifocal_basis()[2]
    }

    /// True anomaly at which the conic points along `direction` (projected onto the orbit plane).
    pub fn true_anomaly_of_direction(&self, direction: &Vector3) -> f64 {
        let [p, q, _] = self.perifocal_basis();
        wrap_two_pi(vector::dot(direction, &q).atan2(vector::dot(direction, &p)))
    }

    pub fn radius_at_true_anomaly(&self, true_anomaly: f64) -> f64 {
        self.semi_latus_rectum() / (1.0 + self.eccentricity * true_anomaly.cos())
    }

    pub fn position_at_true_anomaly(&self, true_anomaly: f64) -> Vector3 {
        let [p, q, _] = self.perifocal_basis();
        let r = self.radius_at_true_anomaly(true_anomaly);
        let (s, c) = true_anomaly.sin_cos();
        vector::add(&vector::scale(&p, r * c), &vector::scale(&q, r * s))
    }

    pub fn velocity_at_true_anomaly(&self, true_anomaly: f64) -> Vector3 {
        let [p, q, _] = self.perifocal_basis();
        let k = (self.mu / self.semi_latus_rectum()).sqrt();
        let (s, c) = true_anomaly.sin_cos();
        vector::add(
            &vector::scale(&p, -k * s),
            &vector::scale(&q, k * (self.eccentricity + c)),
        )
    }

    pub fn position_at(&self, ut: f64) -> Vector3 {
        self.position_at_true_anomaly(self.true_anomaly_at(ut))
    }

    pub fn velocity_at(&self, ut: f64) -> Vector3 {
        self.velocity_at_true_anomaly(self.true_anomaly_at(ut))
    }

    /// Position and velocity at `ut`.
    pub fn state_at(&self, ut: f64) -> (Vector3, Vector3) {
        let nu = self.true_anomaly_at(ut);
        (self.position_at_true_anomaly(nu), self.velocity_at_true_anomaly(nu))
    }
}

fn solve_elliptic(mean_anomaly: f64, e: f64) -> f64 {
    let mut ecc_anomaly = if e < 0.8 { mean_anomaly } else { PI.copysign(mean_anomaly) };
    for _ in 0..KEPLER_MAX_ITERATIONS {
        let f = ecc_anomaly - e * ecc_anomaly.sin() - mean_anomaly;
        let delta = f / (1.0 - e * ecc_anomaly.cos());
        ecc_anomaly -= delta;
        if delta.abs() < KEPLER_TOLERANCE {
            break;
        }
    }
    ecc_anomaly
}

fn solve_hyperbolic(mean_anomaly: f64, e: f64) -> f64 {
    let mut hyp_anomaly = (mean_anomaly / e).asinh();
    for _ in 0..KEPLER_MAX_ITERATIONS {
        let f = e * hyp_anomaly.sinh() - hyp_anomaly - mean_anomaly;
        let delta = f / (e * hyp_anomaly.cosh() - 1.0);
        hyp_anomaly -= delta;
        if delta.abs() < KEPLER_TOLERANCE * hyp_anomaly.abs().max(1.0) {
            break;
        }
    }
    hyp_anomaly
}

#[cfg(test)]
mod tests {
    use super::*;

    const MU: f64 = 3.5316e12;

    #[test]
    fn state_vectors_reproduce_the_conic() {
        let conic = Conic::from_degrees(MU, 900_000.0, 0.2, 28.0, 40.0, 75.0, 10.0, 0.0);
        let (r, v) = conic.state_at(1_234.0);
        let rebuilt = Conic::from_state_vectors(&r, &v, MU, 1_234.0).expect("conic");
        let (r2, v2) = rebuilt.state_at(5_000.0);
        let (r1, v1) = conic.state_at(5_000.0);
        assert!(vector::distance(&r1, &r2) < 1e-3, "position drift {}", vector::distance(&r1, &r2));
        assert!(vector::distance(&v1, &v2) < 1e-6);
        assert!((rebuilt.eccentricity - 0.2).abs() < 1e-9);
    }

    #[test]
    fn hyperbolic_anomalies_round_trip() {
        let conic = Conic::from_degrees(MU, -2_000_000.0, 1.4, 0.0, 0.0, 0.0, 0.0, 0.0);
        let nu = 1.2;
        let m = conic.mean_anomaly_for_true_anomaly(nu);
        assert!((conic.true_anomaly_for_mean_anomaly(m) - nu).abs() < 1e-9);
        assert!(conic.mean_anomaly_for_true_anomaly(3.0).is_nan());
    }
}
