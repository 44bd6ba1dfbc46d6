//! Core units, constants, and shared primitives for the maneuver planner workspace.

pub mod time;

/// Physical and numerical constants expressed in SI units (unless stated otherwise).
pub mod constants {
    /// Degrees per radian.
    pub const RAD2DEG: f64 = 180.0 / std::f64::consts::PI;
    /// Radians per degree.
    pub const DEG2RAD: f64 = std::f64::consts::PI / 180.0;
    /// Seconds per hour.
    pub const SECONDS_PER_HOUR: f64 = 3_600.0;
    /// Seconds per minute.
    pub const SECONDS_PER_MINUTE: f64 = 60.0;
}

/// Basic unit conversion helpers.
pub mod units {
    use super::constants::{DEG2RAD, RAD2DEG};

    /// Convert degrees to radians.
    #[inline]
    pub fn deg_to_rad(v: f64) -> f64 {
        v * DEG2RAD
    }

    /// Convert radians to degrees.
    #[inline]
    pub fn rad_to_deg(v: f64) -> f64 {
        v * RAD2DEG
    }

    /// Convert metres per second to kilometres per second.
    #[inline]
    pub fn ms_to_kms(v: f64) -> f64 {
        v / 1_000.0
    }

    /// Wrap an angle into `[0, 2π)`.
    #[inline]
    pub fn wrap_two_pi(angle: f64) -> f64 {
        angle.rem_euclid(std::f64::consts::TAU)
    }

    /// Wrap an angle into `(-π, π]`.
    #[inline]
    pub fn wrap_pi(angle: f64) -> f64 {
        let wrapped = wrap_two_pi(angle);
        if wrapped > std::f64::consts::PI {
            wrapped - std::f64::consts::TAU
        } else {
            wrapped
        }
    }
}

/// Minimal vector helpers to avoid ad-hoc `[f64; 3]` math everywhere.
pub mod vector {
    /// Alias for a 3D vector in metres or m/s depending on context.
    pub type Vector3 = [f64; 3];

    pub const ZERO: Vector3 = [0.0, 0.0, 0.0];
    pub const UNIT_X: Vector3 = [1.0, 0.0, 0.0];
    pub const UNIT_Z: Vector3 = [0.0, 0.0, 1.0];

    /// Euclidean norm of a vector.
    #[inline]
    pub fn norm(v: &Vector3) -> f64 {
        dot(v, v).sqrt()
    }

    /// Dot product of two vectors.
    #[inline]
    pub fn dot(a: &Vector3, b: &Vector3) -> f64 {
        a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
    }

    /// Right-handed cross product.
    #[inline]
    pub fn cross(a: &Vector3, b: &Vector3) -> Vector3 {
        [
            a[1] * b[2] - a[2] * b[1],
            a[2] * b[0] - a[0] * b[2],
            a[0] * b[1] - a[1] * b[0],
        ]
    }

    /// Vector addition.
    #[inline]
    pub fn add(a: &Vector3, b: &Vector3) -> Vector3 {
        [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
    }

    /// Vector subtraction.
    #[inline]
    pub fn sub(a: &Vector3, b: &Vector3) -> Vector3 {
        [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
    }

    /// Scale a vector by a scalar.
    #[inline]
    pub fn scale(v: &Vector3, s: f64) -> Vector3 {
        [v[0] * s, v[1] * s, v[2] * s]
    }

    /// Unit vector in the direction of `v`, or `None` for a (near) zero vector.
    #[inline]
    pub fn normalize(v: &Vector3) -> Option<Vector3> {
        let n = norm(v);
        if n > f64::EPSILON && n.is_finite() {
            Some(scale(v, 1.0 / n))
        } else {
            None
        }
    }

    /// Distance between two points.
    #[inline]
    pub fn distance(a: &Vector3, b: &Vector3) -> f64 {
        norm(&sub(a, b))
    }

    /// Combine three basis vectors with the given coefficients.
    #[inline]
    pub fn combine(basis: [&Vector3; 3], coefficients: &Vector3) -> Vector3 {
        let mut out = ZERO;
        for (axis, c) in basis.iter().zip(coefficients.iter()) {
            out = add(&out, &scale(axis, *c));
        }
        out
    }

}
