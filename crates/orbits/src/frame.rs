//! Orbit-relative bases at a point on a trajectory.

use maneuver_core::vector::{self, Vector3};

/// Right-handed orthonormal basis built from a state vector.
///
/// `prograde` follows the velocity, `normal` is the orbit normal (`r × v`), and `radial` completes the
/// basis as `prograde × normal` (pointing away from the central body for circular motion).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitFrame {
    pub radial: Vector3,
    pub normal: Vector3,
    pub prograde: Vector3,
}

impl OrbitFrame {
    pub fn from_state(position: &Vector3, velocity: &Vector3) -> Option<Self> {
        let prograde = vector::normalize(velocity)?;
        let normal = vector::normalize(&vector::cross(position, velocity))?;
        let radial = vector::cross(&prograde, &normal);
        Some(Self {
            radial,
            normal,
            prograde,
        })
    }

    /// Basis vectors in DeltaV component order (radial, normal, prograde).
    pub fn axes(&self) -> [&Vector3; 3] {
        [&self.radial, &self.normal, &self.prograde]
    }

    /// Inertial vector for frame components `(radial, normal, prograde)`.
    pub fn to_inertial(&self, components: &Vector3) -> Vector3 {
        vector::combine(self.axes(), components)
    }

    /// Components of an inertial vector in this frame.
    pub fn components_of(&self, inertial: &Vector3) -> Vector3 {
        [
            vector::dot(inertial, &self.radial),
            vector::dot(inertial, &self.normal),
            vector::dot(inertial, &self.prograde),
        ]
    }
}
