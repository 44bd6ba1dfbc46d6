//! Targets for relative-node and closest-approach solving.

use maneuver_orbits::{BodyId, Conic};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Vessel,
    Body,
}

/// Another object orbiting some body, described by its conic.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub name: String,
    pub kind: TargetKind,
    /// Body the target orbits.
    pub body: BodyId,
    pub conic: Conic,
}

impl Target {
    pub fn vessel(name: impl Into<String>, body: BodyId, conic: Conic) -> Self {
        Self {
            name: name.into(),
            kind: TargetKind::Vessel,
            body,
            conic,
        }
    }

    pub fn body(name: impl Into<String>, body: BodyId, conic: Conic) -> Self {
        Self {
            name: name.into(),
            kind: TargetKind::Body,
            body,
            conic,
        }
    }
}
