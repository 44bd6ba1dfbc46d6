//! Orbit-relative frames before and after a node's burn.

use maneuver_core::vector::Vector3;
use maneuver_orbits::{NodeId, OrbitFrame, OrbitModel, axis};

/// Handle axis a control input acts along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlAxis {
    Radial,
    Normal,
    Prograde,
}

impl ControlAxis {
    pub const ALL: [ControlAxis; 3] = [ControlAxis::Radial, ControlAxis::Normal, ControlAxis::Prograde];

    /// Component index inside a DeltaV vector.
    pub fn index(self) -> usize {
        match self {
            ControlAxis::Radial => axis::RADIAL,
            ControlAxis::Normal => axis::NORMAL,
            ControlAxis::Prograde => axis::PROGRADE,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            ControlAxis::Radial => "radial",
            ControlAxis::Normal => "normal",
            ControlAxis::Prograde => "prograde",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.key().eq_ignore_ascii_case(key))
    }
}

/// Reference (pre-burn) and target (post-burn) frames at a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorFrameResolver {
    pub reference: OrbitFrame,
    pub target: OrbitFrame,
}

impl VectorFrameResolver {
    /// Frames at `ut` on the patches before and after `node`. `None` if either patch is missing or the
    /// state there is degenerate.
    pub fn at_node<M: OrbitModel + ?Sized>(model: &M, node: NodeId, ut: f64) -> Option<Self> {
        let before = model.patch_before(node)?;
        let after = model.patch_after(node)?;
        let (r0, v0) = before.conic.state_at(ut);
        let (r1, v1) = after.conic.state_at(ut);
        Some(Self {
            reference: OrbitFrame::from_state(&r0, &v0)?,
            target: OrbitFrame::from_state(&r1, &v1)?,
        })
    }

    /// The target frame's `axis` expressed in the reference basis, as DeltaV components.
    pub fn direction(&self, axis: ControlAxis) -> Vector3 {
        self.reference.components_of(self.target.axes()[axis.index()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_frames_give_unit_axes() {
        let frame = OrbitFrame::from_state(&[7.0e5, 0.0, 0.0], &[0.0, 2_200.0, 100.0]).expect("frame");
        let resolver = VectorFrameResolver {
            reference: frame,
            target: frame,
        };
        for axis in ControlAxis::ALL {
            let mut expected = [0.0; 3];
            expected[axis.index()] = 1.0;
            let got = resolver.direction(axis);
            for k in 0..3 {
                assert!((got[k] - expected[k]).abs() < 1e-12, "{axis:?}: {got:?}");
            }
        }
    }
}
