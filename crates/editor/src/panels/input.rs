//! Vector-input panel: per-axis increments, step buttons, numeric entry, and readout.

use maneuver_core::vector::{self, Vector3};
use maneuver_orbits::{Gizmo, ManeuverNode, ModelError, NodeId, OrbitModel};

use super::PanelId;
use crate::accumulator::DeltaVAccumulator;
use crate::frames::ControlAxis;

const MIN_INCREMENT: f64 = 0.01;
const MAX_INCREMENT: f64 = 100.0;

/// Speed with a unit that keeps the number short: m/s, then km/s, then Mm/s.
pub fn format_speed(m_s: f64) -> String {
    let magnitude = m_s.abs();
    if magnitude < 100_000.0 {
        format!("{}m/s", group_thousands(m_s, 2))
    } else if magnitude < 1.0e9 {
        format!("{}km/s", group_thousands(m_s / 1_000.0, 1))
    } else {
        format!("{}Mm/s", group_thousands(m_s / 1.0e6, 1))
    }
}

/// Increment label with 2, 1 or 0 decimals depending on size.
pub fn format_increment(value: f64) -> String {
    if value < 0.09 {
        format!("{value:.2}")
    } else if value < 0.9 {
        format!("{value:.1}")
    } else {
        format!("{value:.0}")
    }
}

fn group_thousands(value: f64, decimals: usize) -> String {
    let text = format!("{:.*}", decimals, value.abs());
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), ""));
    let mut grouped = String::new();
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let sign = if value < 0.0 && text.chars().any(|c| c != '0' && c != '.') { "-" } else { "" };
    if fraction.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{fraction}")
    }
}

/// Display strings for the panel.
#[derive(Debug, Clone, PartialEq)]
pub struct InputReadout {
    /// `"Maneuver Node #2: 1,234.50m/s"`.
    pub total: String,
    /// Components in DeltaV order (radial, normal, prograde), two decimals.
    pub components: [String; 3],
    pub increments: [String; 3],
}

/// Numeric DeltaV editor bound to one node.
#[derive(Debug, Clone)]
pub struct InputPanel {
    id: PanelId,
    node: NodeId,
    locked: bool,
    start_delta_v: Vector3,
    increments: [f64; 3],
}

impl InputPanel {
    pub fn open(id: PanelId, node: &ManeuverNode, increments: [f64; 3]) -> Self {
        Self {
            id,
            node: node.id,
            locked: false,
            start_delta_v: node.delta_v,
            increments: increments.map(|inc| inc.clamp(MIN_INCREMENT, MAX_INCREMENT)),
        }
    }

    pub fn rebind(&mut self, node: &ManeuverNode) {
        self.start_delta_v = node.delta_v;
    }

    pub fn id(&self) -> PanelId {
        self.id
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    pub fn toggle_locked(&mut self) -> bool {
        self.locked = !self.locked;
        self.locked
    }

    pub fn start_delta_v(&self) -> Vector3 {
        self.start_delta_v
    }

    pub fn increments(&self) -> [f64; 3] {
        self.increments
    }

    pub fn increment(&self, axis: ControlAxis) -> f64 {
        self.increments[axis.index()]
    }

    pub fn increment_up(&mut self, axis: ControlAxis) -> f64 {
        let slot = &mut self.increments[axis.index()];
        *slot = (*slot * 10.0).min(MAX_INCREMENT);
        *slot
    }

    pub fn increment_down(&mut self, axis: ControlAxis) -> f64 {
        let slot = &mut self.increments[axis.index()];
        *slot = (*slot / 10.0).max(MIN_INCREMENT);
        *slot
    }

    /// Step one increment along `axis` (`positive` selects the direction).
    ///
    /// With `align_to_orbit` the step goes through the accumulator along the post-burn axis without
    /// raising the gizmo callback; otherwise the raw component is edited.
    pub fn step<M: OrbitModel + ?Sized>(
        &mut self,
        axis: ControlAxis,
        positive: bool,
        model: &mut M,
        gizmo: Option<&mut Gizmo>,
        accumulator: &DeltaVAccumulator,
        align_to_orbit: bool,
    ) -> Result<Vector3, ModelError> {
        let amount = if positive { self.increment(axis) } else { -self.increment(axis) };
        if align_to_orbit {
            return accumulator
                .apply(model, self.node, gizmo, axis, amount, false)
                .map(|applied| applied.delta_v);
        }
        let node = *model.node(self.node).ok_or(ModelError::UnknownNode(self.node))?;
        let mut delta_v = gizmo.as_deref().map_or(node.delta_v, |g| g.delta_v);
        delta_v[axis.index()] += amount;
        self.write(delta_v, model, gizmo)
    }

    /// Overwrite one component.
    pub fn set_component<M: OrbitModel + ?Sized>(
        &mut self,
        axis: ControlAxis,
        value: f64,
        model: &mut M,
        gizmo: Option<&mut Gizmo>,
    ) -> Result<Vector3, ModelError> {
        let node = *model.node(self.node).ok_or(ModelError::UnknownNode(self.node))?;
        let mut delta_v = gizmo.as_deref().map_or(node.delta_v, |g| g.delta_v);
        delta_v[axis.index()] = value;
        self.write(delta_v, model, gizmo)
    }

    /// Parse typed text into a component; unparsable text is ignored (`Ok(None)`).
    pub fn enter_component<M: OrbitModel + ?Sized>(
        &mut self,
        axis: ControlAxis,
        text: &str,
        model: &mut M,
        gizmo: Option<&mut Gizmo>,
    ) -> Result<Option<Vector3>, ModelError> {
        match text.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => self.set_component(axis, value, model, gizmo).map(Some),
            _ => Ok(None),
        }
    }

    /// Restore the DeltaV captured when the panel was bound.
    pub fn reset<M: OrbitModel + ?Sized>(
        &mut self,
        model: &mut M,
        gizmo: Option<&mut Gizmo>,
    ) -> Result<Vector3, ModelError> {
        self.write(self.start_delta_v, model, gizmo)
    }

    fn write<M: OrbitModel + ?Sized>(
        &self,
        delta_v: Vector3,
        model: &mut M,
        gizmo: Option<&mut Gizmo>,
    ) -> Result<Vector3, ModelError> {
        let node = *model.node(self.node).ok_or(ModelError::UnknownNode(self.node))?;
        model.commit(node.id, node.ut, delta_v)?;
        if let Some(g) = gizmo {
            g.delta_v = delta_v;
        }
        Ok(delta_v)
    }

    /// Readout for the node at position `index` (0-based) in the plan.
    pub fn readout(&self, node: &ManeuverNode, index: usize) -> InputReadout {
        InputReadout {
            total: format!(
                "Maneuver Node #{}: {}",
                index + 1,
                format_speed(vector::norm(&node.delta_v))
            ),
            components: node.delta_v.map(|c| format!("{c:.2}")),
            increments: self.increments.map(format_increment),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_units_switch_with_magnitude() {
        assert_eq!(format_speed(1_234.5), "1,234.50m/s");
        assert_eq!(format_speed(250_000.0), "250.0km/s");
        assert_eq!(format_speed(2.5e9), "2,500.0Mm/s");
        assert_eq!(format_speed(-12.0), "-12.00m/s");
    }

    #[test]
    fn increment_labels_track_precision() {
        assert_eq!(format_increment(0.01), "0.01");
        assert_eq!(format_increment(0.1), "0.1");
        assert_eq!(format_increment(10.0), "10");
    }

    #[test]
    fn increments_clamp_to_range() {
        let node = ManeuverNode::new(NodeId(1), 0.0, [0.0; 3]);
        let mut panel = InputPanel::open(PanelId(1), &node, [0.1; 3]);
        assert_eq!(panel.increment_down(ControlAxis::Prograde), 0.01);
        assert_eq!(panel.increment_down(ControlAxis::Prograde), 0.01);
        for _ in 0..6 {
            panel.increment_up(ControlAxis::Radial);
        }
        assert_eq!(panel.increment(ControlAxis::Radial), 100.0);
        assert_eq!(panel.increment(ControlAxis::Normal), 0.1);
    }
}
