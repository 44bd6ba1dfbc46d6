//! Closed-form and bounded-iteration event time solvers over conic patches.
//!
//! Every solver is pure and reports validity explicitly through [`EventTime`] (or `Option` for
//! closest approach); nothing here returns an error.

pub mod apsis;
pub mod approach;
pub mod hops;
pub mod menu;
pub mod nodes;
pub mod recurrence;
pub mod target;

use std::fmt;

pub use apsis::{apoapsis, periapsis};
pub use approach::{ApproachWindow, closest_approach};
pub use hops::{hop_time, next_patch, previous_patch};
pub use menu::{Suggestion, SuggestionWindows, suggest};
pub use nodes::{equatorial_node, relative_node};
pub use recurrence::{next_orbit, orbits_reset_required, previous_orbit, recurrence_applies, with_recurrence};
pub use target::{Target, TargetKind};

/// Time of an event together with whether it can be snapped to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventTime {
    pub valid: bool,
    pub ut: f64,
}

impl EventTime {
    pub const INVALID: EventTime = EventTime {
        valid: false,
        ut: f64::NAN,
    };

    pub fn at(ut: f64) -> Self {
        Self {
            valid: ut.is_finite(),
            ut,
        }
    }

    /// Valid only when `condition` holds and the time is finite.
    pub fn when(condition: bool, ut: f64) -> Self {
        if condition { Self::at(ut) } else { Self { valid: false, ut } }
    }

    pub fn value(&self) -> Option<f64> {
        self.valid.then_some(self.ut)
    }
}

/// Snap targets offered for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Apoapsis,
    Periapsis,
    NextOrbit,
    PreviousOrbit,
    NextPatch,
    PreviousPatch,
    EquatorialAscending,
    EquatorialDescending,
    RelativeAscending,
    RelativeDescending,
    ClosestApproach,
}

impl EventKind {
    pub const ALL: [EventKind; 11] = [
        EventKind::Apoapsis,
        EventKind::Periapsis,
        EventKind::NextOrbit,
        EventKind::PreviousOrbit,
        EventKind::NextPatch,
        EventKind::PreviousPatch,
        EventKind::EquatorialAscending,
        EventKind::EquatorialDescending,
        EventKind::RelativeAscending,
        EventKind::RelativeDescending,
        EventKind::ClosestApproach,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            EventKind::Apoapsis => "Apoapsis",
            EventKind::Periapsis => "Periapsis",
            EventKind::NextOrbit => "Next Orbit",
            EventKind::PreviousOrbit => "Previous Orbit",
            EventKind::NextPatch => "Next Patch",
            EventKind::PreviousPatch => "Previous Patch",
            EventKind::EquatorialAscending => "Equatorial AN",
            EventKind::EquatorialDescending => "Equatorial DN",
            EventKind::RelativeAscending => "Relative AN",
            EventKind::RelativeDescending => "Relative DN",
            EventKind::ClosestApproach => "Closest Approach",
        }
    }

    /// Machine-friendly identifier (used by the CLI and exports).
    pub fn key(&self) -> &'static str {
        match self {
            EventKind::Apoapsis => "apoapsis",
            EventKind::Periapsis => "periapsis",
            EventKind::NextOrbit => "next_orbit",
            EventKind::PreviousOrbit => "previous_orbit",
            EventKind::NextPatch => "next_patch",
            EventKind::PreviousPatch => "previous_patch",
            EventKind::EquatorialAscending => "equatorial_an",
            EventKind::EquatorialDescending => "equatorial_dn",
            EventKind::RelativeAscending => "relative_an",
            EventKind::RelativeDescending => "relative_dn",
            EventKind::ClosestApproach => "closest_approach",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }

    /// Whether the event needs a target orbit.
    pub fn needs_target(&self) -> bool {
        matches!(
            self,
            EventKind::RelativeAscending | EventKind::RelativeDescending | EventKind::ClosestApproach
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_round_trip() {
        for kind in EventKind::ALL {
            assert_eq!(EventKind::from_key(kind.key()), Some(kind));
        }
        assert_eq!(EventKind::from_key("launch"), None);
    }

    #[test]
    fn non_finite_times_are_invalid() {
        assert!(!EventTime::at(f64::INFINITY).valid);
        assert!(!EventTime::when(true, f64::NAN).valid);
        assert_eq!(EventTime::when(true, 4.0).value(), Some(4.0));
    }
}
