//! Jumps to neighbouring patches across SOI transitions.

use maneuver_orbits::{Patch, PatchCursor, Transition};

use crate::EventTime;

/// Representative time on a patch: halfway to its SOI exit, else half a period on closed orbits,
/// else the middle of its span.
pub fn hop_time(patch: &Patch) -> f64 {
    match patch.soi_exit_ut {
        Some(exit) => patch.start_ut + 0.5 * (exit - patch.start_ut),
        None if patch.is_closed() => patch.start_ut + 0.5 * patch.period(),
        None => patch.start_ut + 0.5 * (patch.end_ut - patch.start_ut),
    }
}

/// Time on the patch after the upcoming SOI change.
///
/// The patch must end in an encounter, escape or maneuver, and the following patch must itself end in an
/// encounter or escape; the hop lands on the patch after that one.
pub fn next_patch(patch: &PatchCursor<'_>) -> EventTime {
    if !matches!(
        patch.end_transition,
        Transition::Encounter | Transition::Escape | Transition::Maneuver
    ) {
        return EventTime::INVALID;
    }
    let Some(next) = patch.next() else {
        return EventTime::INVALID;
    };
    if !matches!(next.end_transition, Transition::Encounter | Transition::Escape) {
        return EventTime::INVALID;
    }
    match next.next() {
        Some(hop) => EventTime::at(hop_time(&hop)),
        None => EventTime::INVALID,
    }
}

/// Time on the patch before the last SOI change. Unavailable on patches that begin the plan or start
/// with a maneuver.
pub fn previous_patch(patch: &PatchCursor<'_>) -> EventTime {
    if matches!(patch.start_transition, Transition::Initial | Transition::Maneuver) {
        return EventTime::INVALID;
    }
    match patch.previous() {
        Some(hop) => EventTime::at(hop_time(&hop)),
        None => EventTime::INVALID,
    }
}
