//! Periodic re-occurrence of events on closed terminal orbits.

use maneuver_orbits::Patch;

use crate::EventTime;

/// Whole-orbit shifts only make sense on a closed patch that ends the plan.
pub fn recurrence_applies(patch: &Patch) -> bool {
    patch.is_closed() && patch.is_terminus()
}

/// `orbits_added` must drop back to zero once the orbit opens or stops being the terminus.
pub fn orbits_reset_required(patch: &Patch) -> bool {
    !recurrence_applies(patch)
}

/// Shift a valid event by whole periods.
pub fn with_recurrence(event: EventTime, patch: &Patch, orbits_added: u32) -> EventTime {
    if !event.valid || orbits_added == 0 || !recurrence_applies(patch) {
        return event;
    }
    EventTime::at(event.ut + f64::from(orbits_added) * patch.period())
}

/// One revolution after `node_ut`.
pub fn next_orbit(patch: &Patch, node_ut: f64) -> EventTime {
    EventTime::when(recurrence_applies(patch), node_ut + patch.period())
}

/// One revolution before `node_ut`, unless that lies in the past.
pub fn previous_orbit(patch: &Patch, node_ut: f64, now: f64) -> EventTime {
    let ut = node_ut - patch.period();
    EventTime::when(recurrence_applies(patch) && ut >= now, ut)
}
