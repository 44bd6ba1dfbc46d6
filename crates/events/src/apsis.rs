use maneuver_orbits::Patch;

use crate::EventTime;

fn before_soi_exit(patch: &Patch, ut: f64) -> bool {
    patch.soi_exit_ut.is_none_or(|exit| ut <= exit)
}

/// Next apoapsis on the patch. Invalid for open orbits and apoapsides beyond the SOI.
pub fn apoapsis(patch: &Patch) -> EventTime {
    let ut = patch.start_ut + patch.time_to_apoapsis;
    EventTime::when(
        patch.eccentricity() < 1.0
            && patch.apoapsis_radius() <= patch.body.soi_radius
            && patch.time_to_apoapsis >= 0.0
            && before_soi_exit(patch, ut),
        ut,
    )
}

/// Next periapsis on the patch. Open orbits keep their periapsis until it is passed.
pub fn periapsis(patch: &Patch) -> EventTime {
    let ut = patch.start_ut + patch.time_to_periapsis;
    EventTime::when(
        patch.periapsis_radius() >= 0.0 && patch.time_to_periapsis >= 0.0 && before_soi_exit(patch, ut),
        ut,
    )
}
