//! Maneuver planning: event-time solving and node editing over a patched-conic flight plan.
//!
//! The member crates do the work; this crate re-exports them and hosts the glue that turns scenario
//! records into a live model and event reports. Keeping it in a library crate lets multiple front-ends
//! (CLI, GUI) share it.

pub use maneuver_config as config;
pub use maneuver_core as core;
pub use maneuver_editor as editor;
pub use maneuver_events as events;
pub use maneuver_export as export;
pub use maneuver_orbits as orbits;

pub mod report;
pub mod scenario;

/// Returns the version of the library for smoke tests.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
