//! Patched-conic trajectory primitives: conics, patches, flight plans, maneuver nodes, and the
//! [`OrbitModel`] seam the solvers and editor work against.

pub mod conic;
pub mod frame;
pub mod model;
pub mod node;
pub mod patch;
pub mod patched;
pub mod plan;

pub use conic::Conic;
pub use frame::OrbitFrame;
pub use model::{ModelError, OrbitModel};
pub use node::{Gizmo, GizmoHandler, ManeuverNode, NodeId, axis};
pub use patch::{Body, BodyId, Patch, Transition};
pub use patched::PatchedConicModel;
pub use plan::{FlightPlan, PatchCursor, PatchId, PlanError};
