//! Maneuver node editing on top of an [`OrbitModel`](maneuver_orbits::OrbitModel).
//!
//! The [`Editor`] owns the node-cycling state machine, the delta-v accumulator and the per-node
//! snap/input panels; the UI layer forwards input to it and calls [`Editor::update`] every frame.

pub mod accumulator;
pub mod cycle;
pub mod frames;
pub mod panels;
pub mod session;

pub use accumulator::{Applied, DeltaVAccumulator, MAX_SLICES};
pub use cycle::{Attachment, CycleError, CycleState, NodeCycleController, PanelOptions, PooledPanels, Toggle};
pub use frames::{ControlAxis, VectorFrameResolver};
pub use panels::{
    InputPanel, InputReadout, ManualInputMemory, PanelId, PanelKind, PollOutcome, SHIFT_INCREMENTS, SnapEnv,
    SnapPanel, SnapSlot, SnapTable,
};
pub use session::{Editor, EditorError, EditorStatus, UpdateReport};
