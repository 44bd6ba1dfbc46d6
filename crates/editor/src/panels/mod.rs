//! Per-node edit panels and their shared bookkeeping.

pub mod debounce;
pub mod input;
pub mod snap;

use std::fmt;

pub use debounce::{Debounce, DebounceAction};
pub use input::{InputPanel, InputReadout, format_increment, format_speed};
pub use snap::{PollOutcome, SnapEnv, SnapPanel, SnapSlot, SnapTable, evaluate};

/// Manual time-shift increments (s) selectable on the snap panel.
pub const SHIFT_INCREMENTS: [f64; 6] = [1.0, 10.0, 60.0, 100.0, 1_000.0, 3_600.0];
/// Default per-axis increment (m/s) of the input panel.
pub const DEFAULT_INPUT_INCREMENT: f64 = 0.1;

/// Identity of a panel instance; a restored pooled panel keeps its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PanelId(pub u64);

impl fmt::Display for PanelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "panel#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelKind {
    Snap,
    Input,
}

/// Serial allocator for [`PanelId`]s.
#[derive(Debug, Default)]
pub struct PanelIds {
    next: u64,
}

impl PanelIds {
    pub fn allocate(&mut self) -> PanelId {
        self.next += 1;
        PanelId(self.next)
    }
}

/// Increments carried over to newly opened panels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManualInputMemory {
    pub shift_index: usize,
    pub increments: [f64; 3],
}

impl Default for ManualInputMemory {
    fn default() -> Self {
        Self {
            shift_index: 0,
            increments: [DEFAULT_INPUT_INCREMENT; 3],
        }
    }
}
