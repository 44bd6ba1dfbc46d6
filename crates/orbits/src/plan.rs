//! Flight plans: an arena of linked conic patches.

use thiserror::Error;

use crate::patch::{Patch, Transition};

/// Index of a patch inside its [`FlightPlan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatchId(pub usize);

#[derive(Debug, Error, PartialEq)]
pub enum PlanError {
    #[error("flight plan has no patches")]
    Empty,
    #[error("flight plan must end with exactly one FINAL patch (found {0})")]
    Terminus(usize),
    #[error("patch {0} is FINAL but not the last patch")]
    FinalNotLast(usize),
}

/// Ordered chain of patches, rebuilt wholesale after every edit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlightPlan {
    patches: Vec<Patch>,
}

impl FlightPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a patch, linking it after the current last patch.
    pub fn push(&mut self, mut patch: Patch) -> PatchId {
        let id = PatchId(self.patches.len());
        patch.next = None;
        patch.previous = self.patches.last_mut().map(|last| {
            last.next = Some(id);
            PatchId(id.0 - 1)
        });
        self.patches.push(patch);
        id
    }

    pub fn get(&self, id: PatchId) -> Option<&Patch> {
        self.patches.get(id.0)
    }

    pub fn get_mut(&mut self, id: PatchId) -> Option<&mut Patch> {
        self.patches.get_mut(id.0)
    }

    pub fn len(&self) -> usize {
        self.patches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PatchId, &Patch)> {
        self.patches.iter().enumerate().map(|(i, p)| (PatchId(i), p))
    }

    pub fn cursor(&self, id: PatchId) -> Option<PatchCursor<'_>> {
        self.get(id).map(|_| PatchCursor { plan: self, id })
    }

    pub fn first(&self) -> Option<PatchCursor<'_>> {
        self.cursor(PatchId(0))
    }

    pub fn last(&self) -> Option<PatchCursor<'_>> {
        self.patches.len().checked_sub(1).and_then(|i| self.cursor(PatchId(i)))
    }

    /// The FINAL-terminated patch.
    pub fn terminus(&self) -> Option<PatchCursor<'_>> {
        self.iter()
            .find(|(_, p)| p.is_terminus())
            .and_then(|(id, _)| self.cursor(id))
    }

    /// Check that the plan ends with exactly one FINAL patch.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.patches.is_empty() {
            return Err(PlanError::Empty);
        }
        let finals: Vec<usize> = self
            .patches
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_terminus())
            .map(|(i, _)| i)
            .collect();
        match finals.as_slice() {
            [only] if *only == self.patches.len() - 1 => Ok(()),
            [only] => Err(PlanError::FinalNotLast(*only)),
            other => Err(PlanError::Terminus(other.len())),
        }
    }

    /// Patch whose `[start, upper bound]` interval contains `ut`.
    pub fn patch_containing(&self, ut: f64) -> Option<PatchCursor<'_>> {
        self.iter()
            .find(|(_, p)| p.contains(ut))
            .and_then(|(id, _)| self.cursor(id))
    }

    /// Patch a clicked UT refers to: scanning from the first MANEUVER-started patch (or the first patch),
    /// the one whose span `[start, next start)` holds `ut`, else the FINAL patch reached on the way.
    pub fn reference_patch(&self, ut: f64) -> Option<PatchCursor<'_>> {
        let from = self
            .patches
            .iter()
            .position(|p| p.start_transition == Transition::Maneuver)
            .unwrap_or(0);
        for (index, patch) in self.patches.iter().enumerate().skip(from) {
            let span_end = patch
                .next
                .and_then(|next| self.get(next))
                .map(|next| next.start_ut)
                .unwrap_or(patch.end_ut);
            if (ut >= patch.start_ut && ut < span_end) || patch.is_terminus() {
                return self.cursor(PatchId(index));
            }
        }
        None
    }
}

/// Borrowed handle to one patch that can walk the plan's links.
#[derive(Debug, Clone, Copy)]
pub struct PatchCursor<'a> {
    plan: &'a FlightPlan,
    id: PatchId,
}

impl<'a> PatchCursor<'a> {
    pub fn id(&self) -> PatchId {
        self.id
    }

    pub fn plan(&self) -> &'a FlightPlan {
        self.plan
    }

    pub fn patch(&self) -> &'a Patch {
        &self.plan.patches[self.id.0]
    }

    pub fn next(&self) -> Option<PatchCursor<'a>> {
        self.patch().next.and_then(|id| self.plan.cursor(id))
    }

    pub fn previous(&self) -> Option<PatchCursor<'a>> {
        self.patch().previous.and_then(|id| self.plan.cursor(id))
    }
}

impl std::ops::Deref for PatchCursor<'_> {
    type Target = Patch;

    fn deref(&self) -> &Patch {
        self.patch()
    }
}
