//! Change tracking between snapshots of the phase tree.
//!
//! The [`ChangeTracker`] holds two snapshots, the previous (last
//! acknowledged) state and the current state, and computes the
//! [`ChangeSet`] between them on demand.
//!
//! ```text
//! initialize(A)            previous = A, current = A
//! update_current_state(B)  previous = A, current = B  -> diff(A, B)
//! update_current_state(C)  previous = B, current = C  -> diff(B, C)
//! reset(D)                 previous = D, current = D, changes cleared
//! ```
//!
//! The tracker never holds a reference to the caller's tree; every call
//! captures a deep copy.
//!
//! # Examples
//!
//! ```rust
//! use cadence_core::{models::Phase, tracker::ChangeTracker};
//!
//! let mut phases = vec![Phase::new("p1", "plan", "Base", 0)];
//! let mut tracker = ChangeTracker::initialize(&phases);
//!
//! phases[0].name = "Hypertrophy".to_string();
//! phases.push(Phase::new("p2", "plan", "Peak", 1));
//!
//! let changes = tracker.update_current_state(&phases);
//! assert_eq!(changes.created.phases.len(), 1);
//! assert_eq!(changes.updated.phases[0].patch.name.as_deref(), Some("Hypertrophy"));
//! assert!(changes.deleted.is_empty());
//! ```

use log::debug;

use crate::{models::Phase, snapshot::Snapshot};

pub mod changes;
pub mod diff;

#[cfg(test)]
mod tests;

pub use changes::{ChangeSet, Created, CreatedExercise, CreatedSession, Deleted, EntityUpdate, Updated};
pub use diff::diff_phases;

/// Knobs of the change predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerOptions {
    /// Whether the UI-only expanded/collapsed flags of phases and sessions
    /// count as changes.
    pub track_ui_fields: bool,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            track_ui_fields: true,
        }
    }
}

/// Tracks the previous and current snapshot of a phase tree.
#[derive(Debug, Clone)]
pub struct ChangeTracker {
    previous: Snapshot<Vec<Phase>>,
    current: Snapshot<Vec<Phase>>,
    changes: ChangeSet,
    options: TrackerOptions,
}

impl ChangeTracker {
    /// Starts tracking with `tree` as both the previous and current state.
    pub fn initialize(tree: &[Phase]) -> Self {
        Self::with_options(tree, TrackerOptions::default())
    }

    pub fn with_options(tree: &[Phase], options: TrackerOptions) -> Self {
        Self {
            previous: capture(tree),
            current: capture(tree),
            changes: ChangeSet::default(),
            options,
        }
    }

    /// Shifts the current snapshot into the previous slot, captures `tree`
    /// as the new current state and returns the freshly computed changes.
    pub fn update_current_state(&mut self, tree: &[Phase]) -> &ChangeSet {
        self.previous = std::mem::replace(&mut self.current, capture(tree));
        self.changes = diff_phases(&self.previous, &self.current, self.options);
        debug!(
            "Computed changes: {} created, {} updated, {} deleted",
            self.changes.created.len(),
            self.changes.updated.len(),
            self.changes.deleted.len()
        );
        &self.changes
    }

    /// The most recently computed changes.
    pub fn changes(&self) -> &ChangeSet {
        &self.changes
    }

    /// Makes `tree` the clean baseline and clears the computed changes.
    pub fn reset(&mut self, tree: &[Phase]) {
        self.previous = capture(tree);
        self.current = capture(tree);
        self.changes = ChangeSet::default();
    }

    pub fn previous(&self) -> &[Phase] {
        &self.previous
    }

    pub fn current(&self) -> &[Phase] {
        &self.current
    }

    pub fn options(&self) -> TrackerOptions {
        self.options
    }
}

fn capture(tree: &[Phase]) -> Snapshot<Vec<Phase>> {
    Snapshot::capture_slice(tree)
}
