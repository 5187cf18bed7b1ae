//! Change set types produced by the tracker.

use serde::{Deserialize, Serialize};

use crate::models::{ExercisePatch, Phase, PhasePatch, PlanExercise, Session, SessionPatch};

/// Created, updated and deleted entities between two snapshots, split by
/// level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub created: Created,
    pub updated: Updated,
    pub deleted: Deleted,
}

/// Entities absent from the previous snapshot. Each entry carries the full
/// entity with its child collections emptied; children are listed in their
/// own level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Created {
    pub phases: Vec<Phase>,
    pub sessions: Vec<CreatedSession>,
    pub exercises: Vec<CreatedExercise>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedSession {
    pub phase_id: String,
    pub session: Session,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedExercise {
    pub session_id: String,
    pub exercise: PlanExercise,
}

/// Entities present in both snapshots with at least one tracked field
/// changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Updated {
    pub phases: Vec<EntityUpdate<PhasePatch>>,
    pub sessions: Vec<EntityUpdate<SessionPatch>>,
    pub exercises: Vec<EntityUpdate<ExercisePatch>>,
}

/// An entity id with a patch holding only the fields that differ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityUpdate<P> {
    pub id: String,
    pub patch: P,
}

/// Ids present in the previous snapshot and absent from the current one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deleted {
    pub phases: Vec<String>,
    pub sessions: Vec<String>,
    pub exercises: Vec<String>,
}

impl Created {
    pub fn len(&self) -> usize {
        self.phases.len() + self.sessions.len() + self.exercises.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Updated {
    pub fn len(&self) -> usize {
        self.phases.len() + self.sessions.len() + self.exercises.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Deleted {
    pub fn len(&self) -> usize {
        self.phases.len() + self.sessions.len() + self.exercises.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ChangeSet {
    /// Total number of entries across all buckets.
    pub fn len(&self) -> usize {
        self.created.len() + self.updated.len() + self.deleted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorts every bucket by entity id.
    pub(crate) fn normalize(&mut self) {
        self.created.phases.sort_by(|a, b| a.id.cmp(&b.id));
        self.created
            .sessions
            .sort_by(|a, b| a.session.id.cmp(&b.session.id));
        self.created
            .exercises
            .sort_by(|a, b| a.exercise.id.cmp(&b.exercise.id));
        self.updated.phases.sort_by(|a, b| a.id.cmp(&b.id));
        self.updated.sessions.sort_by(|a, b| a.id.cmp(&b.id));
        self.updated.exercises.sort_by(|a, b| a.id.cmp(&b.id));
        self.deleted.phases.sort();
        self.deleted.sessions.sort();
        self.deleted.exercises.sort();
    }
}
