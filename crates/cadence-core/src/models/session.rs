//! Session model definition and related functionality.

use serde::{Deserialize, Serialize};

use super::{mint_id, OrderMarker, PlanExercise};

/// Seconds of work assumed per set when estimating a session's duration.
const WORK_SECONDS_PER_SET: u32 = 45;

/// Rest assumed between sets when an exercise prescribes none.
const DEFAULT_REST_SECONDS: u32 = 60;

/// A workout template within a phase.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    /// Unique identifier for the session
    pub id: String,

    /// ID of the parent phase
    pub phase_id: String,

    /// Name of the session
    pub name: String,

    /// Position of the session within its phase
    pub order: u32,

    /// Estimated duration in minutes (derived, not authoritative)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,

    /// Whether the session is expanded in the editor (UI-only)
    #[serde(default)]
    pub is_expanded: bool,

    /// Prescribed exercises
    #[serde(default)]
    pub exercises: Vec<PlanExercise>,
}

impl Session {
    /// Creates an empty session.
    pub fn new(
        id: impl Into<String>,
        phase_id: impl Into<String>,
        name: impl Into<String>,
        order: u32,
    ) -> Self {
        Self {
            id: id.into(),
            phase_id: phase_id.into(),
            name: name.into(),
            order,
            duration: None,
            is_expanded: false,
            exercises: Vec::new(),
        }
    }

    pub fn exercise(&self, id: &str) -> Option<&PlanExercise> {
        self.exercises.iter().find(|e| e.id == id)
    }

    pub fn exercise_mut(&mut self, id: &str) -> Option<&mut PlanExercise> {
        self.exercises.iter_mut().find(|e| e.id == id)
    }

    /// Removes an exercise, returning it together with its former index.
    pub fn remove_exercise(&mut self, id: &str) -> Option<(usize, PlanExercise)> {
        let index = self.exercises.iter().position(|e| e.id == id)?;
        Some((index, self.exercises.remove(index)))
    }

    /// Inserts an exercise at `index`, clamped to the end of the list.
    pub fn insert_exercise(&mut self, index: usize, exercise: PlanExercise) {
        let index = index.min(self.exercises.len());
        self.exercises.insert(index, exercise);
    }

    /// Exercises sorted by natural order of their markers.
    pub fn sorted_exercises(&self) -> Vec<&PlanExercise> {
        let mut exercises: Vec<&PlanExercise> = self.exercises.iter().collect();
        exercises.sort_by(|a, b| a.order.cmp(&b.order));
        exercises
    }

    /// The marker that follows the highest existing marker in the session.
    pub fn next_order_marker(&self) -> OrderMarker {
        OrderMarker::next_after(self.exercises.iter().map(|e| &e.order).max())
    }

    /// Re-estimates `duration` from the session's exercises.
    ///
    /// Each exercise contributes its set count times a fixed work interval
    /// plus its rest. Sessions without any set prescription get no duration.
    pub fn recompute_duration(&mut self) {
        let seconds: u32 = self
            .exercises
            .iter()
            .filter_map(|exercise| {
                let sets = exercise.effective_sets()?;
                let rest = exercise.effective_rest().unwrap_or(DEFAULT_REST_SECONDS);
                Some(sets.saturating_mul(WORK_SECONDS_PER_SET.saturating_add(rest)))
            })
            .fold(0, u32::saturating_add);

        self.duration = (seconds > 0).then(|| seconds.div_ceil(60));
    }

    /// Copies the session and all its exercises under fresh ids, attached to
    /// `phase_id`.
    pub fn duplicate(&self, phase_id: &str, order: u32) -> Session {
        let id = mint_id();
        let exercises = self
            .exercises
            .iter()
            .map(|exercise| PlanExercise {
                id: mint_id(),
                session_id: id.clone(),
                ..exercise.clone()
            })
            .collect();

        Session {
            id,
            phase_id: phase_id.to_string(),
            name: self.name.clone(),
            order,
            duration: self.duration,
            is_expanded: self.is_expanded,
            exercises,
        }
    }

    /// A copy of the session without its exercises.
    pub fn without_children(&self) -> Session {
        Session {
            id: self.id.clone(),
            phase_id: self.phase_id.clone(),
            name: self.name.clone(),
            order: self.order,
            duration: self.duration,
            is_expanded: self.is_expanded,
            exercises: Vec::new(),
        }
    }
}
