//! Exercise actions for the Editor.

use super::{
    revert::Revert,
    validation::validate_exercise,
    Editor, Submission,
};
use crate::{
    error::{Result, SyncError},
    models::{mint_id, ExercisePatch, PlanExercise},
    mutation::{EntityLevel, MutationEvent, Transport},
};

/// Where an exercise sits in the tree.
struct ExerciseLocation {
    phase_id: String,
    session_id: String,
    index: usize,
}

impl<T: Transport> Editor<T> {
    /// Adds an exercise to a session.
    ///
    /// The draft's `id` and `session_id` are replaced; an empty order marker
    /// is replaced with the one following the session's last marker.
    pub fn add_exercise(&mut self, session_id: &str, draft: PlanExercise) -> Result<Submission> {
        let (phase_id, session) = self.locate_session(session_id)?;

        let order = if draft.order.is_empty() {
            session.next_order_marker()
        } else {
            draft.order.clone()
        };
        let exercise = PlanExercise {
            id: mint_id(),
            session_id: session_id.to_string(),
            order,
            ..draft
        };
        validate_exercise(&exercise)?;

        let event = MutationEvent::create_exercise(
            &self.plan.id,
            &phase_id,
            session_id,
            &exercise,
            &self.actor_id,
        );
        let revert = Revert::Created {
            level: EntityLevel::Exercise,
            id: exercise.id.clone(),
        };

        self.run_action(event, revert, vec![exercise.id.clone()], move |plan| {
            if let Some(session) = plan.session_mut(session_id) {
                if session.exercise(&exercise.id).is_none() {
                    session.exercises.push(exercise.clone());
                    session.recompute_duration();
                }
            }
        })
    }

    /// Applies `patch` to an exercise after validating the result.
    pub fn update_exercise(&mut self, id: &str, patch: ExercisePatch) -> Result<Submission> {
        if patch.is_empty() {
            return Ok(Submission::default());
        }
        let (location, current) = self.locate_exercise(id)?;

        let mut updated = current.clone();
        patch.apply_to(&mut updated);
        validate_exercise(&updated)?;

        let revert = Revert::ExerciseFields {
            id: id.to_string(),
            restore: ExercisePatch::between(&updated, current),
        };
        let event = MutationEvent::update_exercise(
            &self.plan.id,
            &location.phase_id,
            &location.session_id,
            id,
            patch.clone(),
            &self.actor_id,
        );

        self.run_action(event, revert, Vec::new(), |plan| {
            if let Some(session) = plan.exercise_session_mut(id) {
                if let Some(exercise) = session.exercise_mut(id) {
                    patch.apply_to(exercise);
                }
                session.recompute_duration();
            }
        })
    }

    pub fn delete_exercise(&mut self, id: &str) -> Result<Submission> {
        let (location, current) = self.locate_exercise(id)?;
        let revert = Revert::ExerciseRemoved {
            session_id: location.session_id.clone(),
            index: location.index,
            exercise: current.clone(),
        };
        let event = MutationEvent::delete_exercise(
            &self.plan.id,
            &location.phase_id,
            &location.session_id,
            id,
            &self.actor_id,
        );

        self.run_action(event, revert, Vec::new(), |plan| {
            if let Some(session) = plan.session_mut(&location.session_id) {
                session.remove_exercise(id);
                session.recompute_duration();
            }
        })
    }

    fn locate_exercise(&self, id: &str) -> Result<(ExerciseLocation, &PlanExercise)> {
        for phase in &self.plan.phases {
            for session in &phase.sessions {
                if let Some(index) = session.exercises.iter().position(|e| e.id == id) {
                    let location = ExerciseLocation {
                        phase_id: phase.id.clone(),
                        session_id: session.id.clone(),
                        index,
                    };
                    return Ok((location, &session.exercises[index]));
                }
            }
        }
        Err(SyncError::not_found(EntityLevel::Exercise, id))
    }
}
