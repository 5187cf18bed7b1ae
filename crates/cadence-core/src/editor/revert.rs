//! Undo records for optimistic edits.

use crate::{
    models::{ExercisePatch, Phase, PhasePatch, Plan, PlanExercise, Session, SessionPatch},
    mutation::EntityLevel,
};

/// What to undo if the event carrying an optimistic edit does not succeed.
///
/// Records address entities by id, so undoing one action leaves unrelated
/// edits made since then untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Revert {
    /// The plan-create was not acknowledged; the plan stays unpersisted
    PlanCreated,
    /// Remove an entity (and its subtree) that was created locally
    Created { level: EntityLevel, id: String },
    PhaseRemoved { index: usize, phase: Phase },
    SessionRemoved {
        phase_id: String,
        index: usize,
        session: Session,
    },
    ExerciseRemoved {
        session_id: String,
        index: usize,
        exercise: PlanExercise,
    },
    /// Patches that write the previous field values back
    PhaseFields { id: String, restore: PhasePatch },
    SessionFields { id: String, restore: SessionPatch },
    ExerciseFields { id: String, restore: ExercisePatch },
    /// Restore the phase that was active before an activation
    PhaseActivation { previous: Option<String> },
}

impl Revert {
    /// Undoes the edit on `plan`. Returns `false` when the target is gone,
    /// e.g. because a later action removed it.
    pub(crate) fn undo(self, plan: &mut Plan) -> bool {
        match self {
            Revert::PlanCreated => true,
            Revert::Created { level, id } => remove(plan, level, &id),
            Revert::PhaseRemoved { index, phase } => {
                if plan.phase(&phase.id).is_some() {
                    return false;
                }
                plan.insert_phase(index, phase);
                true
            }
            Revert::SessionRemoved {
                phase_id,
                index,
                session,
            } => match plan.phase_mut(&phase_id) {
                Some(phase) if phase.session(&session.id).is_none() => {
                    phase.insert_session(index, session);
                    true
                }
                _ => false,
            },
            Revert::ExerciseRemoved {
                session_id,
                index,
                exercise,
            } => match plan.session_mut(&session_id) {
                Some(session) if session.exercise(&exercise.id).is_none() => {
                    session.insert_exercise(index, exercise);
                    session.recompute_duration();
                    true
                }
                _ => false,
            },
            Revert::PhaseFields { id, restore } => match plan.phase_mut(&id) {
                Some(phase) => {
                    restore.apply_to(phase);
                    true
                }
                None => false,
            },
            Revert::SessionFields { id, restore } => match plan.session_mut(&id) {
                Some(session) => {
                    restore.apply_to(session);
                    true
                }
                None => false,
            },
            Revert::ExerciseFields { id, restore } => match plan.exercise_session_mut(&id) {
                Some(session) => {
                    if let Some(exercise) = session.exercise_mut(&id) {
                        restore.apply_to(exercise);
                    }
                    session.recompute_duration();
                    true
                }
                None => false,
            },
            Revert::PhaseActivation { previous } => {
                for phase in &mut plan.phases {
                    phase.is_active = previous.as_deref() == Some(phase.id.as_str());
                }
                true
            }
        }
    }
}

fn remove(plan: &mut Plan, level: EntityLevel, id: &str) -> bool {
    match level {
        EntityLevel::Plan => false,
        EntityLevel::Phase => plan.remove_phase(id).is_some(),
        EntityLevel::Session => plan
            .phases
            .iter_mut()
            .find_map(|p| p.remove_session(id))
            .is_some(),
        EntityLevel::Exercise => match plan.exercise_session_mut(id) {
            Some(session) => {
                session.remove_exercise(id);
                session.recompute_duration();
                true
            }
            None => false,
        },
    }
}
