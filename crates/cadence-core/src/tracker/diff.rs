//! Two-pass, id-keyed diff of phase trees.

use std::collections::{HashMap, HashSet};

use super::{ChangeSet, CreatedExercise, CreatedSession, EntityUpdate, TrackerOptions};
use crate::models::{ExercisePatch, Phase, PhasePatch, PlanExercise, Session, SessionPatch};

/// Every entity of one snapshot keyed by id, with the parent id it was found
/// under.
struct TreeIndex<'a> {
    phases: HashMap<&'a str, &'a Phase>,
    sessions: HashMap<&'a str, (&'a Session, &'a str)>,
    exercises: HashMap<&'a str, (&'a PlanExercise, &'a str)>,
}

impl<'a> TreeIndex<'a> {
    fn build(phases: &'a [Phase]) -> Self {
        let mut index = Self {
            phases: HashMap::with_capacity(phases.len()),
            sessions: HashMap::new(),
            exercises: HashMap::new(),
        };

        for phase in phases {
            index.phases.insert(phase.id.as_str(), phase);
            for session in &phase.sessions {
                index
                    .sessions
                    .insert(session.id.as_str(), (session, phase.id.as_str()));
                for exercise in &session.exercises {
                    index
                        .exercises
                        .insert(exercise.id.as_str(), (exercise, session.id.as_str()));
                }
            }
        }

        index
    }
}

/// Ids encountered while walking the current snapshot.
#[derive(Default)]
struct SeenIds<'a> {
    phases: HashSet<&'a str>,
    sessions: HashSet<&'a str>,
    exercises: HashSet<&'a str>,
}

/// Computes the change set that turns `previous` into `current`.
///
/// One pass indexes the previous tree, one pass walks the current tree
/// classifying each entity as created or updated, and the deletions fall out
/// of the previous index minus the ids seen. Every bucket is sorted by id so
/// the result does not depend on sibling order.
///
/// Parent ids and the numeric order of phases and sessions are not part of
/// any patch: an entity moved to another parent or reordered among its
/// siblings produces no entry.
pub fn diff_phases(previous: &[Phase], current: &[Phase], options: TrackerOptions) -> ChangeSet {
    let before = TreeIndex::build(previous);
    let mut seen = SeenIds::default();
    let mut changes = ChangeSet::default();

    for phase in current {
        seen.phases.insert(phase.id.as_str());
        match before.phases.get(phase.id.as_str()) {
            None => changes.created.phases.push(phase.without_children()),
            Some(old) => {
                let patch = PhasePatch::between(old, phase, options.track_ui_fields);
                if !patch.is_empty() {
                    changes.updated.phases.push(EntityUpdate {
                        id: phase.id.clone(),
                        patch,
                    });
                }
            }
        }

        for session in &phase.sessions {
            seen.sessions.insert(session.id.as_str());
            match before.sessions.get(session.id.as_str()) {
                None => changes.created.sessions.push(CreatedSession {
                    phase_id: phase.id.clone(),
                    session: session.without_children(),
                }),
                Some((old, _)) => {
                    let patch = SessionPatch::between(old, session, options.track_ui_fields);
                    if !patch.is_empty() {
                        changes.updated.sessions.push(EntityUpdate {
                            id: session.id.clone(),
                            patch,
                        });
                    }
                }
            }

            for exercise in &session.exercises {
                seen.exercises.insert(exercise.id.as_str());
                match before.exercises.get(exercise.id.as_str()) {
                    None => changes.created.exercises.push(CreatedExercise {
                        session_id: session.id.clone(),
                        exercise: exercise.clone(),
                    }),
                    Some((old, _)) => {
                        let patch = ExercisePatch::between(old, exercise);
                        if !patch.is_empty() {
                            changes.updated.exercises.push(EntityUpdate {
                                id: exercise.id.clone(),
                                patch,
                            });
                        }
                    }
                }
            }
        }
    }

    changes.deleted.phases = missing(&before.phases, &seen.phases);
    changes.deleted.sessions = missing(&before.sessions, &seen.sessions);
    changes.deleted.exercises = missing(&before.exercises, &seen.exercises);

    changes.normalize();
    changes
}

/// Ids of the previous index that were not seen in the current tree.
fn missing<V>(previous: &HashMap<&str, V>, seen: &HashSet<&str>) -> Vec<String> {
    previous
        .keys()
        .filter(|id| !seen.contains(*id))
        .map(|id| id.to_string())
        .collect()
}
