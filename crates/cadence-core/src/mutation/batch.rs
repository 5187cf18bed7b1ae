//! Translation of a tracker diff into mutation events.

use std::collections::HashMap;

use log::warn;

use super::MutationEvent;
use crate::{models::Phase, tracker::ChangeTracker};

/// Parent ids of every session and exercise in one snapshot.
struct Parents<'a> {
    session_phase: HashMap<&'a str, &'a str>,
    exercise_session: HashMap<&'a str, &'a str>,
}

impl<'a> Parents<'a> {
    fn build(phases: &'a [Phase]) -> Self {
        let mut parents = Self {
            session_phase: HashMap::new(),
            exercise_session: HashMap::new(),
        };
        for phase in phases {
            for session in &phase.sessions {
                parents
                    .session_phase
                    .insert(session.id.as_str(), phase.id.as_str());
                for exercise in &session.exercises {
                    parents
                        .exercise_session
                        .insert(exercise.id.as_str(), session.id.as_str());
                }
            }
        }
        parents
    }

    fn phase_of_session(&self, session_id: &str) -> Option<&'a str> {
        self.session_phase.get(session_id).copied()
    }

    /// `(phase_id, session_id)` of an exercise.
    fn location_of_exercise(&self, exercise_id: &str) -> Option<(&'a str, &'a str)> {
        let session_id = self.exercise_session.get(exercise_id).copied()?;
        Some((self.phase_of_session(session_id)?, session_id))
    }
}

/// Builds the events that replay the tracker's latest change set.
///
/// Events come out in an order the server can apply one by one: creates
/// top-down (phases, sessions, exercises), then updates, then deletes
/// bottom-up (exercises, sessions, phases). Parent ids of created and updated
/// entities are looked up in the current snapshot, those of deleted entities
/// in the previous one.
pub fn events_from_changes(
    plan_id: &str,
    actor_id: &str,
    tracker: &ChangeTracker,
) -> Vec<MutationEvent> {
    let changes = tracker.changes();
    let current = Parents::build(tracker.current());
    let previous = Parents::build(tracker.previous());
    let mut events = Vec::with_capacity(changes.len());

    for phase in &changes.created.phases {
        events.push(MutationEvent::create_phase(plan_id, phase, actor_id));
    }
    for created in &changes.created.sessions {
        events.push(MutationEvent::create_session(
            plan_id,
            &created.phase_id,
            &created.session,
            actor_id,
        ));
    }
    for created in &changes.created.exercises {
        match current.phase_of_session(&created.session_id) {
            Some(phase_id) => events.push(MutationEvent::create_exercise(
                plan_id,
                phase_id,
                &created.session_id,
                &created.exercise,
                actor_id,
            )),
            None => warn!("No phase found for created exercise {}", created.exercise.id),
        }
    }

    for update in &changes.updated.phases {
        events.push(MutationEvent::update_phase(
            plan_id,
            &update.id,
            update.patch.clone(),
            actor_id,
        ));
    }
    for update in &changes.updated.sessions {
        match current.phase_of_session(&update.id) {
            Some(phase_id) => events.push(MutationEvent::update_session(
                plan_id,
                phase_id,
                &update.id,
                update.patch.clone(),
                actor_id,
            )),
            None => warn!("No phase found for updated session {}", update.id),
        }
    }
    for update in &changes.updated.exercises {
        match current.location_of_exercise(&update.id) {
            Some((phase_id, session_id)) => events.push(MutationEvent::update_exercise(
                plan_id,
                phase_id,
                session_id,
                &update.id,
                update.patch.clone(),
                actor_id,
            )),
            None => warn!("No session found for updated exercise {}", update.id),
        }
    }

    for exercise_id in &changes.deleted.exercises {
        match previous.location_of_exercise(exercise_id) {
            Some((phase_id, session_id)) => events.push(MutationEvent::delete_exercise(
                plan_id,
                phase_id,
                session_id,
                exercise_id,
                actor_id,
            )),
            None => warn!("No session found for deleted exercise {exercise_id}"),
        }
    }
    for session_id in &changes.deleted.sessions {
        match previous.phase_of_session(session_id) {
            Some(phase_id) => events.push(MutationEvent::delete_session(
                plan_id, phase_id, session_id, actor_id,
            )),
            None => warn!("No phase found for deleted session {session_id}"),
        }
    }
    for phase_id in &changes.deleted.phases {
        events.push(MutationEvent::delete_phase(plan_id, phase_id, actor_id));
    }

    events
}
