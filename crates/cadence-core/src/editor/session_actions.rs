//! Session actions for the Editor.

use super::{revert::Revert, validation::validate_name, Editor, Submission};
use crate::{
    error::{Result, SyncError},
    models::{mint_id, Session, SessionPatch},
    mutation::{EntityLevel, MutationEvent, Transport},
};

impl<T: Transport> Editor<T> {
    /// Appends an empty session to a phase.
    pub fn add_session(&mut self, phase_id: &str, name: &str) -> Result<Submission> {
        validate_name("name", name)?;
        let phase = self.ensure_phase(phase_id)?;

        let session = Session::new(mint_id(), phase_id, name.trim(), phase.next_session_order());
        let event =
            MutationEvent::create_session(&self.plan.id, phase_id, &session, &self.actor_id);
        let revert = Revert::Created {
            level: EntityLevel::Session,
            id: session.id.clone(),
        };

        self.run_action(event, revert, vec![session.id.clone()], move |plan| {
            if let Some(phase) = plan.phase_mut(phase_id) {
                if phase.session(&session.id).is_none() {
                    phase.sessions.push(session.clone());
                }
            }
        })
    }

    pub fn rename_session(&mut self, id: &str, name: &str) -> Result<Submission> {
        validate_name("name", name)?;
        let name = name.trim();
        let (phase_id, session) = self.locate_session(id)?;
        if session.name == name {
            return Ok(Submission::default());
        }

        let restore = SessionPatch {
            name: Some(session.name.clone()),
            ..Default::default()
        };
        let patch = SessionPatch {
            name: Some(name.to_string()),
            ..Default::default()
        };
        let event = MutationEvent::update_session(
            &self.plan.id,
            &phase_id,
            id,
            patch.clone(),
            &self.actor_id,
        );
        let revert = Revert::SessionFields {
            id: id.to_string(),
            restore,
        };

        self.run_action(event, revert, Vec::new(), |plan| {
            if let Some(session) = plan.session_mut(id) {
                patch.apply_to(session);
            }
        })
    }

    /// Flips the UI-only expanded flag. Nothing is queued.
    pub fn toggle_session_expanded(&mut self, id: &str) -> Result<bool> {
        let (_, session) = self.locate_session(id)?;
        let expanded = !session.is_expanded;
        self.apply_local(|plan| {
            if let Some(session) = plan.session_mut(id) {
                session.is_expanded = expanded;
            }
        });
        Ok(expanded)
    }

    /// Removes a session with all its exercises.
    pub fn delete_session(&mut self, id: &str) -> Result<Submission> {
        let (phase_id, _) = self.locate_session(id)?;
        let Some((index, session)) = self
            .plan
            .phase(&phase_id)
            .and_then(|phase| phase.sessions.iter().enumerate().find(|(_, s)| s.id == id))
            .map(|(index, session)| (index, session.clone()))
        else {
            return Err(SyncError::not_found(EntityLevel::Session, id));
        };

        let event = MutationEvent::delete_session(&self.plan.id, &phase_id, id, &self.actor_id);
        let revert = Revert::SessionRemoved {
            phase_id: phase_id.clone(),
            index,
            session,
        };

        self.run_action(event, revert, Vec::new(), |plan| {
            if let Some(phase) = plan.phase_mut(&phase_id) {
                phase.remove_session(id);
            }
        })
    }

    /// Appends a re-keyed copy of a session and its exercises to the same
    /// phase, sent as a single duplicate event.
    pub fn duplicate_session(&mut self, id: &str) -> Result<Submission> {
        let (phase_id, session) = self.locate_session(id)?;
        let order = self
            .plan
            .phase(&phase_id)
            .map_or(0, |phase| phase.next_session_order());
        let copy = session.duplicate(&phase_id, order);

        let event =
            MutationEvent::duplicate_session(&self.plan.id, &phase_id, &copy, &self.actor_id);
        let revert = Revert::Created {
            level: EntityLevel::Session,
            id: copy.id.clone(),
        };
        let created = std::iter::once(copy.id.clone())
            .chain(copy.exercises.iter().map(|e| e.id.clone()))
            .collect();

        self.run_action(event, revert, created, move |plan| {
            if let Some(phase) = plan.phase_mut(&phase_id) {
                if phase.session(&copy.id).is_none() {
                    phase.sessions.push(copy.clone());
                }
            }
        })
    }

    /// Finds a session and the id of the phase holding it.
    pub(crate) fn locate_session(&self, id: &str) -> Result<(String, &Session)> {
        self.plan
            .phases
            .iter()
            .find_map(|phase| phase.session(id).map(|s| (phase.id.clone(), s)))
            .ok_or_else(|| SyncError::not_found(EntityLevel::Session, id))
    }
}
