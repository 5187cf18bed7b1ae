//! Phase actions for the Editor.

use super::{revert::Revert, validation::validate_name, Editor, Submission};
use crate::{
    error::{Result, SyncError},
    models::{mint_id, Phase, PhasePatch},
    mutation::{EntityLevel, MutationEvent, Transport},
};

impl<T: Transport> Editor<T> {
    /// Appends a new, inactive phase.
    ///
    /// On a plan that was never persisted this queues the plan-create first
    /// and makes the phase-create depend on it.
    pub fn add_phase(&mut self, name: &str) -> Result<Submission> {
        validate_name("name", name)?;

        let phase = Phase::new(
            mint_id(),
            &self.plan.id,
            name.trim(),
            self.plan.next_phase_order(),
        );
        let event = MutationEvent::create_phase(&self.plan.id, &phase, &self.actor_id);
        let revert = Revert::Created {
            level: EntityLevel::Phase,
            id: phase.id.clone(),
        };

        self.run_action(event, revert, vec![phase.id.clone()], move |plan| {
            if plan.phase(&phase.id).is_none() {
                plan.phases.push(phase.clone());
            }
        })
    }

    pub fn rename_phase(&mut self, id: &str, name: &str) -> Result<Submission> {
        validate_name("name", name)?;
        let name = name.trim();
        let phase = self.ensure_phase(id)?;
        if phase.name == name {
            return Ok(Submission::default());
        }

        let restore = PhasePatch {
            name: Some(phase.name.clone()),
            ..Default::default()
        };
        let patch = PhasePatch {
            name: Some(name.to_string()),
            ..Default::default()
        };
        let event = MutationEvent::update_phase(&self.plan.id, id, patch.clone(), &self.actor_id);
        let revert = Revert::PhaseFields {
            id: id.to_string(),
            restore,
        };

        self.run_action(event, revert, Vec::new(), |plan| {
            if let Some(phase) = plan.phase_mut(id) {
                patch.apply_to(phase);
            }
        })
    }

    /// Makes `id` the only active phase of the plan.
    ///
    /// Refused with [`SyncError::Conflicted`](crate::SyncError::Conflicted)
    /// while a conflict is unresolved.
    pub fn set_phase_active(&mut self, id: &str) -> Result<Submission> {
        self.conflict.ensure_clean()?;
        let phase = self.ensure_phase(id)?;
        if phase.is_active {
            return Ok(Submission::default());
        }

        let previous = self.plan.active_phase().map(|p| p.id.clone());
        let patch = PhasePatch {
            is_active: Some(true),
            ..Default::default()
        };
        let event = MutationEvent::update_phase(&self.plan.id, id, patch, &self.actor_id);

        self.run_action(event, Revert::PhaseActivation { previous }, Vec::new(), |plan| {
            for phase in &mut plan.phases {
                phase.is_active = phase.id == id;
            }
        })
    }

    /// Flips the UI-only expanded flag. Nothing is queued. Returns the new
    /// value.
    pub fn toggle_phase_expanded(&mut self, id: &str) -> Result<bool> {
        let expanded = !self.ensure_phase(id)?.is_expanded;
        self.apply_local(|plan| {
            if let Some(phase) = plan.phase_mut(id) {
                phase.is_expanded = expanded;
            }
        });
        Ok(expanded)
    }

    /// Removes a phase with all its sessions and exercises.
    pub fn delete_phase(&mut self, id: &str) -> Result<Submission> {
        let index = self
            .plan
            .phases
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| SyncError::not_found(EntityLevel::Phase, id))?;

        let event = MutationEvent::delete_phase(&self.plan.id, id, &self.actor_id);
        let revert = Revert::PhaseRemoved {
            index,
            phase: self.plan.phases[index].clone(),
        };

        self.run_action(event, revert, Vec::new(), |plan| {
            plan.remove_phase(id);
        })
    }

    /// Appends a re-keyed copy of a phase and its subtree, sent as a single
    /// duplicate event.
    pub fn duplicate_phase(&mut self, id: &str) -> Result<Submission> {
        let copy = self
            .ensure_phase(id)?
            .duplicate(self.plan.next_phase_order());

        let event = MutationEvent::duplicate_phase(&self.plan.id, &copy, &self.actor_id);
        let revert = Revert::Created {
            level: EntityLevel::Phase,
            id: copy.id.clone(),
        };
        let created = std::iter::once(copy.id.clone())
            .chain(copy.sessions.iter().flat_map(|session| {
                std::iter::once(session.id.clone())
                    .chain(session.exercises.iter().map(|e| e.id.clone()))
            }))
            .collect();

        self.run_action(event, revert, created, move |plan| {
            if plan.phase(&copy.id).is_none() {
                plan.phases.push(copy.clone());
            }
        })
    }
}
