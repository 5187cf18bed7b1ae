//! Plan model definition and related functionality.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::{Phase, PlanExercise, Session};

/// Root of the training hierarchy: a plan owns phases, phases own sessions,
/// sessions own exercises.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Plan {
    /// Unique identifier for the plan
    pub id: String,

    /// Name of the plan
    pub name: String,

    /// ID of the client the plan is written for
    pub client_id: String,

    /// ID of the trainer who owns the plan
    pub trainer_id: String,

    #[serde(default)]
    pub is_active: bool,

    /// Last server-side modification (UTC). Doubles as the concurrency token;
    /// `None` while the plan has never been persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,

    /// Training phases
    #[serde(default)]
    pub phases: Vec<Phase>,
}

/// A parent reference that does not match the entity's container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingLink {
    pub entity_id: String,
    pub expected_parent: String,
    pub actual_parent: String,
}

impl Plan {
    /// Creates an empty, unpersisted plan.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        client_id: impl Into<String>,
        trainer_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            client_id: client_id.into(),
            trainer_id: trainer_id.into(),
            is_active: true,
            updated_at: None,
            phases: Vec::new(),
        }
    }

    pub fn phase(&self, id: &str) -> Option<&Phase> {
        self.phases.iter().find(|p| p.id == id)
    }

    pub fn phase_mut(&mut self, id: &str) -> Option<&mut Phase> {
        self.phases.iter_mut().find(|p| p.id == id)
    }

    /// Removes a phase, returning it together with its former index.
    pub fn remove_phase(&mut self, id: &str) -> Option<(usize, Phase)> {
        let index = self.phases.iter().position(|p| p.id == id)?;
        Some((index, self.phases.remove(index)))
    }

    /// Inserts a phase at `index`, clamped to the end of the list.
    pub fn insert_phase(&mut self, index: usize, phase: Phase) {
        let index = index.min(self.phases.len());
        self.phases.insert(index, phase);
    }

    /// Finds a session anywhere in the plan.
    pub fn session(&self, id: &str) -> Option<&Session> {
        self.phases.iter().find_map(|p| p.session(id))
    }

    /// Finds a session anywhere in the plan, mutably.
    pub fn session_mut(&mut self, id: &str) -> Option<&mut Session> {
        self.phases.iter_mut().find_map(|p| p.session_mut(id))
    }

    /// Finds an exercise anywhere in the plan.
    pub fn exercise(&self, id: &str) -> Option<&PlanExercise> {
        self.phases
            .iter()
            .flat_map(|p| &p.sessions)
            .find_map(|s| s.exercise(id))
    }

    /// The session holding exercise `exercise_id`.
    pub fn exercise_session_mut(&mut self, exercise_id: &str) -> Option<&mut Session> {
        self.phases
            .iter_mut()
            .flat_map(|p| p.sessions.iter_mut())
            .find(|s| s.exercise(exercise_id).is_some())
    }

    /// The phase currently marked active, if any.
    pub fn active_phase(&self) -> Option<&Phase> {
        self.phases.iter().find(|p| p.is_active)
    }

    /// Order value for a phase appended after the existing ones.
    pub fn next_phase_order(&self) -> u32 {
        self.phases
            .iter()
            .map(|p| p.order.saturating_add(1))
            .max()
            .unwrap_or(0)
    }

    /// Total number of phases, sessions and exercises.
    pub fn entity_count(&self) -> usize {
        self.phases
            .iter()
            .map(|p| 1 + p.sessions.len() + p.exercise_count())
            .sum()
    }

    /// A copy of the plan without its phases.
    pub fn without_children(&self) -> Plan {
        Plan {
            id: self.id.clone(),
            name: self.name.clone(),
            client_id: self.client_id.clone(),
            trainer_id: self.trainer_id.clone(),
            is_active: self.is_active,
            updated_at: self.updated_at,
            phases: Vec::new(),
        }
    }

    /// Lists every phase, session and exercise whose parent id does not
    /// match the container it lives in.
    pub fn validate_links(&self) -> Vec<DanglingLink> {
        let mut dangling = Vec::new();

        for phase in &self.phases {
            if phase.plan_id != self.id {
                dangling.push(DanglingLink {
                    entity_id: phase.id.clone(),
                    expected_parent: self.id.clone(),
                    actual_parent: phase.plan_id.clone(),
                });
            }
            for session in &phase.sessions {
                if session.phase_id != phase.id {
                    dangling.push(DanglingLink {
                        entity_id: session.id.clone(),
                        expected_parent: phase.id.clone(),
                        actual_parent: session.phase_id.clone(),
                    });
                }
                for exercise in &session.exercises {
                    if exercise.session_id != session.id {
                        dangling.push(DanglingLink {
                            entity_id: exercise.id.clone(),
                            expected_parent: session.id.clone(),
                            actual_parent: exercise.session_id.clone(),
                        });
                    }
                }
            }
        }

        dangling
    }
}
