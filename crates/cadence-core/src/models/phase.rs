//! Phase model definition and related functionality.

use serde::{Deserialize, Serialize};

use super::{mint_id, Session};

/// A training block within a plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Phase {
    /// Unique identifier for the phase
    pub id: String,

    /// ID of the parent plan
    pub plan_id: String,

    /// Name of the phase
    pub name: String,

    /// Position of the phase within the plan
    pub order: u32,

    /// Whether this is the plan's active phase (at most one per plan)
    #[serde(default)]
    pub is_active: bool,

    /// Whether the phase is expanded in the editor (UI-only)
    #[serde(default)]
    pub is_expanded: bool,

    /// Workout sessions of this phase
    #[serde(default)]
    pub sessions: Vec<Session>,
}

impl Phase {
    /// Creates an empty, inactive phase.
    pub fn new(
        id: impl Into<String>,
        plan_id: impl Into<String>,
        name: impl Into<String>,
        order: u32,
    ) -> Self {
        Self {
            id: id.into(),
            plan_id: plan_id.into(),
            name: name.into(),
            order,
            is_active: false,
            is_expanded: false,
            sessions: Vec::new(),
        }
    }

    pub fn session(&self, id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn session_mut(&mut self, id: &str) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|s| s.id == id)
    }

    /// Removes a session, returning it together with its former index.
    pub fn remove_session(&mut self, id: &str) -> Option<(usize, Session)> {
        let index = self.sessions.iter().position(|s| s.id == id)?;
        Some((index, self.sessions.remove(index)))
    }

    /// Inserts a session at `index`, clamped to the end of the list.
    pub fn insert_session(&mut self, index: usize, session: Session) {
        let index = index.min(self.sessions.len());
        self.sessions.insert(index, session);
    }

    /// Order value for a session appended after the existing ones.
    pub fn next_session_order(&self) -> u32 {
        self.sessions
            .iter()
            .map(|s| s.order.saturating_add(1))
            .max()
            .unwrap_or(0)
    }

    pub fn exercise_count(&self) -> usize {
        self.sessions.iter().map(|s| s.exercises.len()).sum()
    }

    /// Copies the phase and its whole subtree under fresh ids. Every session
    /// points at the new phase and every exercise at its new session. The
    /// copy is never active.
    pub fn duplicate(&self, order: u32) -> Phase {
        let id = mint_id();
        let sessions = self
            .sessions
            .iter()
            .map(|session| session.duplicate(&id, session.order))
            .collect();

        Phase {
            id,
            plan_id: self.plan_id.clone(),
            name: format!("{} (Copy)", self.name),
            order,
            is_active: false,
            is_expanded: self.is_expanded,
            sessions,
        }
    }

    /// A copy of the phase without its sessions.
    pub fn without_children(&self) -> Phase {
        Phase {
            id: self.id.clone(),
            plan_id: self.plan_id.clone(),
            name: self.name.clone(),
            order: self.order,
            is_active: self.is_active,
            is_expanded: self.is_expanded,
            sessions: Vec::new(),
        }
    }
}
