//! Mutation events handed to the transport.

use std::fmt;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::models::{ExercisePatch, Phase, PhasePatch, Plan, PlanExercise, Session, SessionPatch};

/// Level of the plan tree an event targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityLevel {
    Plan,
    Phase,
    Session,
    Exercise,
}

impl EntityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityLevel::Plan => "plan",
            EntityLevel::Phase => "phase",
            EntityLevel::Session => "session",
            EntityLevel::Exercise => "exercise",
        }
    }
}

impl fmt::Display for EntityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntityLevel::Plan => "Plan",
            EntityLevel::Phase => "Phase",
            EntityLevel::Session => "Session",
            EntityLevel::Exercise => "Exercise",
        };
        f.write_str(label)
    }
}

/// What an event does to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Create,
    Update,
    Delete,
    /// Create of a re-keyed copy; the payload carries the whole subtree and
    /// the server applies it atomically.
    Duplicate,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Create => "create",
            OperationKind::Update => "update",
            OperationKind::Delete => "delete",
            OperationKind::Duplicate => "duplicate",
        }
    }

    /// Whether the operation brings a new entity into existence.
    pub fn is_create(&self) -> bool {
        matches!(self, OperationKind::Create | OperationKind::Duplicate)
    }
}

/// Body of an event: a full entity, a partial patch, or the id to delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum MutationPayload {
    /// Plan attributes without phases
    Plan(Plan),
    Phase(Phase),
    PhasePatch { id: String, patch: PhasePatch },
    Session(Session),
    SessionPatch { id: String, patch: SessionPatch },
    Exercise(PlanExercise),
    ExercisePatch { id: String, patch: ExercisePatch },
    Delete { id: String },
}

/// One queued instruction for the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationEvent {
    /// Position in the client's causal order; assigned on submission
    #[serde(default)]
    pub sequence: u64,

    pub level: EntityLevel,

    pub kind: OperationKind,

    pub plan_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    pub payload: MutationPayload,

    /// User who performed the action
    pub actor_id: String,

    /// Last plan `updated_at` known to the client
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency_token: Option<Timestamp>,

    /// Sequence of an earlier event that must succeed before this one is
    /// delivered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<u64>,
}

impl MutationEvent {
    pub fn new(
        level: EntityLevel,
        kind: OperationKind,
        plan_id: impl Into<String>,
        payload: MutationPayload,
        actor_id: impl Into<String>,
    ) -> Self {
        Self {
            sequence: 0,
            level,
            kind,
            plan_id: plan_id.into(),
            phase_id: None,
            session_id: None,
            payload,
            actor_id: actor_id.into(),
            concurrency_token: None,
            depends_on: None,
        }
    }

    pub fn with_phase(mut self, phase_id: impl Into<String>) -> Self {
        self.phase_id = Some(phase_id.into());
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_token(mut self, token: Option<Timestamp>) -> Self {
        self.concurrency_token = token;
        self
    }

    pub fn depending_on(mut self, sequence: Option<u64>) -> Self {
        self.depends_on = sequence;
        self
    }

    /// Route name of the operation, e.g. `phase-duplicate`.
    pub fn operation(&self) -> String {
        format!("{}-{}", self.level.as_str(), self.kind.as_str())
    }

    /// Id of the entity the event targets.
    pub fn target_id(&self) -> &str {
        match &self.payload {
            MutationPayload::Plan(plan) => &plan.id,
            MutationPayload::Phase(phase) => &phase.id,
            MutationPayload::Session(session) => &session.id,
            MutationPayload::Exercise(exercise) => &exercise.id,
            MutationPayload::PhasePatch { id, .. }
            | MutationPayload::SessionPatch { id, .. }
            | MutationPayload::ExercisePatch { id, .. }
            | MutationPayload::Delete { id } => id,
        }
    }

    // Plan-level

    pub fn create_plan(plan: &Plan, actor_id: &str) -> Self {
        Self::new(
            EntityLevel::Plan,
            OperationKind::Create,
            &plan.id,
            MutationPayload::Plan(plan.without_children()),
            actor_id,
        )
    }

    // Phase-level

    pub fn create_phase(plan_id: &str, phase: &Phase, actor_id: &str) -> Self {
        Self::new(
            EntityLevel::Phase,
            OperationKind::Create,
            plan_id,
            MutationPayload::Phase(phase.clone()),
            actor_id,
        )
        .with_phase(&phase.id)
    }

    pub fn update_phase(plan_id: &str, phase_id: &str, patch: PhasePatch, actor_id: &str) -> Self {
        Self::new(
            EntityLevel::Phase,
            OperationKind::Update,
            plan_id,
            MutationPayload::PhasePatch {
                id: phase_id.to_string(),
                patch,
            },
            actor_id,
        )
        .with_phase(phase_id)
    }

    pub fn delete_phase(plan_id: &str, phase_id: &str, actor_id: &str) -> Self {
        Self::new(
            EntityLevel::Phase,
            OperationKind::Delete,
            plan_id,
            MutationPayload::Delete {
                id: phase_id.to_string(),
            },
            actor_id,
        )
        .with_phase(phase_id)
    }

    /// Carries the whole copied subtree in one event.
    pub fn duplicate_phase(plan_id: &str, copy: &Phase, actor_id: &str) -> Self {
        Self::new(
            EntityLevel::Phase,
            OperationKind::Duplicate,
            plan_id,
            MutationPayload::Phase(copy.clone()),
            actor_id,
        )
        .with_phase(&copy.id)
    }

    // Session-level

    pub fn create_session(plan_id: &str, phase_id: &str, session: &Session, actor_id: &str) -> Self {
        Self::new(
            EntityLevel::Session,
            OperationKind::Create,
            plan_id,
            MutationPayload::Session(session.clone()),
            actor_id,
        )
        .with_phase(phase_id)
        .with_session(&session.id)
    }

    pub fn update_session(
        plan_id: &str,
        phase_id: &str,
        session_id: &str,
        patch: SessionPatch,
        actor_id: &str,
    ) -> Self {
        Self::new(
            EntityLevel::Session,
            OperationKind::Update,
            plan_id,
            MutationPayload::SessionPatch {
                id: session_id.to_string(),
                patch,
            },
            actor_id,
        )
        .with_phase(phase_id)
        .with_session(session_id)
    }

    pub fn delete_session(plan_id: &str, phase_id: &str, session_id: &str, actor_id: &str) -> Self {
        Self::new(
            EntityLevel::Session,
            OperationKind::Delete,
            plan_id,
            MutationPayload::Delete {
                id: session_id.to_string(),
            },
            actor_id,
        )
        .with_phase(phase_id)
        .with_session(session_id)
    }

    /// Carries the copied session with all its exercises in one event.
    pub fn duplicate_session(plan_id: &str, phase_id: &str, copy: &Session, actor_id: &str) -> Self {
        Self::new(
            EntityLevel::Session,
            OperationKind::Duplicate,
            plan_id,
            MutationPayload::Session(copy.clone()),
            actor_id,
        )
        .with_phase(phase_id)
        .with_session(&copy.id)
    }

    // Exercise-level

    /// `session_id` is the session the exercise was found in, which wins
    /// over the exercise's own parent reference.
    pub fn create_exercise(
        plan_id: &str,
        phase_id: &str,
        session_id: &str,
        exercise: &PlanExercise,
        actor_id: &str,
    ) -> Self {
        Self::new(
            EntityLevel::Exercise,
            OperationKind::Create,
            plan_id,
            MutationPayload::Exercise(exercise.clone()),
            actor_id,
        )
        .with_phase(phase_id)
        .with_session(session_id)
    }

    pub fn update_exercise(
        plan_id: &str,
        phase_id: &str,
        session_id: &str,
        exercise_id: &str,
        patch: ExercisePatch,
        actor_id: &str,
    ) -> Self {
        Self::new(
            EntityLevel::Exercise,
            OperationKind::Update,
            plan_id,
            MutationPayload::ExercisePatch {
                id: exercise_id.to_string(),
                patch,
            },
            actor_id,
        )
        .with_phase(phase_id)
        .with_session(session_id)
    }

    pub fn delete_exercise(
        plan_id: &str,
        phase_id: &str,
        session_id: &str,
        exercise_id: &str,
        actor_id: &str,
    ) -> Self {
        Self::new(
            EntityLevel::Exercise,
            OperationKind::Delete,
            plan_id,
            MutationPayload::Delete {
                id: exercise_id.to_string(),
            },
            actor_id,
        )
        .with_phase(phase_id)
        .with_session(session_id)
    }
}
