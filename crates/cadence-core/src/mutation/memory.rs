//! In-process transport with a server-side copy of each plan.
//!
//! [`MemoryTransport`] behaves like the remote persistence service: it keeps
//! its own plan trees, enforces optimistic concurrency on the plan's
//! `updated_at`, and applies each event atomically. Tests and demos use it to
//! exercise the queue and the editor without a network.

use std::{
    collections::{HashMap, VecDeque},
    future::Future,
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use jiff::{SignedDuration, Timestamp};
use log::debug;

use super::{EntityLevel, MutationEvent, MutationPayload, OperationKind, Transport, TransportResponse};
use crate::models::{Phase, Plan, Session};

#[derive(Debug, Default)]
struct ServerState {
    plans: HashMap<String, Plan>,
    failures: VecDeque<String>,
    deliveries: Vec<MutationEvent>,
}

/// A [`Transport`] that applies events to an in-memory store.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    state: Mutex<ServerState>,
    latency: Option<Duration>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every delivery by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Stores `plan` as already persisted and returns its `updated_at`.
    pub fn seed(&self, mut plan: Plan) -> Timestamp {
        let mut state = self.lock();
        let previous = state.plans.get(&plan.id).and_then(|p| p.updated_at);
        let updated_at = next_timestamp(previous);
        plan.updated_at = Some(updated_at);
        state.plans.insert(plan.id.clone(), plan);
        updated_at
    }

    /// The server's copy of a plan.
    pub fn plan(&self, plan_id: &str) -> Option<Plan> {
        self.lock().plans.get(plan_id).cloned()
    }

    /// Makes the next delivery fail with `message`, whatever it carries.
    pub fn fail_next(&self, message: impl Into<String>) {
        self.lock().failures.push_back(message.into());
    }

    /// Bumps a plan's `updated_at` as if another editor had saved it.
    pub fn touch(&self, plan_id: &str) -> Option<Timestamp> {
        let mut state = self.lock();
        let plan = state.plans.get_mut(plan_id)?;
        let updated_at = next_timestamp(plan.updated_at);
        plan.updated_at = Some(updated_at);
        Some(updated_at)
    }

    /// Every event received so far, in arrival order.
    pub fn deliveries(&self) -> Vec<MutationEvent> {
        self.lock().deliveries.clone()
    }

    pub fn delivery_count(&self) -> usize {
        self.lock().deliveries.len()
    }

    fn lock(&self) -> MutexGuard<'_, ServerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn handle(&self, event: &MutationEvent) -> TransportResponse {
        let mut state = self.lock();
        state.deliveries.push(event.clone());

        if let Some(message) = state.failures.pop_front() {
            return TransportResponse::Failed { message };
        }

        if let (EntityLevel::Plan, OperationKind::Create, MutationPayload::Plan(plan)) =
            (event.level, event.kind, &event.payload)
        {
            if state.plans.contains_key(&plan.id) {
                return TransportResponse::Failed {
                    message: format!("Plan {} already exists", plan.id),
                };
            }
            let updated_at = next_timestamp(None);
            let mut stored = plan.without_children();
            stored.updated_at = Some(updated_at);
            state.plans.insert(stored.id.clone(), stored);
            return TransportResponse::Acknowledged { updated_at };
        }

        let Some(plan) = state.plans.get_mut(&event.plan_id) else {
            return TransportResponse::Failed {
                message: format!("Plan {} not found", event.plan_id),
            };
        };

        if let Some(server_updated_at) = plan.updated_at {
            if event.concurrency_token != Some(server_updated_at) {
                return TransportResponse::Conflict {
                    server_updated_at,
                    message: "Plan was modified by someone else".to_string(),
                };
            }
        }

        // Apply to a scratch copy so a rejected event leaves no trace
        let mut draft = plan.clone();
        if let Err(message) = apply(&mut draft, event) {
            return TransportResponse::Failed { message };
        }

        let updated_at = next_timestamp(plan.updated_at);
        draft.updated_at = Some(updated_at);
        *plan = draft;
        debug!("Applied {} to plan {}", event.operation(), event.plan_id);
        TransportResponse::Acknowledged { updated_at }
    }
}

impl Transport for MemoryTransport {
    fn deliver(&self, event: &MutationEvent) -> impl Future<Output = TransportResponse> + Send {
        async move {
            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }
            self.handle(event)
        }
    }
}

/// A timestamp strictly later than `previous`.
fn next_timestamp(previous: Option<Timestamp>) -> Timestamp {
    let now = Timestamp::now();
    match previous.and_then(|p| p.checked_add(SignedDuration::from_millis(1)).ok()) {
        Some(floor) if floor > now => floor,
        _ => now,
    }
}

fn apply(plan: &mut Plan, event: &MutationEvent) -> Result<(), String> {
    let phase_id = event.phase_id.as_deref();
    let session_id = event.session_id.as_deref();

    match (event.level, &event.payload) {
        (EntityLevel::Phase, MutationPayload::Phase(phase)) if event.kind.is_create() => {
            if plan.phase(&phase.id).is_some() {
                return Err(format!("Phase {} already exists", phase.id));
            }
            if phase.is_active {
                deactivate_phases(&mut plan.phases);
            }
            plan.phases.push(phase.clone());
        }
        (EntityLevel::Phase, MutationPayload::PhasePatch { id, patch }) => {
            if patch.is_active == Some(true) {
                deactivate_phases(&mut plan.phases);
            }
            let phase = plan.phase_mut(id).ok_or_else(|| missing("Phase", id))?;
            patch.apply_to(phase);
        }
        (EntityLevel::Phase, MutationPayload::Delete { id }) => {
            plan.remove_phase(id).ok_or_else(|| missing("Phase", id))?;
        }
        (EntityLevel::Session, MutationPayload::Session(session)) if event.kind.is_create() => {
            let parent = phase_id.unwrap_or(session.phase_id.as_str());
            let phase = plan.phase_mut(parent).ok_or_else(|| missing("Phase", parent))?;
            if phase.session(&session.id).is_some() {
                return Err(format!("Session {} already exists", session.id));
            }
            phase.sessions.push(session.clone());
        }
        (EntityLevel::Session, MutationPayload::SessionPatch { id, patch }) => {
            let session = plan.session_mut(id).ok_or_else(|| missing("Session", id))?;
            patch.apply_to(session);
        }
        (EntityLevel::Session, MutationPayload::Delete { id }) => {
            let removed = plan
                .phases
                .iter_mut()
                .filter(|p| phase_id.map_or(true, |parent| p.id == parent))
                .find_map(|p| p.remove_session(id));
            removed.ok_or_else(|| missing("Session", id))?;
        }
        (EntityLevel::Exercise, MutationPayload::Exercise(exercise)) if event.kind.is_create() => {
            let parent = session_id.unwrap_or(exercise.session_id.as_str());
            let session = plan.session_mut(parent).ok_or_else(|| missing("Session", parent))?;
            if session.exercise(&exercise.id).is_some() {
                return Err(format!("Exercise {} already exists", exercise.id));
            }
            session.exercises.push(exercise.clone());
            session.recompute_duration();
        }
        (EntityLevel::Exercise, MutationPayload::ExercisePatch { id, patch }) => {
            let session = exercise_session(plan, session_id, id)?;
            if let Some(exercise) = session.exercise_mut(id) {
                patch.apply_to(exercise);
            }
            session.recompute_duration();
        }
        (EntityLevel::Exercise, MutationPayload::Delete { id }) => {
            let session = exercise_session(plan, session_id, id)?;
            session.remove_exercise(id);
            session.recompute_duration();
        }
        _ => return Err(format!("Unsupported payload for {}", event.operation())),
    }

    Ok(())
}

fn deactivate_phases(phases: &mut [Phase]) {
    for phase in phases {
        phase.is_active = false;
    }
}

fn exercise_session<'a>(
    plan: &'a mut Plan,
    session_id: Option<&str>,
    exercise_id: &str,
) -> Result<&'a mut Session, String> {
    plan.phases
        .iter_mut()
        .flat_map(|p| p.sessions.iter_mut())
        .filter(|s| session_id.map_or(true, |parent| s.id == parent))
        .find(|s| s.exercise(exercise_id).is_some())
        .ok_or_else(|| missing("Exercise", exercise_id))
}

fn missing(level: &str, id: &str) -> String {
    format!("{level} {id} not found")
}
