//! The plan editor: explicit owner of the tree and everything derived from
//! it.
//!
//! An [`Editor`] holds the [`Plan`], the [`ChangeTracker`] baseline, the
//! [`MutationQueue`], the conflict state and one undo record per event in
//! flight. Nothing else keeps a reference to the tree.
//!
//! Two ways to get edits to the server:
//!
//! - **Actions** (`add_phase`, `rename_session`, `delete_exercise`, ...)
//!   validate their input, apply the change optimistically, queue exactly one
//!   event and return a [`Submission`]. The very first phase of a plan that
//!   was never persisted is preceded by a plan-create the phase-create
//!   depends on.
//! - **Diff sync**: free-form changes made through [`Editor::edit`] are
//!   diffed against the baseline and queued by [`Editor::sync_changes`].
//!
//! Either way, [`Editor::settle`] (or [`Editor::finish`]) consumes the
//! outcome of each event: success advances the plan's `updated_at`; any
//! failure undoes exactly that event's optimistic change, and a stale-token
//! rejection additionally moves the editor into [`ConflictState::Conflicted`].
//! A [`Submission`] may also be dropped to let its events run detached; their
//! outcomes are settled by [`Editor::settle_ready`] or
//! [`Editor::settle_next_detached`].
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use cadence_core::{
//!     editor::EditorBuilder,
//!     models::Plan,
//!     mutation::MemoryTransport,
//! };
//!
//! # async fn example() -> cadence_core::Result<()> {
//! let transport = Arc::new(MemoryTransport::new());
//! let plan = Plan::new("plan-1", "Off-season", "client-1", "coach-1");
//! let mut editor = EditorBuilder::new(plan, "coach-1")
//!     .build(Arc::clone(&transport))
//!     .await?;
//!
//! let submission = editor.add_phase("Base")?;
//! editor.finish(submission).await?;
//!
//! assert!(editor.plan().updated_at.is_some());
//! assert_eq!(transport.plan("plan-1").unwrap().phases.len(), 1);
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;

use log::{debug, info, warn};
use tokio::sync::mpsc;

use crate::{
    conflict::{ConflictState, Resolution},
    error::{Result, SyncError},
    models::{ExercisePatch, Phase, PhasePatch, Plan, SessionPatch},
    mutation::{
        events_from_changes, EntityLevel, MutationEvent, MutationPayload, MutationQueue,
        Outcome, Pending, Transport,
    },
    tracker::{diff_phases, ChangeSet, ChangeTracker, TrackerOptions},
};

pub mod builder;
pub mod exercise_actions;
pub mod phase_actions;
pub(crate) mod revert;
pub mod session_actions;
pub(crate) mod validation;


pub use builder::{default_outbox_path, EditorBuilder};
use revert::Revert;

/// Events queued by one editor call.
///
/// Dropping it detaches the events; they are still delivered.
#[derive(Debug, Default)]
pub struct Submission {
    entity_id: Option<String>,
    pendings: Vec<Pending>,
}

impl Submission {
    /// Id of the entity the call created, if it created one.
    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn sequences(&self) -> Vec<u64> {
        self.pendings.iter().map(Pending::sequence).collect()
    }

    pub fn len(&self) -> usize {
        self.pendings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pendings.is_empty()
    }

    /// Waits for every event, in submission order.
    pub async fn outcomes(self) -> Vec<Outcome> {
        let mut outcomes = Vec::with_capacity(self.pendings.len());
        for pending in self.pendings {
            outcomes.push(pending.outcome().await);
        }
        outcomes
    }
}

/// Owner of a plan being edited.
pub struct Editor<T: Transport> {
    plan: Plan,
    actor_id: String,
    tracker: ChangeTracker,
    queue: MutationQueue<T>,
    conflict: ConflictState,
    /// Undo record per in-flight event sequence
    reverts: HashMap<u64, Option<Revert>>,
    /// Entities whose create event is not acknowledged yet
    unacknowledged: HashMap<String, u64>,
    plan_create: Option<u64>,
    /// Outcomes of events whose submission was dropped
    detached: mpsc::UnboundedReceiver<Outcome>,
}

impl<T: Transport> Editor<T> {
    /// Takes ownership of `plan`. Fails with `SyncError::Validation` when a
    /// phase, session or exercise names a parent other than its container.
    pub fn new(
        plan: Plan,
        actor_id: impl Into<String>,
        mut queue: MutationQueue<T>,
        options: TrackerOptions,
    ) -> Result<Self> {
        validation::validate_links(&plan)?;
        let detached = queue.detached_outcomes();
        if plan.updated_at.is_some() {
            queue.set_token(&plan.id, plan.updated_at);
        }
        let tracker = ChangeTracker::with_options(&plan.phases, options);

        Ok(Self {
            plan,
            actor_id: actor_id.into(),
            tracker,
            queue,
            conflict: ConflictState::Clean,
            reverts: HashMap::new(),
            unacknowledged: HashMap::new(),
            plan_create: None,
            detached,
        })
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    pub fn actor_id(&self) -> &str {
        &self.actor_id
    }

    pub fn conflict(&self) -> &ConflictState {
        &self.conflict
    }

    pub fn tracker(&self) -> &ChangeTracker {
        &self.tracker
    }

    pub fn queue(&self) -> &MutationQueue<T> {
        &self.queue
    }

    /// Number of queued events whose outcome has not been settled.
    pub fn in_flight(&self) -> usize {
        self.reverts.len()
    }

    /// Applies a free-form local edit. Nothing is queued until
    /// [`Editor::sync_changes`].
    pub fn edit<R>(&mut self, edit: impl FnOnce(&mut Plan) -> R) -> R {
        edit(&mut self.plan)
    }

    /// Local edits not yet synced, relative to the baseline.
    pub fn pending_changes(&self) -> ChangeSet {
        diff_phases(
            self.tracker.current(),
            &self.plan.phases,
            self.tracker.options(),
        )
    }

    pub fn has_local_edits(&self) -> bool {
        !self.pending_changes().is_empty()
    }

    /// Throws away local edits, returning the tree to the baseline.
    pub fn discard_local_edits(&mut self) {
        self.plan.phases = self.tracker.current().to_vec();
    }

    /// Diffs the tree against the baseline and makes the tree the new
    /// baseline. Returns the diff.
    pub fn save(&mut self) -> &ChangeSet {
        self.tracker.update_current_state(&self.plan.phases)
    }

    /// Accepts the current tree as the clean baseline without queueing
    /// anything.
    pub fn mark_saved(&mut self) {
        self.tracker.reset(&self.plan.phases);
        info!("Plan {} marked as saved", self.plan.id);
    }

    /// Queues the events for every local edit since the last sync.
    pub fn sync_changes(&mut self) -> Result<Submission> {
        let checkpoint = self.tracker.clone();
        let baseline = self.plan_with_phases(self.tracker.current().to_vec());
        self.save();
        let events = events_from_changes(&self.plan.id, &self.actor_id, &self.tracker);
        if events.is_empty() {
            return Ok(Submission::default());
        }

        let mut submission = Submission::default();
        if let Err(e) = self.ensure_plan_created(&mut submission) {
            // Nothing was queued; keep the edits pending
            self.tracker = checkpoint;
            return Err(e);
        }
        for event in events {
            let revert = revert_for_synced(&event, &baseline);
            let created = if event.kind.is_create() {
                vec![event.target_id().to_string()]
            } else {
                Vec::new()
            };
            match self.submit(event, revert, created) {
                Ok(pending) => submission.pendings.push(pending),
                Err(e) if submission.is_empty() => {
                    self.tracker = checkpoint;
                    return Err(e);
                }
                Err(e) => return Err(e),
            }
        }
        debug!("Synced {} events for plan {}", submission.len(), self.plan.id);
        Ok(submission)
    }

    /// Consumes the outcome of one event.
    ///
    /// On failure the event's optimistic change is undone and the error is
    /// returned; conflicts also mark the editor conflicted.
    pub fn settle(&mut self, outcome: Outcome) -> Result<()> {
        let Outcome { sequence, result } = outcome;
        self.queue.release(&self.plan.id, sequence);
        let revert = self.reverts.remove(&sequence).flatten();
        self.unacknowledged.retain(|_, pending| *pending != sequence);
        if self.plan_create == Some(sequence) {
            self.plan_create = None;
        }

        match result {
            Ok(ack) => {
                if self.plan.updated_at.map_or(true, |at| ack.updated_at > at) {
                    self.plan.updated_at = Some(ack.updated_at);
                }
                Ok(())
            }
            Err(error) => {
                if let Some(revert) = revert {
                    self.undo(revert);
                }
                if let Some(state) = ConflictState::from_error(&error) {
                    warn!("Plan {} is now conflicted: {error}", self.plan.id);
                    self.conflict = state;
                }
                Err(error)
            }
        }
    }

    /// Waits for a submission and settles all of its outcomes. Returns the
    /// first error, after every outcome has been settled.
    pub async fn finish(&mut self, submission: Submission) -> Result<()> {
        let mut first_error = None;
        for outcome in submission.outcomes().await {
            if let Err(e) = self.settle(outcome) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Settles every detached outcome that has arrived so far and returns
    /// the failures. Their changes are already undone.
    pub fn settle_ready(&mut self) -> Vec<SyncError> {
        let mut errors = Vec::new();
        while let Ok(outcome) = self.detached.try_recv() {
            if let Err(e) = self.settle(outcome) {
                errors.push(e);
            }
        }
        errors
    }

    /// Waits for the next detached outcome and settles it. Pending forever
    /// when nothing was detached; callers race it against other work.
    pub async fn settle_next_detached(&mut self) -> Result<()> {
        match self.detached.recv().await {
            Some(outcome) => self.settle(outcome),
            None => Err(SyncError::QueueClosed),
        }
    }

    /// Leaves the conflicted state.
    pub fn resolve_conflict(&mut self, resolution: Resolution) -> Result<()> {
        match resolution {
            Resolution::Reload(plan) => {
                if plan.id != self.plan.id {
                    return Err(SyncError::validation("plan")
                        .with_reason(format!("Cannot reload plan {} into {}", plan.id, self.plan.id)));
                }
                validation::validate_links(&plan)?;
                self.queue.set_token(&plan.id, plan.updated_at);
                self.tracker.reset(&plan.phases);
                self.plan = plan;
                self.reverts.clear();
                self.unacknowledged.clear();
                self.plan_create = None;
                info!("Reloaded plan {} from server", self.plan.id);
            }
            Resolution::Overwrite => {
                if let Some(server_updated_at) = self.conflict.server_updated_at() {
                    self.queue.set_token(&self.plan.id, Some(server_updated_at));
                    self.plan.updated_at = Some(server_updated_at);
                    info!(
                        "Plan {} will overwrite server state from {server_updated_at}",
                        self.plan.id
                    );
                }
            }
        }
        self.conflict = ConflictState::Clean;
        Ok(())
    }

    /// Queues a plan-create first if the plan was never persisted.
    fn ensure_plan_created(&mut self, submission: &mut Submission) -> Result<()> {
        if self.plan.updated_at.is_some() || self.plan_create.is_some() {
            return Ok(());
        }
        let event = MutationEvent::create_plan(&self.plan, &self.actor_id);
        let pending = self.queue.submit(event)?;
        self.reverts
            .insert(pending.sequence(), Some(Revert::PlanCreated));
        self.plan_create = Some(pending.sequence());
        submission.pendings.push(pending);
        Ok(())
    }

    /// Queues one event behind any unacknowledged create it relies on.
    fn submit(
        &mut self,
        event: MutationEvent,
        revert: Option<Revert>,
        created: Vec<String>,
    ) -> Result<Pending> {
        let depends_on = [
            Some(event.target_id()),
            event.phase_id.as_deref(),
            event.session_id.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter_map(|id| self.unacknowledged.get(id).copied())
        .chain(self.plan_create)
        .max();

        let pending = self.queue.submit(event.depending_on(depends_on))?;
        let sequence = pending.sequence();
        self.reverts.insert(sequence, revert);
        for id in created {
            self.unacknowledged.insert(id, sequence);
        }
        Ok(pending)
    }

    /// Runs an action: submits its event, then applies `change` to the tree
    /// and to the baseline so the change is not synced a second time.
    fn run_action(
        &mut self,
        event: MutationEvent,
        revert: Revert,
        created: Vec<String>,
        change: impl Fn(&mut Plan),
    ) -> Result<Submission> {
        let mut submission = Submission {
            entity_id: created.first().cloned(),
            pendings: Vec::new(),
        };
        self.ensure_plan_created(&mut submission)?;
        let pending = self.submit(event, Some(revert), created)?;
        submission.pendings.push(pending);

        change(&mut self.plan);
        self.update_baseline(change);
        Ok(submission)
    }

    /// Applies a change that is never sent, like expanding a phase.
    fn apply_local(&mut self, change: impl Fn(&mut Plan)) {
        change(&mut self.plan);
        self.update_baseline(change);
    }

    fn undo(&mut self, revert: Revert) {
        debug!("Reverting {revert:?}");
        let baseline_revert = revert.clone();
        if !revert.undo(&mut self.plan) {
            warn!("Nothing left to revert in plan {}", self.plan.id);
        }
        self.update_baseline(move |plan| {
            baseline_revert.undo(plan);
        });
    }

    fn update_baseline(&mut self, change: impl FnOnce(&mut Plan)) {
        let mut baseline = self.plan_with_phases(self.tracker.current().to_vec());
        change(&mut baseline);
        self.tracker.reset(&baseline.phases);
    }

    fn plan_with_phases(&self, phases: Vec<Phase>) -> Plan {
        let mut plan = self.plan.without_children();
        plan.phases = phases;
        plan
    }

    fn ensure_phase(&self, id: &str) -> Result<&Phase> {
        self.plan
            .phase(id)
            .ok_or_else(|| SyncError::not_found(EntityLevel::Phase, id))
    }
}

/// Undo record for one event of a diff sync, built against the baseline the
/// diff started from.
fn revert_for_synced(event: &MutationEvent, baseline: &Plan) -> Option<Revert> {
    let id = event.target_id().to_string();
    if event.kind.is_create() {
        return Some(Revert::Created {
            level: event.level,
            id,
        });
    }

    match &event.payload {
        MutationPayload::PhasePatch { patch, .. } => {
            let old = baseline.phase(&id)?;
            let mut updated = old.clone();
            patch.apply_to(&mut updated);
            Some(Revert::PhaseFields {
                restore: PhasePatch::between(&updated, old, true),
                id,
            })
        }
        MutationPayload::SessionPatch { patch, .. } => {
            let old = baseline.session(&id)?;
            let mut updated = old.clone();
            patch.apply_to(&mut updated);
            Some(Revert::SessionFields {
                restore: SessionPatch::between(&updated, old, true),
                id,
            })
        }
        MutationPayload::ExercisePatch { patch, .. } => {
            let old = baseline.exercise(&id)?;
            let mut updated = old.clone();
            patch.apply_to(&mut updated);
            Some(Revert::ExerciseFields {
                restore: ExercisePatch::between(&updated, old),
                id,
            })
        }
        MutationPayload::Delete { .. } => removal_revert(event.level, &id, baseline),
        _ => None,
    }
}

/// Where a deleted entity lived in the baseline, so it can be put back.
fn removal_revert(level: EntityLevel, id: &str, baseline: &Plan) -> Option<Revert> {
    for (phase_index, phase) in baseline.phases.iter().enumerate() {
        if level == EntityLevel::Phase && phase.id == id {
            return Some(Revert::PhaseRemoved {
                index: phase_index,
                phase: phase.clone(),
            });
        }
        for (session_index, session) in phase.sessions.iter().enumerate() {
            if level == EntityLevel::Session && session.id == id {
                return Some(Revert::SessionRemoved {
                    phase_id: phase.id.clone(),
                    index: session_index,
                    session: session.clone(),
                });
            }
            if level == EntityLevel::Exercise {
                if let Some(index) = session.exercises.iter().position(|e| e.id == id) {
                    return Some(Revert::ExerciseRemoved {
                        session_id: session.id.clone(),
                        index,
                        exercise: session.exercises[index].clone(),
                    });
                }
            }
        }
    }
    None
}
