//! Per-plan FIFO delivery of mutation events.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
};

use jiff::Timestamp;
use log::{debug, warn};
use tokio::{
    runtime::Handle,
    sync::{mpsc, oneshot},
};

use super::{MutationEvent, Outbox, Transport};
use crate::{
    error::{Result, SyncError},
    models::mint_id,
};

/// A successful delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Acknowledgement {
    pub sequence: u64,
    /// The plan's `updated_at` after the event was applied
    pub updated_at: Timestamp,
}

/// Final answer for one submitted event.
#[derive(Debug)]
pub struct Outcome {
    pub sequence: u64,
    pub result: Result<Acknowledgement>,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Handle on a submitted event.
///
/// Awaiting [`Pending::outcome`] is optional; dropping the handle detaches it
/// and the event is still delivered. The outcome of a detached event goes to
/// the receiver from [`MutationQueue::detached_outcomes`], if one was taken.
#[derive(Debug)]
pub struct Pending {
    sequence: u64,
    receiver: Option<oneshot::Receiver<Outcome>>,
    state: Arc<Mutex<LaneState>>,
    detached: Option<mpsc::UnboundedSender<Outcome>>,
}

impl Pending {
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Waits for the lane to answer.
    pub async fn outcome(mut self) -> Outcome {
        let received = match self.receiver.as_mut() {
            Some(receiver) => receiver.await.ok(),
            None => None,
        };
        self.receiver = None;

        match received {
            Some(outcome) => {
                if !outcome.is_success() {
                    lock(&self.state).release(self.sequence);
                }
                outcome
            }
            None => Outcome {
                sequence: self.sequence,
                result: Err(SyncError::QueueClosed),
            },
        }
    }
}

impl Drop for Pending {
    fn drop(&mut self) {
        if let Some(mut receiver) = self.receiver.take() {
            // Once closed the lane cannot send; anything already sent is
            // handed off here instead.
            receiver.close();
            if let Ok(outcome) = receiver.try_recv() {
                hand_off(outcome, &self.state, self.detached.as_ref());
            }
        }
    }
}

struct Job {
    event: MutationEvent,
    reply: oneshot::Sender<Outcome>,
    detached: Option<mpsc::UnboundedSender<Outcome>>,
}

#[derive(Debug)]
struct Failure {
    reason: String,
    /// The submitter has seen the outcome
    released: bool,
}

#[derive(Debug, Default)]
struct LaneState {
    token: Option<Timestamp>,
    /// Failed events that a queued or future dependent may still ask about
    failed: HashMap<u64, Failure>,
    /// Number of queued events per prerequisite sequence
    waiting: HashMap<u64, usize>,
}

impl LaneState {
    fn record_failure(&mut self, sequence: u64, reason: String) {
        self.failed.insert(
            sequence,
            Failure {
                reason,
                released: false,
            },
        );
    }

    /// Forgets the failure of `sequence` unless a queued event still
    /// depends on it.
    fn release(&mut self, sequence: u64) {
        if self.waiting.contains_key(&sequence) {
            if let Some(failure) = self.failed.get_mut(&sequence) {
                failure.released = true;
            }
        } else {
            self.failed.remove(&sequence);
        }
    }

    /// Called as a dependent of `prerequisite` leaves the queue. Returns why
    /// the prerequisite failed, if it did.
    fn take_dependency(&mut self, prerequisite: u64) -> Option<String> {
        let reason = self
            .failed
            .get(&prerequisite)
            .map(|failure| failure.reason.clone());

        if let Some(count) = self.waiting.get_mut(&prerequisite) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.waiting.remove(&prerequisite);
                if self.failed.get(&prerequisite).is_some_and(|f| f.released) {
                    self.failed.remove(&prerequisite);
                }
            }
        }
        reason
    }
}

#[derive(Default)]
struct Lane {
    sender: Option<mpsc::UnboundedSender<Job>>,
    state: Arc<Mutex<LaneState>>,
}

/// The outbox as seen by one queue.
#[derive(Clone)]
struct Journal {
    outbox: Outbox,
    queue_id: Arc<str>,
}

/// Delivers events through a [`Transport`], one FIFO lane per plan.
///
/// Within a lane events are delivered strictly in submission order and each
/// waits for the previous one to be answered. Just before delivery the lane
/// stamps the event with the plan's cached concurrency token and advances
/// that token whenever the transport acknowledges. Nothing is retried.
///
/// An event whose `depends_on` prerequisite failed is not delivered. The
/// failure is remembered until its outcome has been seen (see
/// [`MutationQueue::release`]) and no queued event depends on it.
///
/// Ordering across different plans is not guaranteed.
pub struct MutationQueue<T: Transport> {
    id: Arc<str>,
    transport: Arc<T>,
    outbox: Option<Outbox>,
    detached: Option<mpsc::UnboundedSender<Outcome>>,
    next_sequence: AtomicU64,
    lanes: Mutex<HashMap<String, Lane>>,
}

impl<T: Transport> MutationQueue<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self {
            id: Arc::from(mint_id()),
            transport,
            outbox: None,
            detached: None,
            next_sequence: AtomicU64::new(1),
            lanes: Mutex::new(HashMap::new()),
        }
    }

    /// Persists every event to `outbox` before delivery, under this queue's
    /// id. Sequence numbers continue after the highest one already stored.
    pub async fn with_outbox(mut self, outbox: Outbox) -> Result<Self> {
        if let Some(max) = outbox.max_sequence().await? {
            let next = self.next_sequence.get_mut();
            *next = (*next).max(max + 1);
        }
        self.outbox = Some(outbox);
        Ok(self)
    }

    /// Identifies this queue's rows in a shared outbox.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    pub fn outbox(&self) -> Option<&Outbox> {
        self.outbox.as_ref()
    }

    /// Receiver for the outcomes of events submitted from now on whose
    /// [`Pending`] handle was dropped before it was awaited. Replaces any
    /// receiver taken earlier.
    pub fn detached_outcomes(&mut self) -> mpsc::UnboundedReceiver<Outcome> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.detached = Some(sender);
        receiver
    }

    /// Assigns the next sequence number to `event` and appends it to its
    /// plan's lane.
    ///
    /// Must be called from within a tokio runtime; the lane task is spawned
    /// on first use.
    pub fn submit(&self, mut event: MutationEvent) -> Result<Pending> {
        let runtime = Handle::try_current().map_err(|e| SyncError::Configuration {
            message: format!("Mutation queue requires a tokio runtime: {e}"),
        })?;

        let mut lanes = lock(&self.lanes);
        let lane = lanes.entry(event.plan_id.clone()).or_default();

        let sender = match &lane.sender {
            Some(sender) if !sender.is_closed() => sender.clone(),
            _ => {
                let (sender, receiver) = mpsc::unbounded_channel();
                let journal = self.outbox.clone().map(|outbox| Journal {
                    outbox,
                    queue_id: Arc::clone(&self.id),
                });
                runtime.spawn(run_lane(
                    Arc::clone(&self.transport),
                    journal,
                    Arc::clone(&lane.state),
                    receiver,
                ));
                lane.sender = Some(sender.clone());
                sender
            }
        };

        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst);
        event.sequence = sequence;
        debug!(
            "Queued event {sequence} ({}) for plan {}",
            event.operation(),
            event.plan_id
        );

        let prerequisite = event.depends_on;
        if let Some(prerequisite) = prerequisite {
            *lock(&lane.state).waiting.entry(prerequisite).or_default() += 1;
        }

        let (reply, receiver) = oneshot::channel();
        let job = Job {
            event,
            reply,
            detached: self.detached.clone(),
        };
        if sender.send(job).is_err() {
            if let Some(prerequisite) = prerequisite {
                lock(&lane.state).take_dependency(prerequisite);
            }
            return Err(SyncError::QueueClosed);
        }

        Ok(Pending {
            sequence,
            receiver: Some(receiver),
            state: Arc::clone(&lane.state),
            detached: self.detached.clone(),
        })
    }

    /// Marks the outcome of `sequence` as seen by whoever consumes
    /// [`MutationQueue::detached_outcomes`]. Awaiting [`Pending::outcome`]
    /// does this already.
    pub fn release(&self, plan_id: &str, sequence: u64) {
        if let Some(lane) = lock(&self.lanes).get(plan_id) {
            lock(&lane.state).release(sequence);
        }
    }

    /// Last concurrency token known for `plan_id`.
    pub fn token(&self, plan_id: &str) -> Option<Timestamp> {
        lock(&self.lanes)
            .get(plan_id)
            .and_then(|lane| lock(&lane.state).token)
    }

    /// Replaces the cached token, e.g. after loading or reloading a plan.
    pub fn set_token(&self, plan_id: &str, token: Option<Timestamp>) {
        let mut lanes = lock(&self.lanes);
        let lane = lanes.entry(plan_id.to_string()).or_default();
        lock(&lane.state).token = token;
    }

    #[cfg(test)]
    pub(crate) fn remembered_failures(&self, plan_id: &str) -> usize {
        lock(&self.lanes)
            .get(plan_id)
            .map_or(0, |lane| lock(&lane.state).failed.len())
    }
}

async fn run_lane<T: Transport>(
    transport: Arc<T>,
    journal: Option<Journal>,
    state: Arc<Mutex<LaneState>>,
    mut receiver: mpsc::UnboundedReceiver<Job>,
) {
    while let Some(Job {
        event,
        reply,
        detached,
    }) = receiver.recv().await
    {
        let sequence = event.sequence;
        let result = dispatch(transport.as_ref(), journal.as_ref(), &state, event).await;
        if let Err(e) = &result {
            lock(&state).record_failure(sequence, e.to_string());
        }
        if let Err(outcome) = reply.send(Outcome { sequence, result }) {
            hand_off(outcome, &state, detached.as_ref());
        }
    }
}

/// Routes the outcome of a detached event to the detached receiver, or
/// releases it when nobody is listening.
fn hand_off(
    outcome: Outcome,
    state: &Mutex<LaneState>,
    detached: Option<&mpsc::UnboundedSender<Outcome>>,
) {
    let sequence = outcome.sequence;
    let failed = !outcome.is_success();
    let forwarded = detached.is_some_and(|sender| sender.send(outcome).is_ok());
    if failed && !forwarded {
        lock(state).release(sequence);
    }
}

async fn dispatch<T: Transport>(
    transport: &T,
    journal: Option<&Journal>,
    state: &Mutex<LaneState>,
    mut event: MutationEvent,
) -> Result<Acknowledgement> {
    let sequence = event.sequence;

    if let Some(prerequisite) = event.depends_on {
        let failure = lock(state).take_dependency(prerequisite);
        if let Some(reason) = failure {
            let error = SyncError::DependencyFailed {
                sequence,
                prerequisite,
                reason,
            };
            warn!("Skipping event {sequence} ({}): {error}", event.operation());
            if let Some(journal) = journal {
                persist_failure(journal, &event, &error).await;
            }
            return Err(error);
        }
    }

    if let Some(token) = lock(state).token {
        event.concurrency_token = Some(token);
    }

    let row = match journal {
        Some(journal) => Some(journal.outbox.record(&journal.queue_id, &event).await?),
        None => None,
    };

    debug!(
        "Delivering event {sequence} ({}) with token {:?}",
        event.operation(),
        event.concurrency_token
    );

    let outbox_row = journal.zip(row);
    match transport.deliver(&event).await.into_result() {
        Ok(updated_at) => {
            lock(state).token = Some(updated_at);
            if let Some((journal, row)) = outbox_row {
                if let Err(e) = journal.outbox.acknowledge(row).await {
                    warn!("Event {sequence} acknowledged but not cleared from outbox: {e}");
                }
            }
            Ok(Acknowledgement {
                sequence,
                updated_at,
            })
        }
        Err(error) => {
            warn!("Event {sequence} ({}) rejected: {error}", event.operation());
            if let Some((journal, row)) = outbox_row {
                if let Err(e) = journal.outbox.mark_failed(row, &error.to_string()).await {
                    warn!("Failed to mark event {sequence} as failed in outbox: {e}");
                }
            }
            Err(error)
        }
    }
}

async fn persist_failure(journal: &Journal, event: &MutationEvent, error: &SyncError) {
    let result = match journal.outbox.record(&journal.queue_id, event).await {
        Ok(row) => journal.outbox.mark_failed(row, &error.to_string()).await,
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        warn!("Failed to persist skipped event {}: {e}", event.sequence);
    }
}

fn lock<V>(mutex: &Mutex<V>) -> MutexGuard<'_, V> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
