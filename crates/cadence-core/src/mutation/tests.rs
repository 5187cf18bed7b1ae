//! Tests for mutation events, the queue and the in-memory transport.

use std::{sync::Arc, time::Duration};

use tempfile::TempDir;

use super::*;
use crate::{
    error::SyncError,
    models::{PhasePatch, Plan, PlanExercise, Phase, Session, SessionPatch},
    tracker::ChangeTracker,
};

const ACTOR: &str = "coach-1";

fn sample_plan() -> Plan {
    let mut plan = Plan::new("plan-1", "Off-season", "client-1", ACTOR);
    let mut phase = Phase::new("p1", "plan-1", "Base", 0);
    let mut session = Session::new("s1", "p1", "Lower body", 0);
    session.exercises.push(PlanExercise {
        exercise_id: Some("squat".to_string()),
        ..PlanExercise::new("e1", "s1", "A1")
    });
    session.exercises.push(PlanExercise {
        exercise_id: Some("lunge".to_string()),
        ..PlanExercise::new("e2", "s1", "A2")
    });
    phase.sessions.push(session);
    plan.phases.push(phase);
    plan
}

/// A transport holding `sample_plan` and a queue primed with its token.
fn seeded_queue() -> (Arc<MemoryTransport>, MutationQueue<MemoryTransport>) {
    let transport = Arc::new(MemoryTransport::new());
    let token = transport.seed(sample_plan());
    let queue = MutationQueue::new(Arc::clone(&transport));
    queue.set_token("plan-1", Some(token));
    (transport, queue)
}

fn rename_phase(name: &str) -> MutationEvent {
    MutationEvent::update_phase(
        "plan-1",
        "p1",
        PhasePatch {
            name: Some(name.to_string()),
            ..Default::default()
        },
        ACTOR,
    )
}

#[test]
fn test_operation_names() {
    let plan = sample_plan();
    let phase = &plan.phases[0];
    assert_eq!(MutationEvent::create_plan(&plan, ACTOR).operation(), "plan-create");
    assert_eq!(
        MutationEvent::duplicate_phase("plan-1", phase, ACTOR).operation(),
        "phase-duplicate"
    );
    assert_eq!(
        MutationEvent::delete_exercise("plan-1", "p1", "s1", "e1", ACTOR).operation(),
        "exercise-delete"
    );
}

#[test]
fn test_plan_create_payload_has_no_phases() {
    let event = MutationEvent::create_plan(&sample_plan(), ACTOR);
    match &event.payload {
        MutationPayload::Plan(plan) => assert!(plan.phases.is_empty()),
        other => panic!("Unexpected payload: {other:?}"),
    }
    assert_eq!(event.target_id(), "plan-1");
}

#[test]
fn test_event_json_shape() {
    let event = rename_phase("Hypertrophy");
    let json = serde_json::to_value(&event).unwrap();

    assert_eq!(json["level"], "phase");
    assert_eq!(json["kind"], "update");
    assert_eq!(json["payload"]["type"], "phase_patch");
    assert_eq!(json["payload"]["data"]["id"], "p1");
    assert_eq!(json["payload"]["data"]["patch"]["name"], "Hypertrophy");
    assert!(json.get("concurrency_token").is_none());

    let parsed: MutationEvent = serde_json::from_value(json).unwrap();
    assert_eq!(parsed, event);
}

#[test]
fn test_submit_without_runtime_is_rejected() {
    let queue = MutationQueue::new(Arc::new(MemoryTransport::new()));
    let result = queue.submit(rename_phase("Base"));
    assert!(matches!(result, Err(SyncError::Configuration { .. })));
}

#[tokio::test]
async fn test_token_advances_after_acknowledgement() {
    let (transport, queue) = seeded_queue();
    let t1 = queue.token("plan-1").unwrap();

    let first = queue.submit(rename_phase("Base v2")).unwrap().outcome().await;
    let t2 = first.result.unwrap().updated_at;
    assert!(t2 > t1);
    assert_eq!(queue.token("plan-1"), Some(t2));

    // The same payload still carrying T1 is stale now
    let stale = rename_phase("Base v3").with_token(Some(t1));
    match transport.deliver(&stale).await {
        TransportResponse::Conflict {
            server_updated_at, ..
        } => assert_eq!(server_updated_at, t2),
        other => panic!("Expected conflict, got {other:?}"),
    }

    // Through the queue it is stamped with T2 and goes through
    let second = queue.submit(rename_phase("Base v3")).unwrap().outcome().await;
    assert!(second.is_success());
    assert_eq!(transport.plan("plan-1").unwrap().phases[0].name, "Base v3");

    let delivered = transport.deliveries();
    assert_eq!(delivered[0].concurrency_token, Some(t1));
    assert_eq!(delivered[2].concurrency_token, Some(t2));
}

#[tokio::test]
async fn test_conflict_carries_server_token() {
    let (transport, queue) = seeded_queue();
    let touched = transport.touch("plan-1").unwrap();

    let outcome = queue.submit(rename_phase("Mine")).unwrap().outcome().await;
    let error = outcome.result.unwrap_err();

    assert!(error.is_conflict());
    assert_eq!(error.server_updated_at(), Some(touched));
    assert_eq!(transport.plan("plan-1").unwrap().phases[0].name, "Base");
}

#[tokio::test]
async fn test_lane_delivers_in_submission_order() {
    let transport = Arc::new(MemoryTransport::new().with_latency(Duration::from_millis(5)));
    let token = transport.seed(sample_plan());
    let queue = MutationQueue::new(Arc::clone(&transport));
    queue.set_token("plan-1", Some(token));

    let pendings: Vec<Pending> = (1..=5)
        .map(|i| {
            let patch = SessionPatch {
                name: Some(format!("Take {i}")),
                ..Default::default()
            };
            queue
                .submit(MutationEvent::update_session("plan-1", "p1", "s1", patch, ACTOR))
                .unwrap()
        })
        .collect();

    let sequences: Vec<u64> = pendings.iter().map(Pending::sequence).collect();
    for pending in pendings {
        assert!(pending.outcome().await.is_success());
    }

    let delivered: Vec<u64> = transport.deliveries().iter().map(|e| e.sequence).collect();
    assert_eq!(delivered, sequences);
    assert_eq!(transport.plan("plan-1").unwrap().phases[0].sessions[0].name, "Take 5");
}

#[tokio::test]
async fn test_dependent_event_is_not_delivered_after_failed_prerequisite() {
    let transport = Arc::new(MemoryTransport::new());
    let queue = MutationQueue::new(Arc::clone(&transport));
    let plan = Plan::new("plan-2", "New plan", "client-1", ACTOR);
    let phase = Phase::new("p9", "plan-2", "Base", 0);

    transport.fail_next("network unreachable");
    let create_plan = queue.submit(MutationEvent::create_plan(&plan, ACTOR)).unwrap();
    let create_phase = queue
        .submit(
            MutationEvent::create_phase("plan-2", &phase, ACTOR)
                .depending_on(Some(create_plan.sequence())),
        )
        .unwrap();
    let prerequisite = create_plan.sequence();

    let first = create_plan.outcome().await;
    assert!(matches!(first.result, Err(SyncError::Transport { .. })));

    let second = create_phase.outcome().await;
    match second.result {
        Err(SyncError::DependencyFailed {
            prerequisite: failed,
            ..
        }) => assert_eq!(failed, prerequisite),
        other => panic!("Expected dependency failure, got {other:?}"),
    }

    assert_eq!(transport.delivery_count(), 1);
    assert!(transport.plan("plan-2").is_none());
}

#[tokio::test]
async fn test_dependent_event_waits_for_prerequisite() {
    let transport = Arc::new(MemoryTransport::new().with_latency(Duration::from_millis(10)));
    let queue = MutationQueue::new(Arc::clone(&transport));
    let plan = Plan::new("plan-3", "Fresh", "client-1", ACTOR);
    let phase = Phase::new("p1", "plan-3", "Base", 0);

    let create_plan = queue.submit(MutationEvent::create_plan(&plan, ACTOR)).unwrap();
    let create_phase = queue
        .submit(
            MutationEvent::create_phase("plan-3", &phase, ACTOR)
                .depending_on(Some(create_plan.sequence())),
        )
        .unwrap();

    // Awaiting only the dependent event still sees the plan created first
    let outcome = create_phase.outcome().await;
    let acknowledged = outcome.result.unwrap();

    let stored = transport.plan("plan-3").unwrap();
    assert_eq!(stored.phases.len(), 1);
    assert_eq!(stored.updated_at, Some(acknowledged.updated_at));
    drop(create_plan);
}

#[tokio::test]
async fn test_failed_event_is_not_retried() {
    let (transport, queue) = seeded_queue();
    transport.fail_next("server error");

    let failed = queue.submit(rename_phase("Lost")).unwrap().outcome().await;
    assert!(matches!(failed.result, Err(SyncError::Transport { .. })));

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(transport.delivery_count(), 1);

    let next = queue.submit(rename_phase("Kept")).unwrap().outcome().await;
    assert!(next.is_success());
    assert_eq!(transport.delivery_count(), 2);
}

#[tokio::test]
async fn test_duplicate_is_delivered_as_one_event() {
    let (transport, queue) = seeded_queue();
    let copy = sample_plan().phases[0].duplicate(1);

    let outcome = queue
        .submit(MutationEvent::duplicate_phase("plan-1", &copy, ACTOR))
        .unwrap()
        .outcome()
        .await;
    assert!(outcome.is_success());
    assert_eq!(transport.delivery_count(), 1);

    let stored = transport.plan("plan-1").unwrap();
    let stored_copy = stored.phase(&copy.id).unwrap();
    assert_eq!(stored_copy.sessions.len(), 1);
    assert_eq!(stored_copy.sessions[0].exercises.len(), 2);
    assert!(stored.validate_links().is_empty());
}

#[tokio::test]
async fn test_activation_is_exclusive_on_server() {
    let (transport, queue) = seeded_queue();
    let second = Phase::new("p2", "plan-1", "Peak", 1);
    queue
        .submit(MutationEvent::create_phase("plan-1", &second, ACTOR))
        .unwrap();

    for id in ["p1", "p2"] {
        let patch = PhasePatch {
            is_active: Some(true),
            ..Default::default()
        };
        let outcome = queue
            .submit(MutationEvent::update_phase("plan-1", id, patch, ACTOR))
            .unwrap()
            .outcome()
            .await;
        assert!(outcome.is_success());
    }

    let stored = transport.plan("plan-1").unwrap();
    assert!(!stored.phase("p1").unwrap().is_active);
    assert!(stored.phase("p2").unwrap().is_active);
}

#[test]
fn test_events_from_changes_order() {
    let before = sample_plan().phases;
    let mut tracker = ChangeTracker::initialize(&before);

    let mut after = before.clone();
    after[0].name = "Base v2".to_string();
    after[0].sessions[0].exercises.retain(|e| e.id != "e2");
    let mut phase = Phase::new("p2", "plan-1", "Peak", 1);
    let mut session = Session::new("s2", "p2", "Upper body", 0);
    session.exercises.push(PlanExercise {
        exercise_id: Some("press".to_string()),
        ..PlanExercise::new("e3", "s2", "A1")
    });
    phase.sessions.push(session);
    after.push(phase);
    tracker.update_current_state(&after);

    let events = events_from_changes("plan-1", ACTOR, &tracker);
    let operations: Vec<String> = events.iter().map(MutationEvent::operation).collect();
    assert_eq!(
        operations,
        vec![
            "phase-create",
            "session-create",
            "exercise-create",
            "phase-update",
            "exercise-delete",
        ]
    );

    let exercise_create = &events[2];
    assert_eq!(exercise_create.phase_id.as_deref(), Some("p2"));
    assert_eq!(exercise_create.session_id.as_deref(), Some("s2"));

    let exercise_delete = &events[4];
    assert_eq!(exercise_delete.target_id(), "e2");
    assert_eq!(exercise_delete.session_id.as_deref(), Some("s1"));
}

#[tokio::test]
async fn test_created_exercise_goes_to_its_containing_session() {
    let before = sample_plan().phases;
    let mut tracker = ChangeTracker::initialize(&before);

    let mut after = before.clone();
    // Parent reference left over from a copy elsewhere in the tree
    after[0].sessions[0].exercises.push(PlanExercise {
        exercise_id: Some("bridge".to_string()),
        ..PlanExercise::new("e7", "s-stale", "A3")
    });
    tracker.update_current_state(&after);

    let events = events_from_changes("plan-1", ACTOR, &tracker);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].session_id.as_deref(), Some("s1"));
    assert_eq!(events[0].phase_id.as_deref(), Some("p1"));

    let (transport, queue) = seeded_queue();
    let event = events.into_iter().next().unwrap();
    assert!(queue.submit(event).unwrap().outcome().await.is_success());
    let stored = transport.plan("plan-1").unwrap();
    assert!(stored.session("s1").unwrap().exercise("e7").is_some());
}

#[tokio::test]
async fn test_seen_failures_are_forgotten() {
    let (transport, queue) = seeded_queue();

    for attempt in 0..5 {
        transport.fail_next(format!("offline {attempt}"));
        let outcome = queue.submit(rename_phase("Lost")).unwrap().outcome().await;
        assert!(!outcome.is_success());
    }
    assert_eq!(queue.remembered_failures("plan-1"), 0);

    // Failures nobody awaits are forgotten once the lane hands them off
    transport.fail_next("offline again");
    drop(queue.submit(rename_phase("Dropped")).unwrap());
    let next = queue.submit(rename_phase("Kept")).unwrap().outcome().await;
    assert!(next.is_success());
    assert_eq!(queue.remembered_failures("plan-1"), 0);
}

#[tokio::test]
async fn test_failure_is_kept_until_queued_dependents_leave() {
    let transport = Arc::new(MemoryTransport::new().with_latency(Duration::from_millis(10)));
    let queue = MutationQueue::new(Arc::clone(&transport));
    let plan = Plan::new("plan-4", "Fresh", "client-1", ACTOR);

    transport.fail_next("network unreachable");
    let create_plan = queue.submit(MutationEvent::create_plan(&plan, ACTOR)).unwrap();
    let prerequisite = create_plan.sequence();
    let dependents: Vec<Pending> = (0..3)
        .map(|order| {
            let phase = Phase::new(&format!("p{order}"), "plan-4", "Base", order);
            queue
                .submit(
                    MutationEvent::create_phase("plan-4", &phase, ACTOR)
                        .depending_on(Some(prerequisite)),
                )
                .unwrap()
        })
        .collect();

    // Seen before any dependent left the queue
    assert!(!create_plan.outcome().await.is_success());

    for dependent in dependents {
        match dependent.outcome().await.result {
            Err(SyncError::DependencyFailed { prerequisite: failed, .. }) => {
                assert_eq!(failed, prerequisite)
            }
            other => panic!("Expected dependency failure, got {other:?}"),
        }
    }
    assert_eq!(transport.delivery_count(), 1);
    assert_eq!(queue.remembered_failures("plan-4"), 0);
}

#[tokio::test]
async fn test_outbox_keeps_only_unacknowledged_events() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let outbox = Outbox::open(temp_dir.path().join("outbox.db"))
        .await
        .expect("Failed to open outbox");
    let (transport, queue) = seeded_queue();
    let queue = queue.with_outbox(outbox.clone()).await.unwrap();

    assert!(queue.submit(rename_phase("Saved")).unwrap().outcome().await.is_success());

    transport.fail_next("gateway timeout");
    let failed = queue.submit(rename_phase("Lost")).unwrap().outcome().await;
    assert!(!failed.is_success());

    let entries = outbox.entries(None).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].sequence, failed.sequence);
    assert_eq!(entries[0].status, OutboxStatus::Failed);
    assert_eq!(entries[0].operation, "phase-update");
    assert!(entries[0].error.as_deref().unwrap().contains("gateway timeout"));
    assert_eq!(entries[0].event.target_id(), "p1");

    assert!(outbox.entries(Some(OutboxStatus::Pending)).await.unwrap().is_empty());
    assert_eq!(outbox.clear(Some(OutboxStatus::Failed)).await.unwrap(), 1);
    assert!(outbox.entries(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_sequence_resumes_after_persisted_entries() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("outbox.db");

    let outbox = Outbox::open(&path).await.unwrap();
    let (transport, queue) = seeded_queue();
    let queue = queue.with_outbox(outbox).await.unwrap();
    transport.fail_next("offline");
    transport.fail_next("offline");
    let a = queue.submit(rename_phase("A")).unwrap().outcome().await;
    let b = queue.submit(rename_phase("B")).unwrap().outcome().await;
    assert!(!a.is_success() && !b.is_success());

    let reopened = Outbox::open(&path).await.unwrap();
    let restarted = MutationQueue::new(Arc::clone(&transport))
        .with_outbox(reopened)
        .await
        .unwrap();
    let next = restarted.submit(rename_phase("C")).unwrap();
    assert_eq!(next.sequence(), b.sequence + 1);
}
