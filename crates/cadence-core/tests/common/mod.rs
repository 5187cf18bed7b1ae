use std::sync::Arc;

use cadence_core::{Editor, EditorBuilder, MemoryTransport, Phase, Plan, PlanExercise, Session};
use tempfile::TempDir;

pub const ACTOR: &str = "coach-1";

/// A persisted-looking plan with one phase, one session and two exercises.
pub fn sample_plan() -> Plan {
    let mut plan = Plan::new("plan-1", "Off-season", "client-1", ACTOR);
    let mut phase = Phase::new("p1", "plan-1", "Base", 0);
    let mut session = Session::new("s1", "p1", "Lower body", 0);
    for (id, order, reference) in [("e1", "A1", "squat"), ("e2", "A2", "lunge")] {
        session.exercises.push(PlanExercise {
            exercise_id: Some(reference.to_string()),
            ..PlanExercise::new(id, "s1", order)
        });
    }
    phase.sessions.push(session);
    plan.phases.push(phase);
    plan
}

/// Helper function to create an editor over `sample_plan` backed by an
/// outbox in a temporary directory
pub async fn create_test_editor() -> (TempDir, Arc<MemoryTransport>, Editor<MemoryTransport>) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let transport = Arc::new(MemoryTransport::new());
    let mut plan = sample_plan();
    plan.updated_at = Some(transport.seed(plan.clone()));

    let editor = EditorBuilder::new(plan, ACTOR)
        .with_outbox_path(Some(temp_dir.path().join("outbox.db")))
        .build(Arc::clone(&transport))
        .await
        .expect("Failed to create editor");
    (temp_dir, transport, editor)
}
