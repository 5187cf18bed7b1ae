//! Tests for the change tracker.

use super::*;
use crate::models::{ExercisePatch, OrderMarker, Phase, PlanExercise, Session};

fn exercise(id: &str, session_id: &str, order: &str) -> PlanExercise {
    PlanExercise {
        exercise_id: Some(format!("catalog-{id}")),
        description: Some(format!("Exercise {id}")),
        sets_min: Some(3),
        sets_max: Some(4),
        ..PlanExercise::new(id, session_id, order)
    }
}

fn session(id: &str, phase_id: &str, exercise_ids: &[&str]) -> Session {
    let mut session = Session::new(id, phase_id, format!("Session {id}"), 0);
    for (i, exercise_id) in exercise_ids.iter().enumerate() {
        session
            .exercises
            .push(exercise(exercise_id, id, &format!("A{}", i + 1)));
    }
    session
}

/// Phase `p1` with sessions `s1` (e1, e2, e3) and `s2` (e4, e5, e6), and an
/// empty phase `p2`.
fn sample_tree() -> Vec<Phase> {
    let mut p1 = Phase::new("p1", "plan", "Base", 0);
    p1.sessions.push(session("s1", "p1", &["e1", "e2", "e3"]));
    p1.sessions.push(session("s2", "p1", &["e4", "e5", "e6"]));
    let p2 = Phase::new("p2", "plan", "Peak", 1);
    vec![p1, p2]
}

#[test]
fn test_initialize_has_no_changes() {
    let tree = sample_tree();
    let tracker = ChangeTracker::initialize(&tree);
    assert!(tracker.changes().is_empty());
    assert_eq!(tracker.previous(), tree.as_slice());
    assert_eq!(tracker.current(), tree.as_slice());
}

#[test]
fn test_diff_classifies_every_level() {
    let before = sample_tree();
    let mut tracker = ChangeTracker::initialize(&before);

    let mut after = before.clone();
    // update phase, session and exercise
    after[0].name = "Base (revised)".to_string();
    after[0].sessions[0].name = "Heavy day".to_string();
    after[0].sessions[0].exercises[0].tempo = Some("3-1-1-0".to_string());
    // create a session with one exercise under p2
    after[1].sessions.push(session("s3", "p2", &["e7"]));
    // delete one exercise
    after[0].sessions[1].exercises.retain(|e| e.id != "e6");

    let changes = tracker.update_current_state(&after).clone();

    assert!(changes.created.phases.is_empty());
    assert_eq!(changes.created.sessions.len(), 1);
    assert_eq!(changes.created.sessions[0].phase_id, "p2");
    assert_eq!(changes.created.sessions[0].session.id, "s3");
    assert!(changes.created.sessions[0].session.exercises.is_empty());
    assert_eq!(changes.created.exercises.len(), 1);
    assert_eq!(changes.created.exercises[0].session_id, "s3");
    assert_eq!(changes.created.exercises[0].exercise.id, "e7");

    assert_eq!(changes.updated.phases.len(), 1);
    assert_eq!(
        changes.updated.phases[0].patch.name.as_deref(),
        Some("Base (revised)")
    );
    assert_eq!(changes.updated.phases[0].patch.is_active, None);
    assert_eq!(changes.updated.sessions.len(), 1);
    assert_eq!(changes.updated.sessions[0].id, "s1");
    assert_eq!(changes.updated.exercises.len(), 1);
    assert_eq!(changes.updated.exercises[0].id, "e1");
    assert_eq!(
        changes.updated.exercises[0].patch.changed_fields(),
        vec!["tempo"]
    );

    assert_eq!(changes.deleted.exercises, vec!["e6".to_string()]);
    assert!(changes.deleted.sessions.is_empty());
    assert!(changes.deleted.phases.is_empty());
}

#[test]
fn test_exercise_patch_contains_only_changed_fields() {
    let before = sample_tree();
    let mut tracker = ChangeTracker::initialize(&before);

    let mut after = before.clone();
    let target = &mut after[0].sessions[0].exercises[1];
    target.sets_min = Some(5);
    target.notes = Some("Pause at the bottom".to_string());
    target.description = None;
    target.order = OrderMarker::from("B1");

    let changes = tracker.update_current_state(&after);
    let patch = &changes.updated.exercises[0].patch;

    assert_eq!(changes.updated.exercises[0].id, "e2");
    assert_eq!(
        patch.changed_fields(),
        vec!["order", "description", "sets_min", "notes"]
    );
    assert_eq!(patch.sets_min, Some(Some(5)));
    assert_eq!(patch.description, Some(None));
    assert_eq!(patch.order, Some(OrderMarker::from("B1")));
    assert_eq!(patch.sets_max, None);
}

#[test]
fn test_no_op_update_is_empty() {
    let tree = sample_tree();
    let mut tracker = ChangeTracker::initialize(&[]);

    assert!(!tracker.update_current_state(&tree).is_empty());
    assert!(tracker.update_current_state(&tree).is_empty());
    assert!(tracker.changes().is_empty());
}

#[test]
fn test_snapshot_isolation_from_caller_tree() {
    let mut tree = sample_tree();
    let mut tracker = ChangeTracker::initialize(&[]);
    tracker.update_current_state(&tree);

    // Mutating the caller's tree must not leak into the tracker.
    tree[0].name = "Mutated".to_string();
    tree[0].sessions.clear();

    assert_eq!(tracker.current()[0].name, "Base");
    assert_eq!(tracker.current()[0].sessions.len(), 2);

    let original = sample_tree();
    assert!(tracker.update_current_state(&original).is_empty());
}

#[test]
fn test_cascade_deletion_lists_every_descendant() {
    let before = sample_tree();
    let mut tracker = ChangeTracker::initialize(&before);

    let after: Vec<Phase> = before.iter().filter(|p| p.id != "p1").cloned().collect();
    let changes = tracker.update_current_state(&after);

    assert_eq!(changes.deleted.phases, vec!["p1".to_string()]);
    assert_eq!(changes.deleted.sessions, vec!["s1".to_string(), "s2".to_string()]);
    assert_eq!(changes.deleted.exercises.len(), 6);
    assert!(changes.created.is_empty());
    assert!(changes.updated.is_empty());
}

#[test]
fn test_created_and_removed_within_window_is_invisible() {
    let before = sample_tree();
    let mut tracker = ChangeTracker::initialize(&before);

    let mut working = before.clone();
    working[1].sessions.push(session("temp", "p2", &["temp-e"]));
    working[1].sessions.clear();

    assert!(tracker.update_current_state(&working).is_empty());
}

#[test]
fn test_ui_only_fields_follow_options() {
    let before = sample_tree();
    let mut after = before.clone();
    after[0].is_expanded = true;
    after[0].sessions[1].is_expanded = true;

    let mut tracking = ChangeTracker::initialize(&before);
    let changes = tracking.update_current_state(&after);
    assert_eq!(changes.updated.phases.len(), 1);
    assert_eq!(changes.updated.phases[0].patch.is_expanded, Some(true));
    assert_eq!(changes.updated.sessions.len(), 1);

    let mut ignoring = ChangeTracker::with_options(
        &before,
        TrackerOptions {
            track_ui_fields: false,
        },
    );
    assert!(ignoring.update_current_state(&after).is_empty());
}

#[test]
fn test_moves_and_reorders_are_not_changes() {
    let before = sample_tree();
    let mut tracker = ChangeTracker::initialize(&before);

    let mut after = before.clone();
    let mut moved = after[0].sessions.remove(0);
    moved.phase_id = "p2".to_string();
    after[1].sessions.push(moved);
    after[0].order = 5;
    after[0].sessions[0].order = 3;

    assert!(tracker.update_current_state(&after).is_empty());

    // An order marker is an exercise field and does count
    after[1].sessions[0].exercises[0].order = OrderMarker::new("B1");
    let changes = tracker.update_current_state(&after);
    assert_eq!(changes.updated.exercises.len(), 1);
    assert_eq!(changes.updated.exercises[0].id, "e1");
}

#[test]
fn test_result_is_independent_of_sibling_order() {
    let before = sample_tree();
    let mut after = before.clone();
    after[0].sessions[0].exercises[2].reps_max = Some(12);
    after[1].name = "Peak block".to_string();
    after.push(Phase::new("p3", "plan", "Deload", 2));
    after[0].sessions.remove(1);

    let mut forward = ChangeTracker::initialize(&before);
    let forward_changes = forward.update_current_state(&after).clone();

    let mut reversed_before = before.clone();
    reversed_before.reverse();
    for phase in &mut reversed_before {
        phase.sessions.reverse();
    }
    let mut reversed_after = after.clone();
    reversed_after.reverse();
    for phase in &mut reversed_after {
        phase.sessions.reverse();
        for session in &mut phase.sessions {
            session.exercises.reverse();
        }
    }

    let mut backward = ChangeTracker::initialize(&reversed_before);
    let backward_changes = backward.update_current_state(&reversed_after).clone();

    assert_eq!(forward_changes, backward_changes);
    assert_eq!(forward_changes.deleted.exercises.len(), 3);
}

#[test]
fn test_previous_snapshot_advances_between_updates() {
    let first = sample_tree();
    let mut tracker = ChangeTracker::initialize(&first);

    let mut second = first.clone();
    second[1].name = "Peak v2".to_string();
    tracker.update_current_state(&second);

    let mut third = second.clone();
    third[1].name = "Peak v3".to_string();
    let changes = tracker.update_current_state(&third);

    // Only the most recent edit shows up; the first one is now history.
    assert_eq!(changes.updated.phases.len(), 1);
    assert_eq!(changes.updated.phases[0].patch.name.as_deref(), Some("Peak v3"));
    assert_eq!(tracker.previous()[1].name, "Peak v2");
}

#[test]
fn test_reset_clears_changes_and_rebaselines() {
    let before = sample_tree();
    let mut tracker = ChangeTracker::initialize(&before);

    let mut after = before.clone();
    after.pop();
    assert!(!tracker.update_current_state(&after).is_empty());

    tracker.reset(&after);
    assert!(tracker.changes().is_empty());
    assert!(tracker.update_current_state(&after).is_empty());
}

#[test]
fn test_end_to_end_creation_from_empty_tree() {
    let mut tracker = ChangeTracker::initialize(&[]);

    let mut p1 = Phase::new("p1", "plan", "Phase 1", 0);
    let mut s1 = Session::new("s1", "p1", "Session 1", 0);
    let e1 = PlanExercise {
        exercise_id: Some("squat".to_string()),
        sets_min: Some(3),
        sets_max: Some(5),
        ..PlanExercise::new("e1", "s1", "A1")
    };
    s1.exercises.push(e1.clone());
    p1.sessions.push(s1.clone());
    let tree = vec![p1.clone()];

    let changes = tracker.update_current_state(&tree);

    assert_eq!(changes.created.phases, vec![p1.without_children()]);
    assert_eq!(
        changes.created.sessions,
        vec![CreatedSession {
            phase_id: "p1".to_string(),
            session: s1.without_children(),
        }]
    );
    assert_eq!(
        changes.created.exercises,
        vec![CreatedExercise {
            session_id: "s1".to_string(),
            exercise: e1,
        }]
    );
    assert!(changes.updated.is_empty());
    assert!(changes.deleted.is_empty());
}

#[test]
fn test_no_id_appears_in_two_buckets() {
    let before = sample_tree();
    let mut after = before.clone();
    after[0].sessions[0].exercises[0].notes = Some("note".to_string());
    after[0].sessions[0].exercises.remove(1);
    after[0].sessions[0]
        .exercises
        .push(exercise("e9", "s1", "C1"));

    let changes = diff_phases(&before, &after, TrackerOptions::default());
    let created: Vec<&str> = changes
        .created
        .exercises
        .iter()
        .map(|c| c.exercise.id.as_str())
        .collect();
    let updated: Vec<&str> = changes.updated.exercises.iter().map(|u| u.id.as_str()).collect();
    let deleted: Vec<&str> = changes.deleted.exercises.iter().map(String::as_str).collect();

    assert_eq!(created, vec!["e9"]);
    assert_eq!(updated, vec!["e1"]);
    assert_eq!(deleted, vec!["e2"]);
    assert_eq!(
        changes.updated.exercises[0].patch,
        ExercisePatch {
            notes: Some(Some("note".to_string())),
            ..Default::default()
        }
    );
}
