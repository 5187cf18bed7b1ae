use std::{cmp::Ordering, collections::HashSet};

use super::*;

fn sample_phase() -> Phase {
    let mut phase = Phase::new("p1", "plan", "Base", 0);
    let mut session = Session::new("s1", "p1", "Lower body", 0);
    session.exercises.push(PlanExercise {
        exercise_id: Some("squat".to_string()),
        sets_min: Some(3),
        sets_max: Some(5),
        ..PlanExercise::new("e1", "s1", "A1")
    });
    session.exercises.push(PlanExercise {
        exercise_id: Some("lunge".to_string()),
        sets: Some(3),
        rest: Some(90),
        ..PlanExercise::new("e2", "s1", "A2")
    });
    phase.sessions.push(session);
    phase
}

#[test]
fn test_phase_duplicate_rekeys_whole_subtree() {
    let original = sample_phase();
    let copy = original.duplicate(1);

    assert_ne!(copy.id, original.id);
    assert_eq!(copy.plan_id, original.plan_id);
    assert_eq!(copy.name, "Base (Copy)");
    assert_eq!(copy.order, 1);
    assert!(!copy.is_active);

    assert_eq!(copy.sessions.len(), 1);
    let session = &copy.sessions[0];
    assert_ne!(session.id, "s1");
    assert_eq!(session.phase_id, copy.id);

    assert_eq!(session.exercises.len(), 2);
    for exercise in &session.exercises {
        assert_eq!(exercise.session_id, session.id);
    }
    assert_eq!(session.exercises[0].exercise_id.as_deref(), Some("squat"));

    let original_ids: HashSet<&str> = ["p1", "s1", "e1", "e2"].into_iter().collect();
    let copy_ids: HashSet<&str> = std::iter::once(copy.id.as_str())
        .chain(std::iter::once(session.id.as_str()))
        .chain(session.exercises.iter().map(|e| e.id.as_str()))
        .collect();
    assert_eq!(copy_ids.len(), 4);
    assert!(copy_ids.is_disjoint(&original_ids));
}

#[test]
fn test_session_duplicate_attaches_to_target_phase() {
    let original = sample_phase().sessions.remove(0);
    let copy = original.duplicate("p2", 3);

    assert_ne!(copy.id, original.id);
    assert_eq!(copy.phase_id, "p2");
    assert_eq!(copy.order, 3);
    assert!(copy.exercises.iter().all(|e| e.session_id == copy.id));
    assert!(copy
        .exercises
        .iter()
        .all(|e| e.id != "e1" && e.id != "e2"));
}

#[test]
fn test_order_markers_sort_naturally() {
    let mut markers: Vec<OrderMarker> = ["B1", "A10", "A2", "A1"]
        .into_iter()
        .map(OrderMarker::from)
        .collect();
    markers.sort();
    let sorted: Vec<&str> = markers.iter().map(OrderMarker::as_str).collect();
    assert_eq!(sorted, ["A1", "A2", "A10", "B1"]);
}

#[test]
fn test_natural_cmp_edge_cases() {
    assert_eq!(natural_cmp("a1", "A1"), Ordering::Equal);
    assert_eq!(natural_cmp("A01", "A1"), Ordering::Equal);
    assert_eq!(natural_cmp("9", "A"), Ordering::Less);
    assert_eq!(natural_cmp("A", "A1"), Ordering::Less);
    assert_eq!(natural_cmp("A99999999999999999999", "A100000000000000000000"), Ordering::Less);
    // Naturally equal markers still have a total order
    assert_ne!(OrderMarker::from("A01").cmp(&OrderMarker::from("A1")), Ordering::Equal);
}

#[test]
fn test_next_order_marker() {
    assert_eq!(OrderMarker::next_after(None).as_str(), "A1");
    assert_eq!(OrderMarker::next_after(Some(&"A2".into())).as_str(), "A3");
    assert_eq!(OrderMarker::next_after(Some(&"B9".into())).as_str(), "B10");
    assert_eq!(OrderMarker::next_after(Some(&"Warmup".into())).as_str(), "Warmup1");

    let session = &sample_phase().sessions[0];
    assert_eq!(session.next_order_marker().as_str(), "A3");
}

#[test]
fn test_sorted_exercises_uses_natural_order() {
    let mut session = Session::new("s1", "p1", "Day", 0);
    for (id, order) in [("x", "A10"), ("y", "A2"), ("z", "B1")] {
        session.exercises.push(PlanExercise::new(id, "s1", order));
    }
    let ids: Vec<&str> = session
        .sorted_exercises()
        .into_iter()
        .map(|e| e.id.as_str())
        .collect();
    assert_eq!(ids, ["y", "x", "z"]);
}

#[test]
fn test_recompute_duration() {
    let mut session = sample_phase().sessions.remove(0);
    session.recompute_duration();
    // e1: 5 sets x (45 + 60) = 525 s, e2: 3 sets x (45 + 90) = 405 s
    assert_eq!(session.duration, Some(16));

    session.exercises.clear();
    session.recompute_duration();
    assert_eq!(session.duration, None);
}

#[test]
fn test_remove_and_reinsert_restores_position() {
    let mut plan = Plan::new("plan", "Strength", "client", "coach");
    for (i, name) in ["Base", "Build", "Peak"].into_iter().enumerate() {
        plan.phases
            .push(Phase::new(format!("p{i}"), "plan", name, i as u32));
    }

    let (index, phase) = plan.remove_phase("p1").unwrap();
    assert_eq!(index, 1);
    assert!(plan.phase("p1").is_none());

    plan.insert_phase(index, phase);
    let names: Vec<&str> = plan.phases.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Base", "Build", "Peak"]);
    assert_eq!(plan.next_phase_order(), 3);
    assert!(plan.remove_phase("missing").is_none());
}

#[test]
fn test_validate_links_reports_dangling_children() {
    let mut plan = Plan::new("plan", "Strength", "client", "coach");
    plan.phases.push(sample_phase());
    assert!(plan.validate_links().is_empty());
    assert_eq!(plan.entity_count(), 4);

    plan.phases[0].sessions[0].exercises[1].session_id = "elsewhere".to_string();
    let dangling = plan.validate_links();
    assert_eq!(dangling.len(), 1);
    assert_eq!(dangling[0].entity_id, "e2");
    assert_eq!(dangling[0].expected_parent, "s1");
    assert_eq!(dangling[0].actual_parent, "elsewhere");
}

#[test]
fn test_exercise_patch_apply_and_clear() {
    let before = sample_phase().sessions[0].exercises[0].clone();
    let mut after = before.clone();
    after.sets_max = None;
    after.tempo = Some("2-0-2-0".to_string());

    let patch = ExercisePatch::between(&before, &after);
    assert_eq!(patch.changed_fields(), ["sets_max", "tempo"]);

    let mut target = before.clone();
    patch.apply_to(&mut target);
    assert_eq!(target, after);
}

#[test]
fn test_patch_null_survives_json() {
    let patch = ExercisePatch {
        notes: Some(None),
        reps_min: Some(Some(8)),
        ..Default::default()
    };
    let json = serde_json::to_string(&patch).unwrap();
    assert_eq!(json, r#"{"reps_min":8,"notes":null}"#);

    let parsed: ExercisePatch = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, patch);
    assert_eq!(parsed.sets_min, None);
}

#[test]
fn test_phase_patch_ignores_ui_fields_when_asked() {
    let before = Phase::new("p1", "plan", "Base", 0);
    let mut after = before.clone();
    after.is_expanded = true;

    assert!(PhasePatch::between(&before, &after, false).is_empty());
    assert_eq!(
        PhasePatch::between(&before, &after, true).is_expanded,
        Some(true)
    );
}

#[test]
fn test_mint_id_is_unique() {
    let ids: HashSet<String> = (0..100).map(|_| mint_id()).collect();
    assert_eq!(ids.len(), 100);
}
