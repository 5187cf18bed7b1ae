//! Local checks run before any state is touched.

use crate::{
    error::{Result, SyncError},
    models::{Plan, PlanExercise},
};

/// Rejects a tree in which any parent id disagrees with its container.
pub(crate) fn validate_links(plan: &Plan) -> Result<()> {
    match plan.validate_links().first() {
        Some(link) => Err(SyncError::validation("parent_id").with_reason(format!(
            "{link} in plan {}",
            plan.id
        ))),
        None => Ok(()),
    }
}

pub(crate) fn validate_name(field: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(SyncError::validation(field).with_reason("Name cannot be empty"));
    }
    Ok(())
}

/// An exercise must reference a catalog entry and keep every min/max pair
/// in order.
pub(crate) fn validate_exercise(exercise: &PlanExercise) -> Result<()> {
    match exercise.exercise_id.as_deref().map(str::trim) {
        Some(reference) if !reference.is_empty() => {}
        _ => {
            return Err(SyncError::validation("exercise_id")
                .with_reason("Select an exercise from the catalog"))
        }
    }

    check_range("sets", exercise.sets_min, exercise.sets_max)?;
    check_range("reps", exercise.reps_min, exercise.reps_max)?;
    check_range("rest", exercise.rest_min, exercise.rest_max)?;
    Ok(())
}

fn check_range(field: &str, min: Option<u32>, max: Option<u32>) -> Result<()> {
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            return Err(SyncError::validation(format!("{field}_min"))
                .with_reason(format!("Minimum {min} is greater than maximum {max}")));
        }
    }
    Ok(())
}
