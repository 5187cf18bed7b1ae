//! Display implementations for domain models.
//!
//! Kept apart from the model definitions; everything renders as markdown.

use std::fmt;

use super::datetime::{LocalDateTime, VersionToken};
use crate::{
    models::{DanglingLink, Phase, Plan, PlanExercise, Session},
    mutation::{MutationEvent, OutboxEntry, OutboxStatus},
};

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# {} ({})", self.name, self.id)?;
        writeln!(f)?;
        writeln!(f, "- Client: {}", self.client_id)?;
        writeln!(f, "- Trainer: {}", self.trainer_id)?;
        writeln!(
            f,
            "- Status: {}",
            if self.is_active { "active" } else { "inactive" }
        )?;
        writeln!(f, "- Updated: {}", VersionToken(&self.updated_at))?;

        if self.phases.is_empty() {
            writeln!(f, "\nNo phases in this plan.")?;
            return Ok(());
        }

        let mut phases: Vec<&Phase> = self.phases.iter().collect();
        phases.sort_by_key(|p| p.order);
        for phase in phases {
            writeln!(f)?;
            write!(f, "{phase}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if self.is_active { " (active)" } else { "" };
        writeln!(f, "## {}{marker}", self.name)?;

        let mut sessions: Vec<&Session> = self.sessions.iter().collect();
        sessions.sort_by_key(|s| s.order);
        for session in sessions {
            writeln!(f)?;
            write!(f, "{session}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.duration {
            Some(minutes) => writeln!(f, "### {} ({minutes} min)", self.name)?,
            None => writeln!(f, "### {}", self.name)?,
        }
        writeln!(f)?;

        if self.exercises.is_empty() {
            return writeln!(f, "No exercises.");
        }
        for exercise in self.sorted_exercises() {
            writeln!(f, "- {exercise}")?;
        }
        Ok(())
    }
}

impl fmt::Display for PlanExercise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "**{}** {}",
            self.order,
            self.exercise_id.as_deref().unwrap_or("(no exercise)")
        )?;

        let mut prescription = Vec::new();
        if let Some(sets) = range(self.sets_min, self.sets_max, self.sets) {
            prescription.push(format!("{sets} sets"));
        }
        if let Some(reps) = range(self.reps_min, self.reps_max, self.reps) {
            prescription.push(format!("{reps} reps"));
        }
        if let Some(rest) = range(self.rest_min, self.rest_max, self.rest) {
            prescription.push(format!("rest {rest}s"));
        }
        if let Some(tempo) = &self.tempo {
            prescription.push(format!("tempo {tempo}"));
        }
        if !prescription.is_empty() {
            write!(f, ": {}", prescription.join(", "))?;
        }
        if let Some(notes) = &self.notes {
            write!(f, " ({notes})")?;
        }
        Ok(())
    }
}

/// `min-max`, a single bound, or the legacy single value.
fn range(min: Option<u32>, max: Option<u32>, legacy: Option<u32>) -> Option<String> {
    match (min, max) {
        (Some(min), Some(max)) if min != max => Some(format!("{min}-{max}")),
        (Some(value), _) | (None, Some(value)) => Some(value.to_string()),
        (None, None) => legacy.map(|value| value.to_string()),
    }
}

impl fmt::Display for MutationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {} `{}`", self.sequence, self.operation(), self.target_id())?;
        if let Some(prerequisite) = self.depends_on {
            write!(f, " after #{prerequisite}")?;
        }
        Ok(())
    }
}

impl fmt::Display for DanglingLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "`{}` points at `{}` but lives under `{}`",
            self.entity_id, self.actual_parent, self.expected_parent
        )
    }
}

impl fmt::Display for OutboxEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let icon = match self.status {
            OutboxStatus::Pending => "○",
            OutboxStatus::Failed => "✗",
        };
        writeln!(
            f,
            "### #{} {} `{}` ({icon} {})",
            self.sequence,
            self.operation,
            self.event.target_id(),
            self.status
        )?;
        writeln!(f)?;
        writeln!(f, "- Plan: {}", self.plan_id)?;
        writeln!(f, "- Queue: {}", self.queue_id)?;
        writeln!(f, "- Enqueued: {}", LocalDateTime(&self.enqueued_at))?;
        if let Some(error) = &self.error {
            writeln!(f, "- Error: {error}")?;
        }
        writeln!(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exercise_prescription() {
        let exercise = PlanExercise {
            exercise_id: Some("squat".to_string()),
            sets_min: Some(3),
            sets_max: Some(4),
            reps: Some(8),
            rest_min: Some(90),
            rest_max: Some(90),
            tempo: Some("3-1-1".to_string()),
            ..PlanExercise::new("e1", "s1", "A1")
        };
        assert_eq!(
            exercise.to_string(),
            "**A1** squat: 3-4 sets, 8 reps, rest 90s, tempo 3-1-1"
        );
    }

    #[test]
    fn test_plan_tree_is_sorted() {
        let mut plan = Plan::new("plan-1", "Off-season", "client-1", "coach-1");
        let mut late = Phase::new("p2", "plan-1", "Peak", 1);
        late.is_active = true;
        let mut early = Phase::new("p1", "plan-1", "Base", 0);
        early.sessions.push(Session::new("s1", "p1", "Lower body", 0));
        plan.phases.push(late);
        plan.phases.push(early);

        let output = plan.to_string();
        assert!(output.contains("- Updated: never saved"));
        assert!(output.contains("## Peak (active)"));
        assert!(output.contains("No exercises."));
        let base = output.find("## Base").unwrap();
        let peak = output.find("## Peak").unwrap();
        assert!(base < peak);
    }

    #[test]
    fn test_event_line() {
        let phase = Phase::new("p1", "plan-1", "Base", 0);
        let mut event =
            MutationEvent::create_phase("plan-1", &phase, "coach-1").depending_on(Some(1));
        event.sequence = 2;
        assert_eq!(event.to_string(), "#2 phase-create `p1` after #1");
    }
}
