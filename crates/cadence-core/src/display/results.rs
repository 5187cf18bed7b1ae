//! Wrappers for command results.

use std::fmt;

use crate::{mutation::OutboxStatus, tracker::ChangeSet};

/// Bucket summary of a change set.
///
/// # Examples
///
/// ```rust
/// use cadence_core::{display::ChangeReport, tracker::ChangeSet};
///
/// let changes = ChangeSet::default();
/// assert_eq!(format!("{}", ChangeReport(&changes)), "No changes.\n");
/// ```
pub struct ChangeReport<'a>(pub &'a ChangeSet);

impl<'a> fmt::Display for ChangeReport<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let changes = self.0;
        if changes.is_empty() {
            return writeln!(f, "No changes.");
        }

        if !changes.created.is_empty() {
            writeln!(f, "## Created")?;
            writeln!(f)?;
            for phase in &changes.created.phases {
                writeln!(f, "- phase `{}` {}", phase.id, phase.name)?;
            }
            for created in &changes.created.sessions {
                writeln!(
                    f,
                    "- session `{}` {} in phase `{}`",
                    created.session.id, created.session.name, created.phase_id
                )?;
            }
            for created in &changes.created.exercises {
                writeln!(
                    f,
                    "- exercise `{}` in session `{}`",
                    created.exercise.id, created.session_id
                )?;
            }
            writeln!(f)?;
        }

        if !changes.updated.is_empty() {
            writeln!(f, "## Updated")?;
            writeln!(f)?;
            for update in &changes.updated.phases {
                let fields = update.patch.changed_fields().join(", ");
                writeln!(f, "- phase `{}`: {fields}", update.id)?;
            }
            for update in &changes.updated.sessions {
                let fields = update.patch.changed_fields().join(", ");
                writeln!(f, "- session `{}`: {fields}", update.id)?;
            }
            for update in &changes.updated.exercises {
                let fields = update.patch.changed_fields().join(", ");
                writeln!(f, "- exercise `{}`: {fields}", update.id)?;
            }
            writeln!(f)?;
        }

        if !changes.deleted.is_empty() {
            writeln!(f, "## Deleted")?;
            writeln!(f)?;
            for id in &changes.deleted.phases {
                writeln!(f, "- phase `{id}`")?;
            }
            for id in &changes.deleted.sessions {
                writeln!(f, "- session `{id}`")?;
            }
            for id in &changes.deleted.exercises {
                writeln!(f, "- exercise `{id}`")?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

/// Result of clearing outbox entries.
pub struct ClearResult {
    pub removed: usize,
    pub status: Option<OutboxStatus>,
}

impl fmt::Display for ClearResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = if self.removed == 1 { "entry" } else { "entries" };
        match self.status {
            Some(status) => writeln!(f, "Removed {} {status} outbox {noun}", self.removed),
            None => writeln!(f, "Removed {} outbox {noun}", self.removed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{Phase, Session},
        tracker::{diff_phases, TrackerOptions},
    };

    #[test]
    fn test_change_report_lists_buckets() {
        let mut before = Phase::new("p1", "plan-1", "Base", 0);
        before.sessions.push(Session::new("s1", "p1", "Lower body", 0));
        let mut after = before.clone();
        after.name = "Foundation".to_string();
        after.sessions.clear();
        let added = Phase::new("p2", "plan-1", "Build", 1);

        let changes = diff_phases(&[before], &[after, added], TrackerOptions::default());
        let output = ChangeReport(&changes).to_string();

        assert!(output.contains("## Created\n\n- phase `p2` Build"));
        assert!(output.contains("- phase `p1`: name"));
        assert!(output.contains("## Deleted\n\n- session `s1`"));
    }

    #[test]
    fn test_clear_result() {
        let result = ClearResult {
            removed: 1,
            status: Some(OutboxStatus::Failed),
        };
        assert_eq!(result.to_string(), "Removed 1 failed outbox entry\n");
    }
}
