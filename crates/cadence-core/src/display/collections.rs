//! Collection wrappers with empty-collection handling.

use std::{fmt, ops::Index};

use crate::mutation::{MutationEvent, OutboxEntry};

/// Newtype wrapper for displaying a batch of mutation events, one per line.
///
/// # Examples
///
/// ```rust
/// use cadence_core::{display::Events, mutation::MutationEvent};
///
/// let events = Events(Vec::<MutationEvent>::new());
/// assert_eq!(format!("{events}"), "No events.\n");
/// ```
pub struct Events(pub Vec<MutationEvent>);

impl Events {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MutationEvent> {
        self.0.iter()
    }
}

impl Index<usize> for Events {
    type Output = MutationEvent;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl<'a> IntoIterator for &'a Events {
    type Item = &'a MutationEvent;
    type IntoIter = std::slice::Iter<'a, MutationEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Events {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No events.");
        }
        for event in &self.0 {
            writeln!(f, "- {event}")?;
        }
        Ok(())
    }
}

/// Newtype wrapper for displaying outbox entries.
pub struct OutboxEntries(pub Vec<OutboxEntry>);

impl OutboxEntries {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OutboxEntry> {
        self.0.iter()
    }
}

impl IntoIterator for OutboxEntries {
    type Item = OutboxEntry;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for OutboxEntries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "Outbox is empty.");
        }
        for entry in &self.0 {
            write!(f, "{entry}")?;
        }
        Ok(())
    }
}
