//! Independent copies of the plan tree.
//!
//! Domain values own all of their data (strings, vectors, timestamps), so a
//! `Clone` is already a deep copy with no shared mutable state. [`Snapshot`]
//! makes that guarantee explicit at the type level: it is built from a
//! borrowed value and only ever hands out shared references, so nothing the
//! caller does to its own tree afterwards can reach the captured copy.

use std::ops::Deref;

/// Returns a fully independent copy of `value`.
pub fn deep_clone<T: Clone>(value: &T) -> T {
    value.clone()
}

/// A frozen, read-only copy of a value taken at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot<T> {
    value: T,
}

impl<T: Clone> Snapshot<T> {
    /// Captures a deep copy of `value`.
    pub fn capture(value: &T) -> Self {
        Self {
            value: deep_clone(value),
        }
    }
}

impl<T: Clone> Snapshot<Vec<T>> {
    /// Captures a deep copy of a slice.
    pub fn capture_slice(values: &[T]) -> Self {
        Self {
            value: values.to_vec(),
        }
    }
}

impl<T> Snapshot<T> {
    /// Consumes the snapshot, returning the captured value.
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> Deref for Snapshot<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> AsRef<T> for Snapshot<T> {
    fn as_ref(&self) -> &T {
        &self.value
    }
}
