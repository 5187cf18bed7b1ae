//! Exercise order markers with natural ordering.

use std::{cmp::Ordering, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Free-form alphanumeric label sequencing exercises within a session
/// ("A1", "A2", "B1", ...).
///
/// Ordering is numeric-aware: digit runs compare by value, so `A2` sorts
/// before `A10`. Text runs compare case-insensitively. Markers that are
/// naturally equal but spelled differently ("A01" and "A1") fall back to a
/// plain string comparison so the order stays total.
///
/// # Examples
///
/// ```rust
/// use cadence_core::models::OrderMarker;
///
/// let mut markers: Vec<OrderMarker> = ["A1", "A2", "B1", "A10"]
///     .into_iter()
///     .map(OrderMarker::from)
///     .collect();
/// markers.sort();
///
/// let sorted: Vec<&str> = markers.iter().map(OrderMarker::as_str).collect();
/// assert_eq!(sorted, ["A1", "A2", "A10", "B1"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderMarker(String);

impl OrderMarker {
    pub fn new(marker: impl Into<String>) -> Self {
        Self(marker.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Derives the marker that follows `previous` by incrementing its
    /// trailing number (`A2` becomes `A3`). Without a previous marker the
    /// sequence starts at `A1`.
    pub fn next_after(previous: Option<&OrderMarker>) -> Self {
        let Some(previous) = previous else {
            return Self::new("A1");
        };

        let marker = previous.as_str();
        let trailing = marker
            .chars()
            .rev()
            .take_while(char::is_ascii_digit)
            .count();
        let (prefix, digits) = marker.split_at(marker.len() - trailing);

        match digits.parse::<u64>().ok().and_then(|n| n.checked_add(1)) {
            Some(next) => Self(format!("{prefix}{next}")),
            None => Self(format!("{marker}1")),
        }
    }
}

impl From<&str> for OrderMarker {
    fn from(marker: &str) -> Self {
        Self(marker.to_string())
    }
}

impl From<String> for OrderMarker {
    fn from(marker: String) -> Self {
        Self(marker)
    }
}

impl FromStr for OrderMarker {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for OrderMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Ord for OrderMarker {
    fn cmp(&self, other: &Self) -> Ordering {
        natural_cmp(&self.0, &other.0).then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for OrderMarker {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Compares two strings chunk by chunk, treating runs of ASCII digits as
/// numbers.
pub fn natural_cmp(left: &str, right: &str) -> Ordering {
    let mut left_chunks = chunks(left);
    let mut right_chunks = chunks(right);

    loop {
        match (left_chunks.next(), right_chunks.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(a), Some(b)) => {
                let ordering = compare_chunks(a, b);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}

fn compare_chunks(a: &str, b: &str) -> Ordering {
    let a_numeric = a.starts_with(|c: char| c.is_ascii_digit());
    let b_numeric = b.starts_with(|c: char| c.is_ascii_digit());

    match (a_numeric, b_numeric) {
        (true, true) => {
            // Compare by magnitude without parsing so arbitrarily long runs work.
            let a = a.trim_start_matches('0');
            let b = b.trim_start_matches('0');
            a.len().cmp(&b.len()).then_with(|| a.cmp(b))
        }
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a
            .chars()
            .flat_map(char::to_lowercase)
            .cmp(b.chars().flat_map(char::to_lowercase)),
    }
}

/// Splits a string into alternating digit and non-digit runs.
fn chunks(s: &str) -> impl Iterator<Item = &str> {
    let mut rest = s;
    std::iter::from_fn(move || {
        let first = rest.chars().next()?;
        let numeric = first.is_ascii_digit();
        let end = rest
            .find(|c: char| c.is_ascii_digit() != numeric)
            .unwrap_or(rest.len());
        let (chunk, tail) = rest.split_at(end);
        rest = tail;
        Some(chunk)
    })
}
