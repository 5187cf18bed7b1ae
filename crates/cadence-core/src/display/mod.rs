//! Markdown formatting for plans, change sets, events and outbox entries.
//!
//! Domain types implement [`std::fmt::Display`] directly (see [`models`]);
//! collections and command results get newtype wrappers so empty inputs and
//! headings are handled in one place.
//!
//! ```text
//! ┌─────────────────┐    ┌──────────────────┐    ┌─────────────────┐
//! │  Domain Models  │    │ Collections &    │    │   Markdown      │
//! │ (Plan, Event)   │───▶│ Result Wrappers  │───▶│ (terminal/CLI)  │
//! └─────────────────┘    └──────────────────┘    └─────────────────┘
//! ```
//!
//! # Examples
//!
//! ```rust
//! use cadence_core::{
//!     display::{ChangeReport, Events},
//!     models::Phase,
//!     mutation::events_from_changes,
//!     tracker::ChangeTracker,
//! };
//!
//! let mut tracker = ChangeTracker::initialize(&[]);
//! tracker.update_current_state(&[Phase::new("p1", "plan-1", "Base", 0)]);
//!
//! let report = format!("{}", ChangeReport(tracker.changes()));
//! assert!(report.contains("## Created"));
//!
//! let events = Events(events_from_changes("plan-1", "coach-1", &tracker));
//! assert!(format!("{events}").contains("phase-create"));
//! ```

pub mod collections;
pub mod datetime;
pub mod models;
pub mod results;

pub use collections::{Events, OutboxEntries};
pub use datetime::LocalDateTime;
pub use results::{ChangeReport, ClearResult};
