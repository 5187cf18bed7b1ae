//! Data models for the plan tree.
//!
//! A [`Plan`] owns [`Phase`]s, a phase owns [`Session`]s and a session owns
//! [`PlanExercise`]s. Every child carries its parent's id; the tree helpers
//! here keep those references consistent when entities are duplicated.
//!
//! All identifiers are opaque strings. New ones are minted with
//! [`mint_id`] and never reused.
//!
//! # Examples
//!
//! ```rust
//! use cadence_core::models::{Phase, Plan, PlanExercise, Session};
//!
//! let mut plan = Plan::new("plan-1", "Off-season", "client-1", "coach-1");
//! let mut phase = Phase::new("phase-1", &plan.id, "Base", 0);
//! let mut session = Session::new("session-1", &phase.id, "Lower body", 0);
//! session
//!     .exercises
//!     .push(PlanExercise::new("pe-1", &session.id, "A1"));
//! phase.sessions.push(session);
//! plan.phases.push(phase);
//!
//! assert_eq!(plan.entity_count(), 3);
//! assert!(plan.validate_links().is_empty());
//! ```

pub mod exercise;
pub mod order;
pub mod patch;
pub mod phase;
pub mod plan;
pub mod session;

#[cfg(test)]
mod tests;

pub use exercise::PlanExercise;
pub use order::{natural_cmp, OrderMarker};
pub use patch::{ExercisePatch, PhasePatch, SessionPatch};
pub use phase::Phase;
pub use plan::{DanglingLink, Plan};
pub use session::Session;

/// Mints a fresh, globally unique entity id.
pub fn mint_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
