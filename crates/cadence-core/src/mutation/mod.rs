//! Mutation events and their delivery.
//!
//! Every user action on the plan tree becomes one [`MutationEvent`] that is
//! handed to a [`MutationQueue`]. The queue keeps one FIFO lane per plan,
//! stamps each event with the plan's last known `updated_at` right before
//! delivery and advances that token from every acknowledgement:
//!
//! ```text
//! submit(e1) ─┐
//! submit(e2) ─┼─▶ lane(plan) ─▶ stamp token ─▶ outbox ─▶ Transport::deliver
//! submit(e3) ─┘        ▲                                   │
//!                      └──────── token = updated_at ◀──────┘
//! ```
//!
//! An event may depend on an earlier one (`depends_on`); if the prerequisite
//! did not succeed the dependent event is never delivered and resolves to
//! [`SyncError::DependencyFailed`](crate::SyncError::DependencyFailed).
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use cadence_core::{
//!     models::{Phase, Plan},
//!     mutation::{MemoryTransport, MutationEvent, MutationQueue},
//! };
//!
//! # async fn example() -> cadence_core::Result<()> {
//! let queue = MutationQueue::new(Arc::new(MemoryTransport::new()));
//! let plan = Plan::new("plan-1", "Off-season", "client-1", "coach-1");
//!
//! let create_plan = queue.submit(MutationEvent::create_plan(&plan, "coach-1"))?;
//! let phase = Phase::new("phase-1", &plan.id, "Base", 0);
//! let create_phase = queue.submit(
//!     MutationEvent::create_phase(&plan.id, &phase, "coach-1")
//!         .depending_on(Some(create_plan.sequence())),
//! )?;
//!
//! assert!(create_plan.outcome().await.is_success());
//! assert!(create_phase.outcome().await.is_success());
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod event;
pub mod memory;
pub mod outbox;
pub mod queue;
pub mod transport;

#[cfg(test)]
mod tests;

pub use batch::events_from_changes;
pub use event::{EntityLevel, MutationEvent, MutationPayload, OperationKind};
pub use memory::MemoryTransport;
pub use outbox::{Outbox, OutboxEntry, OutboxStatus};
pub use queue::{Acknowledgement, MutationQueue, Outcome, Pending};
pub use transport::{Transport, TransportResponse};
