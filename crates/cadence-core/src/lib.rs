//! Core library for Cadence, an offline-first workout plan editor.
//!
//! A coach edits a plan tree (plan → phases → sessions → exercises) locally
//! while every change is queued as a [`MutationEvent`] and delivered in order
//! to a persistence service. The crate provides:
//!
//! - [`models`]: the plan tree, patches and natural-order markers
//! - [`snapshot`]: deep copies used as independent baselines
//! - [`tracker`]: id-keyed diff of two tree snapshots into a [`ChangeSet`]
//! - [`mutation`]: events, the [`Transport`] seam, the per-plan
//!   [`MutationQueue`] and its optional SQLite outbox
//! - [`conflict`]: the conflicted state and the ways out of it
//! - [`editor`]: the [`Editor`] owning the tree, with optimistic actions and
//!   per-event rollback
//! - [`display`]: markdown formatting for terminal output
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use cadence_core::{EditorBuilder, MemoryTransport, Plan};
//!
//! # async fn example() -> cadence_core::Result<()> {
//! let transport = Arc::new(MemoryTransport::new());
//! let plan = Plan::new("plan-1", "Off-season", "client-1", "coach-1");
//! let mut editor = EditorBuilder::new(plan, "coach-1")
//!     .build(Arc::clone(&transport))
//!     .await?;
//!
//! let phase = editor.add_phase("Base")?;
//! let phase_id = phase.entity_id().map(str::to_string);
//! editor.finish(phase).await?;
//!
//! if let Some(phase_id) = phase_id {
//!     let session = editor.add_session(&phase_id, "Lower body")?;
//!     editor.finish(session).await?;
//! }
//! println!("{}", editor.plan());
//! # Ok(())
//! # }
//! ```

pub mod conflict;
pub mod db;
pub mod display;
pub mod editor;
pub mod error;
pub mod models;
pub mod mutation;
pub mod snapshot;
pub mod tracker;

// Re-export commonly used types
pub use conflict::{ConflictState, Resolution};
pub use display::{ChangeReport, ClearResult, Events, LocalDateTime, OutboxEntries};
pub use editor::{Editor, EditorBuilder, Submission};
pub use error::{Result, SyncError};
pub use models::{
    mint_id, natural_cmp, ExercisePatch, OrderMarker, Phase, PhasePatch, Plan, PlanExercise,
    Session, SessionPatch,
};
pub use mutation::{
    events_from_changes, EntityLevel, MemoryTransport, MutationEvent, MutationQueue,
    OperationKind, Outbox, OutboxEntry, OutboxStatus, Outcome, Transport, TransportResponse,
};
pub use snapshot::{deep_clone, Snapshot};
pub use tracker::{diff_phases, ChangeSet, ChangeTracker, TrackerOptions};
