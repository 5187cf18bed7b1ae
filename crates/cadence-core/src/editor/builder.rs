//! Builder for creating and configuring Editor instances.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use super::Editor;
use crate::{
    error::{Result, SyncError},
    models::Plan,
    mutation::{MutationQueue, Outbox, Transport},
    tracker::TrackerOptions,
};

/// Where the editor keeps its durable outbox.
#[derive(Debug, Clone, PartialEq, Eq)]
enum OutboxLocation {
    None,
    Default,
    Path(PathBuf),
}

/// Builder for creating and configuring Editor instances.
#[derive(Debug, Clone)]
pub struct EditorBuilder {
    plan: Plan,
    actor_id: String,
    options: TrackerOptions,
    outbox: OutboxLocation,
}

impl EditorBuilder {
    /// Starts a builder for editing `plan` as `actor_id`.
    pub fn new(plan: Plan, actor_id: impl Into<String>) -> Self {
        Self {
            plan,
            actor_id: actor_id.into(),
            options: TrackerOptions::default(),
            outbox: OutboxLocation::None,
        }
    }

    pub fn with_tracker_options(mut self, options: TrackerOptions) -> Self {
        self.options = options;
        self
    }

    /// Persists queued events in a SQLite outbox at `path`.
    pub fn with_outbox_path<P: AsRef<Path>>(mut self, path: Option<P>) -> Self {
        if let Some(path) = path {
            self.outbox = OutboxLocation::Path(path.as_ref().to_path_buf());
        }
        self
    }

    /// Persists queued events in the default outbox, following the XDG Base
    /// Directory specification: `$XDG_DATA_HOME/cadence/outbox.db` or
    /// `~/.local/share/cadence/outbox.db`.
    pub fn with_default_outbox(mut self) -> Self {
        self.outbox = OutboxLocation::Default;
        self
    }

    /// Builds the editor around a queue delivering through `transport`.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::XdgDirectory` if the default outbox location
    /// cannot be determined, `SyncError::FileSystem` if its directory cannot
    /// be created, `SyncError::Database` if the outbox cannot be opened and
    /// `SyncError::Validation` if a parent id in the plan is dangling.
    pub async fn build<T: Transport>(self, transport: Arc<T>) -> Result<Editor<T>> {
        let outbox_path = match self.outbox {
            OutboxLocation::None => None,
            OutboxLocation::Default => Some(default_outbox_path()?),
            OutboxLocation::Path(path) => Some(path),
        };

        let mut queue = MutationQueue::new(transport);
        if let Some(path) = outbox_path {
            queue = queue.with_outbox(Outbox::open(path).await?).await?;
        }

        Editor::new(self.plan, self.actor_id, queue, self.options)
    }
}

/// Returns the default outbox path following the XDG Base Directory
/// specification.
pub fn default_outbox_path() -> Result<PathBuf> {
    xdg::BaseDirectories::with_prefix("cadence")
        .place_data_file("outbox.db")
        .map_err(|e| SyncError::XdgDirectory(e.to_string()))
}
