//! Async handle on the durable outbox.

use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use tokio::task;

use super::MutationEvent;
use crate::{
    db::Database,
    error::{Result, SyncError},
};

/// Delivery state of a persisted event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutboxStatus {
    /// Written, not yet answered
    Pending,
    /// Answered with a conflict or failure, or never delivered
    Failed,
}

impl OutboxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutboxStatus::Pending => "pending",
            OutboxStatus::Failed => "failed",
        }
    }
}

impl FromStr for OutboxStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OutboxStatus::Pending),
            "failed" => Ok(OutboxStatus::Failed),
            _ => Err(format!("Invalid outbox status: {s}")),
        }
    }
}

impl fmt::Display for OutboxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One persisted event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxEntry {
    /// Row key, unique across every queue sharing the file
    pub id: i64,
    /// The queue that numbered the event
    pub queue_id: String,
    pub sequence: u64,
    pub plan_id: String,
    /// Route name, e.g. `session-update`
    pub operation: String,
    pub status: OutboxStatus,
    pub error: Option<String>,
    pub enqueued_at: Timestamp,
    pub event: MutationEvent,
}

/// Durable outbox backed by a SQLite file.
///
/// Each call opens its own connection on the blocking pool, so the handle is
/// cheap to clone and share between delivery lanes.
#[derive(Debug, Clone)]
pub struct Outbox {
    db_path: PathBuf,
}

impl Outbox {
    /// Opens (creating if needed) the outbox at `path`.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();

        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| SyncError::FileSystem {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let outbox = Self { db_path };
        outbox.run(|_| Ok(())).await?;
        Ok(outbox)
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Persists `event`, numbered by queue `queue_id`, as pending. Returns
    /// the row id later passed to [`Outbox::acknowledge`] or
    /// [`Outbox::mark_failed`].
    pub async fn record(&self, queue_id: &str, event: &MutationEvent) -> Result<i64> {
        let queue_id = queue_id.to_string();
        let event = event.clone();
        self.run(move |db| db.insert_event(&queue_id, &event)).await
    }

    /// Forgets an acknowledged event.
    pub async fn acknowledge(&self, id: i64) -> Result<bool> {
        self.run(move |db| db.remove_event(id)).await
    }

    pub async fn mark_failed(&self, id: i64, reason: &str) -> Result<bool> {
        let reason = reason.to_string();
        self.run(move |db| db.mark_failed(id, &reason)).await
    }

    /// Lists entries in the order they were recorded.
    pub async fn entries(&self, status: Option<OutboxStatus>) -> Result<Vec<OutboxEntry>> {
        self.run(move |db| db.list_entries(status)).await
    }

    /// Removes entries and returns how many were dropped.
    pub async fn clear(&self, status: Option<OutboxStatus>) -> Result<usize> {
        self.run(move |db| db.clear_entries(status)).await
    }

    pub async fn max_sequence(&self) -> Result<Option<u64>> {
        self.run(Database::max_sequence).await
    }

    async fn run<F, R>(&self, operation: F) -> Result<R>
    where
        F: FnOnce(&Database) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let db_path = self.db_path.clone();
        task::spawn_blocking(move || {
            let db = Database::new(&db_path)?;
            operation(&db)
        })
        .await
        .map_err(|e| SyncError::Configuration {
            message: format!("Task join error: {e}"),
        })?
    }
}
