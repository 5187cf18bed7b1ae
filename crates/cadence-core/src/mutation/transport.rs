//! The delivery seam between the queue and the persistence layer.

use std::future::Future;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::MutationEvent;
use crate::error::SyncError;

/// What the persistence layer answered for one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TransportResponse {
    /// Applied; `updated_at` is the plan's new concurrency token
    Acknowledged { updated_at: Timestamp },
    /// Rejected because the event's token did not match the server's
    Conflict {
        server_updated_at: Timestamp,
        message: String,
    },
    /// Not delivered, or rejected for any other reason
    Failed { message: String },
}

impl TransportResponse {
    /// Splits the response into the fresh token or the error to surface.
    pub fn into_result(self) -> Result<Timestamp, SyncError> {
        match self {
            TransportResponse::Acknowledged { updated_at } => Ok(updated_at),
            TransportResponse::Conflict {
                server_updated_at,
                message,
            } => Err(SyncError::Conflict {
                server_updated_at,
                message,
            }),
            TransportResponse::Failed { message } => Err(SyncError::Transport { message }),
        }
    }
}

/// Delivers mutation events to a remote store.
///
/// Implementations decide the wire (HTTP, a broker, an in-process fake). They
/// must not retry on their own behalf: the queue treats every response as
/// final for that event.
pub trait Transport: Send + Sync + 'static {
    fn deliver(&self, event: &MutationEvent) -> impl Future<Output = TransportResponse> + Send;
}
