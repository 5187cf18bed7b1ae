//! Error types for the synchronization core.

use std::path::PathBuf;

use jiff::Timestamp;
use thiserror::Error;

use crate::mutation::EntityLevel;

/// Comprehensive error type for editor, tracker and queue operations.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Input rejected locally before any event was queued
    #[error("Invalid input for field '{field}': {reason}")]
    Validation { field: String, reason: String },
    /// The targeted entity does not exist in the local tree
    #[error("{level} with ID {id} not found")]
    NotFound { level: EntityLevel, id: String },
    /// The server rejected a mutation because its concurrency token is stale
    #[error("Conflict: {message} (server updated at {server_updated_at})")]
    Conflict {
        server_updated_at: Timestamp,
        message: String,
    },
    /// The event could not be delivered or the server returned a non-conflict
    /// error
    #[error("Transport error: {message}")]
    Transport { message: String },
    /// A prerequisite event did not succeed, so the dependent event was never
    /// delivered
    #[error("Event {sequence} not delivered: prerequisite event {prerequisite} failed ({reason})")]
    DependencyFailed {
        sequence: u64,
        prerequisite: u64,
        reason: String,
    },
    /// The editor holds an unresolved conflict and refuses the action
    #[error("Plan has an unresolved conflict (server updated at {server_updated_at}); reload or overwrite first")]
    Conflicted { server_updated_at: Timestamp },
    /// The delivery lane stopped before answering
    #[error("Mutation queue closed before the event was delivered")]
    QueueClosed,
    /// Outbox database errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: rusqlite::Error,
    },
    /// File system operation errors
    #[error("File system error at path '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        source: std::io::Error,
    },
    /// XDG directory specification errors
    #[error("XDG directory error: {0}")]
    XdgDirectory(String),
    /// Serialization/deserialization errors
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Builder for creating database errors with optional context.
pub struct DatabaseErrorBuilder {
    message: String,
}

impl DatabaseErrorBuilder {
    /// Create a new database error builder with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Build the error with the given source.
    pub fn with_source(self, source: rusqlite::Error) -> SyncError {
        SyncError::Database {
            message: self.message,
            source,
        }
    }
}

/// Builder for creating validation errors.
pub struct ValidationBuilder {
    field: String,
}

impl ValidationBuilder {
    /// Create a new validation error builder for a field.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// Build the error with the given reason.
    pub fn with_reason(self, reason: impl Into<String>) -> SyncError {
        SyncError::Validation {
            field: self.field,
            reason: reason.into(),
        }
    }
}

impl SyncError {
    /// Creates a builder for database errors.
    pub fn database(message: impl Into<String>) -> DatabaseErrorBuilder {
        DatabaseErrorBuilder::new(message)
    }

    /// Creates a builder for validation errors.
    pub fn validation(field: impl Into<String>) -> ValidationBuilder {
        ValidationBuilder::new(field)
    }

    pub fn not_found(level: EntityLevel, id: impl Into<String>) -> Self {
        Self::NotFound {
            level,
            id: id.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Whether the error is a stale-token rejection rather than a generic
    /// failure.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// The server's `updated_at` carried by a conflict, if any.
    pub fn server_updated_at(&self) -> Option<Timestamp> {
        match self {
            Self::Conflict {
                server_updated_at, ..
            }
            | Self::Conflicted { server_updated_at } => Some(*server_updated_at),
            _ => None,
        }
    }
}

/// Specialized extension trait for database-related Results.
pub trait DatabaseResultExt<T> {
    /// Map database errors with a message.
    fn db_context(self, message: &str) -> Result<T>;
}

impl<T> DatabaseResultExt<T> for std::result::Result<T, rusqlite::Error> {
    fn db_context(self, message: &str) -> Result<T> {
        self.map_err(|e| SyncError::database(message).with_source(e))
    }
}

/// Result type alias for synchronization operations
pub type Result<T> = std::result::Result<T, SyncError>;
