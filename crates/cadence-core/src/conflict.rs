//! Conflict state of an editor and the ways out of it.

use std::fmt;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::{error::SyncError, models::Plan};

/// Whether the server has rejected one of our mutations as stale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConflictState {
    #[default]
    Clean,
    Conflicted {
        /// The server's `updated_at` at the time of the rejection
        server_updated_at: Timestamp,
        message: String,
    },
}

impl ConflictState {
    /// Builds the conflicted state from a transport error, if it is a
    /// conflict.
    pub fn from_error(error: &SyncError) -> Option<Self> {
        match error {
            SyncError::Conflict {
                server_updated_at,
                message,
            } => Some(ConflictState::Conflicted {
                server_updated_at: *server_updated_at,
                message: message.clone(),
            }),
            _ => None,
        }
    }

    pub fn is_conflicted(&self) -> bool {
        matches!(self, ConflictState::Conflicted { .. })
    }

    pub fn server_updated_at(&self) -> Option<Timestamp> {
        match self {
            ConflictState::Clean => None,
            ConflictState::Conflicted {
                server_updated_at, ..
            } => Some(*server_updated_at),
        }
    }

    /// Fails with [`SyncError::Conflicted`] while a conflict is unresolved.
    pub fn ensure_clean(&self) -> Result<(), SyncError> {
        match self.server_updated_at() {
            Some(server_updated_at) => Err(SyncError::Conflicted { server_updated_at }),
            None => Ok(()),
        }
    }
}

impl fmt::Display for ConflictState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictState::Clean => write!(f, "clean"),
            ConflictState::Conflicted {
                server_updated_at,
                message,
            } => write!(f, "conflicted: {message} (server updated at {server_updated_at})"),
        }
    }
}

/// How the user chose to leave the conflicted state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Discard local state and continue from the server's copy of the plan
    Reload(Plan),
    /// Keep local state and adopt the server's token so the next mutation
    /// replaces whatever the other editor wrote
    Overwrite,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_conflicts_enter_conflicted_state() {
        let at = Timestamp::from_second(1_700_000_000).unwrap();
        let conflict = SyncError::Conflict {
            server_updated_at: at,
            message: "stale".to_string(),
        };
        let state = ConflictState::from_error(&conflict).unwrap();
        assert!(state.is_conflicted());
        assert_eq!(state.server_updated_at(), Some(at));
        assert!(matches!(
            state.ensure_clean(),
            Err(SyncError::Conflicted { server_updated_at }) if server_updated_at == at
        ));

        assert!(ConflictState::from_error(&SyncError::transport("offline")).is_none());
        assert!(ConflictState::Clean.ensure_clean().is_ok());
    }
}
