//! SQLite storage for the durable outbox.
//!
//! Every event the queue hands to a transport is written here first, so a
//! crash or a lost connection never silently drops an optimistic edit. Rows
//! are deleted on acknowledgement and kept, marked failed, otherwise.

use std::path::Path;

use rusqlite::Connection;

use crate::error::{DatabaseResultExt, Result};

pub mod migrations;
pub mod outbox_queries;

/// Database connection and operations handler.
pub struct Database {
    connection: Connection,
}

impl Database {
    /// Opens the database at `path` and initializes the schema.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let connection = Connection::open(path).db_context("Failed to open database connection")?;

        let db = Self { connection };
        db.initialize_schema()?;
        Ok(db)
    }
}
