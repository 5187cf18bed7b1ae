//! Outbox row operations.

use jiff::Timestamp;
use rusqlite::{params, types::Type};

use crate::{
    error::{DatabaseResultExt, Result},
    mutation::{MutationEvent, OutboxEntry, OutboxStatus},
};

const INSERT_EVENT_SQL: &str = "INSERT INTO outbox (queue_id, sequence, plan_id, operation, event, status, error, enqueued_at) VALUES (?1, ?2, ?3, ?4, ?5, 'pending', NULL, ?6)";
const DELETE_EVENT_SQL: &str = "DELETE FROM outbox WHERE id = ?1";
const MARK_FAILED_SQL: &str = "UPDATE outbox SET status = 'failed', error = ?1 WHERE id = ?2";
const SELECT_ENTRIES_SQL: &str = "SELECT id, queue_id, sequence, plan_id, operation, event, status, error, enqueued_at FROM outbox ORDER BY id";
const SELECT_ENTRIES_BY_STATUS_SQL: &str = "SELECT id, queue_id, sequence, plan_id, operation, event, status, error, enqueued_at FROM outbox WHERE status = ?1 ORDER BY id";
const DELETE_ALL_SQL: &str = "DELETE FROM outbox";
const DELETE_BY_STATUS_SQL: &str = "DELETE FROM outbox WHERE status = ?1";
const MAX_SEQUENCE_SQL: &str = "SELECT MAX(sequence) FROM outbox";

impl super::Database {
    fn build_entry_from_row(row: &rusqlite::Row) -> rusqlite::Result<OutboxEntry> {
        let event_json: String = row.get(5)?;
        let event = serde_json::from_str::<MutationEvent>(&event_json)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;

        let status_str: String = row.get(6)?;
        let status = status_str.parse::<OutboxStatus>().map_err(|_| {
            rusqlite::Error::FromSqlConversionFailure(
                6,
                Type::Text,
                format!("Invalid outbox status: {status_str}").into(),
            )
        })?;

        Ok(OutboxEntry {
            id: row.get(0)?,
            queue_id: row.get(1)?,
            sequence: row.get::<_, i64>(2)? as u64,
            plan_id: row.get(3)?,
            operation: row.get(4)?,
            status,
            error: row.get(7)?,
            enqueued_at: row.get::<_, String>(8)?.parse::<Timestamp>().map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(8, Type::Text, Box::new(e))
            })?,
            event,
        })
    }

    /// Records an event of queue `queue_id` as pending delivery and returns
    /// the row id. Recording the same sequence twice for one queue fails.
    pub fn insert_event(&self, queue_id: &str, event: &MutationEvent) -> Result<i64> {
        let event_json = serde_json::to_string(event)?;
        self.connection
            .execute(
                INSERT_EVENT_SQL,
                params![
                    queue_id,
                    event.sequence as i64,
                    event.plan_id,
                    event.operation(),
                    event_json,
                    Timestamp::now().to_string()
                ],
            )
            .db_context("Failed to insert outbox event")?;
        Ok(self.connection.last_insert_rowid())
    }

    /// Drops an acknowledged event. Returns whether a row was removed.
    pub fn remove_event(&self, id: i64) -> Result<bool> {
        let removed = self
            .connection
            .execute(DELETE_EVENT_SQL, params![id])
            .db_context("Failed to remove outbox event")?;
        Ok(removed > 0)
    }

    /// Keeps an undelivered event with the reason it failed.
    pub fn mark_failed(&self, id: i64, reason: &str) -> Result<bool> {
        let updated = self
            .connection
            .execute(MARK_FAILED_SQL, params![reason, id])
            .db_context("Failed to mark outbox event as failed")?;
        Ok(updated > 0)
    }

    /// Lists entries in insertion order, optionally restricted to one status.
    pub fn list_entries(&self, status: Option<OutboxStatus>) -> Result<Vec<OutboxEntry>> {
        let entries = match status {
            Some(status) => {
                let mut stmt = self
                    .connection
                    .prepare(SELECT_ENTRIES_BY_STATUS_SQL)
                    .db_context("Failed to prepare outbox query")?;
                let rows = stmt
                    .query_map(params![status.as_str()], Self::build_entry_from_row)
                    .db_context("Failed to query outbox")?;
                rows.collect::<rusqlite::Result<Vec<_>>>()
            }
            None => {
                let mut stmt = self
                    .connection
                    .prepare(SELECT_ENTRIES_SQL)
                    .db_context("Failed to prepare outbox query")?;
                let rows = stmt
                    .query_map([], Self::build_entry_from_row)
                    .db_context("Failed to query outbox")?;
                rows.collect::<rusqlite::Result<Vec<_>>>()
            }
        };
        entries.db_context("Failed to read outbox entry")
    }

    /// Deletes entries, optionally only those with the given status. Returns
    /// the number of rows removed.
    pub fn clear_entries(&self, status: Option<OutboxStatus>) -> Result<usize> {
        match status {
            Some(status) => self
                .connection
                .execute(DELETE_BY_STATUS_SQL, params![status.as_str()]),
            None => self.connection.execute(DELETE_ALL_SQL, []),
        }
        .db_context("Failed to clear outbox")
    }

    /// Highest sequence still present, across every queue.
    pub fn max_sequence(&self) -> Result<Option<u64>> {
        let max: Option<i64> = self
            .connection
            .query_row(MAX_SEQUENCE_SQL, [], |row| row.get(0))
            .db_context("Failed to read highest outbox sequence")?;
        Ok(max.map(|value| value as u64))
    }
}
