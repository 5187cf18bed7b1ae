//! Database schema initialization and migrations.

use log::info;

use crate::error::{DatabaseResultExt, Result};

const SCHEMA_SQL: &str = include_str!("../../assets/schema.sql");

/// Rows of an outbox keyed by sequence alone, copied under a shared queue id.
const COPY_LEGACY_ROWS_SQL: &str = "INSERT INTO outbox (queue_id, sequence, plan_id, operation, event, status, error, enqueued_at) SELECT 'legacy', sequence, plan_id, operation, event, status, error, enqueued_at FROM outbox_legacy ORDER BY sequence;";

impl super::Database {
    /// Initializes the database schema using the embedded SQL file.
    pub(super) fn initialize_schema(&self) -> Result<()> {
        // Several queues may write the same file concurrently
        self.connection
            .busy_timeout(std::time::Duration::from_secs(5))
            .db_context("Failed to set busy timeout")?;

        if self.has_legacy_outbox()? {
            return self.migrate_legacy_outbox();
        }

        self.connection
            .execute_batch(SCHEMA_SQL)
            .db_context("Failed to initialize database schema")?;

        Ok(())
    }

    /// Whether the file holds an outbox from before rows had their own key.
    fn has_legacy_outbox(&self) -> Result<bool> {
        let columns: Vec<String> = {
            let mut stmt = self
                .connection
                .prepare("SELECT name FROM pragma_table_info('outbox')")
                .db_context("Failed to inspect outbox table")?;
            let rows = stmt
                .query_map([], |row| row.get(0))
                .db_context("Failed to inspect outbox table")?;
            rows.collect::<rusqlite::Result<_>>()
                .db_context("Failed to read outbox columns")?
        };

        Ok(!columns.is_empty() && !columns.iter().any(|c| c == "queue_id"))
    }

    /// Rebuilds a legacy outbox in the current layout, keeping every row.
    fn migrate_legacy_outbox(&self) -> Result<()> {
        let has_error_column: bool = self
            .connection
            .query_row(
                "SELECT COUNT(*) FROM pragma_table_info('outbox') WHERE name = 'error'",
                [],
                |row| row.get(0),
            )
            .map(|count: i64| count > 0)
            .db_context("Failed to inspect outbox table")?;
        let add_error_column = if has_error_column {
            ""
        } else {
            "ALTER TABLE outbox_legacy ADD COLUMN error TEXT;"
        };

        let batch = format!(
            "BEGIN IMMEDIATE;
             DROP INDEX IF EXISTS idx_outbox_plan;
             DROP INDEX IF EXISTS idx_outbox_status;
             ALTER TABLE outbox RENAME TO outbox_legacy;
             {add_error_column}
             {SCHEMA_SQL}
             {COPY_LEGACY_ROWS_SQL}
             DROP TABLE outbox_legacy;
             COMMIT;"
        );
        self.connection
            .execute_batch(&batch)
            .db_context("Failed to migrate legacy outbox table")?;

        info!("Migrated legacy outbox table");
        Ok(())
    }
}
