//! Schema version tracking.
//!
//! This module manages the `oxide_schema_versions` table that records which
//! schema version each table was last synchronized to.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

use crate::dialect::{quote_literal, Dialect};
use crate::error::{Result, SyncError};
use crate::executor::QueryExecutor;

/// Name of the ledger table.
pub const LEDGER_TABLE: &str = "oxide_schema_versions";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A ledger record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
    /// Synchronized table.
    pub table_name: String,
    /// Schema version the table was synchronized to.
    pub schema_version: u32,
    /// When the table was synchronized, if the value could be parsed.
    pub synced_at: Option<DateTime<Utc>>,
}

/// Manages the schema version ledger in the database.
pub struct VersionLedger<'a, E> {
    executor: &'a E,
    dialect: Dialect,
}

impl<'a, E: QueryExecutor> VersionLedger<'a, E> {
    /// Creates a ledger manager.
    pub const fn new(executor: &'a E, dialect: Dialect) -> Self {
        Self { executor, dialect }
    }

    fn table(&self) -> String {
        self.dialect.strategy().quote_identifier(LEDGER_TABLE)
    }

    /// Returns the statement creating the ledger table.
    #[must_use]
    pub fn create_table_sql(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n  \
             table_name VARCHAR(255) NOT NULL,\n  \
             schema_version INT NOT NULL,\n  \
             synced_at TIMESTAMP NULL,\n  \
             PRIMARY KEY (table_name)\n)",
            self.table()
        )
    }

    /// Ensures the ledger table exists.
    pub async fn ensure_table(&self) -> Result<()> {
        self.executor
            .execute(&self.create_table_sql())
            .await
            .map_err(SyncError::Ledger)?;
        Ok(())
    }

    /// Returns the recorded version of a table.
    pub async fn recorded_version(&self, table: &str) -> Result<Option<u32>> {
        let sql = format!(
            "SELECT schema_version FROM {} WHERE table_name = {}",
            self.table(),
            quote_literal(table)
        );
        let rows = self.executor.fetch(&sql).await.map_err(SyncError::Ledger)?;
        Ok(rows
            .first()
            .and_then(|row| row.get_u64("schema_version"))
            .and_then(|v| u32::try_from(v).ok()))
    }

    /// Records a table as synchronized to a version.
    pub async fn record(&self, table: &str, version: u32) -> Result<()> {
        let name = quote_literal(table);
        let delete = format!("DELETE FROM {} WHERE table_name = {}", self.table(), name);
        let insert = format!(
            "INSERT INTO {} (table_name, schema_version, synced_at) VALUES ({}, {}, {})",
            self.table(),
            name,
            version,
            quote_literal(&Utc::now().format(TIMESTAMP_FORMAT).to_string())
        );
        for sql in [delete, insert] {
            self.executor.execute(&sql).await.map_err(SyncError::Ledger)?;
        }
        Ok(())
    }

    /// Gets all ledger entries ordered by table name.
    pub async fn entries(&self) -> Result<Vec<LedgerEntry>> {
        let sql = format!(
            "SELECT table_name, schema_version, synced_at FROM {} ORDER BY table_name",
            self.table()
        );
        let rows = self.executor.fetch(&sql).await.map_err(SyncError::Ledger)?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let Some(table_name) = row.get("table_name") else {
                continue;
            };
            entries.push(LedgerEntry {
                table_name: table_name.to_string(),
                schema_version: row
                    .get_u64("schema_version")
                    .and_then(|v| u32::try_from(v).ok())
                    .unwrap_or(0),
                synced_at: row.get("synced_at").and_then(parse_timestamp),
            });
        }
        Ok(entries)
    }
}

/// Parses a timestamp as databases return it in text form.
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f")
                .map(|dt| dt.and_utc())
                .ok()
        })
}
