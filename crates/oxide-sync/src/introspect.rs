//! Catalog introspection.
//!
//! Reads table, column and index facts from the live catalog using the
//! dialect's catalog queries. Identifiers are case-folded to lower case
//! since some catalogs report them upper-case.

use serde::Serialize;
use tracing::{debug, warn};

use crate::dialect::Dialect;
use crate::error::{Result, SyncError};
use crate::executor::{CatalogRow, QueryExecutor};

/// A column as reported by the live catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiveColumnFact {
    /// Column name (lower case).
    pub name: String,
    /// Type name in the dialect's vocabulary.
    pub reported_type: String,
    /// Character length.
    pub length: Option<u64>,
    /// Numeric precision.
    pub precision: Option<u64>,
    /// Numeric scale.
    pub scale: Option<u64>,
    /// Whether NULL is allowed.
    pub nullable: bool,
    /// Raw default expression.
    pub default_value: Option<String>,
    /// Heuristic auto-increment detection.
    pub auto_increment: bool,
}

/// An index as reported by the live catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiveIndexFact {
    /// Index name (lower case).
    pub name: String,
    /// Member columns in index order.
    pub columns: Vec<String>,
    /// Whether the index is unique.
    pub unique: bool,
}

/// Reads schema facts from a live database.
pub struct Introspector<'a, E> {
    executor: &'a E,
    dialect: Dialect,
}

impl<'a, E: QueryExecutor> Introspector<'a, E> {
    /// Creates an introspector for the given connection and dialect.
    pub const fn new(executor: &'a E, dialect: Dialect) -> Self {
        Self { executor, dialect }
    }

    /// Returns the dialect.
    #[must_use]
    pub const fn dialect(&self) -> Dialect {
        self.dialect
    }

    async fn fetch(&self, table: &str, sql: &str) -> Result<Vec<CatalogRow>> {
        debug!(table = %table, sql = %sql, "Querying catalog");
        self.executor
            .fetch(sql)
            .await
            .map_err(|source| SyncError::Introspection {
                table: table.to_string(),
                source,
            })
    }

    /// Checks whether a table exists.
    pub async fn table_exists(&self, table: &str) -> Result<bool> {
        let sql = self.dialect.strategy().table_exists_query(table);
        let rows = self.fetch(table, &sql).await?;
        let count = rows
            .first()
            .and_then(CatalogRow::first)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(0);
        Ok(count > 0)
    }

    /// Lists the columns of a table.
    pub async fn list_columns(&self, table: &str) -> Result<Vec<LiveColumnFact>> {
        let strategy = self.dialect.strategy();
        let rows = self.fetch(table, &strategy.columns_query(table)).await?;

        // Rows are restricted to the current schema; should a catalog still
        // return several, only the first schema's table is read.
        let schema = rows.first().and_then(|row| row.get("table_schema"));
        let mut facts: Vec<LiveColumnFact> = Vec::with_capacity(rows.len());
        for row in &rows {
            if row.get("table_schema") != schema {
                warn!(
                    table = %table,
                    schema = ?row.get("table_schema"),
                    "Ignoring column of a same-named table in another schema"
                );
                continue;
            }
            let Some(name) = row.get("column_name") else {
                continue;
            };
            let name = name.trim().to_lowercase();
            let default_value = row.get("column_default").map(str::to_string);
            let auto_increment =
                strategy.is_auto_increment(&name, default_value.as_deref(), row.get("extra"));

            facts.push(LiveColumnFact {
                reported_type: row.get("data_type").unwrap_or_default().trim().to_string(),
                length: row.get_u64("character_maximum_length"),
                precision: row.get_u64("numeric_precision"),
                scale: row.get_u64("numeric_scale"),
                nullable: row
                    .get("is_nullable")
                    .is_some_and(|v| v.trim().eq_ignore_ascii_case("YES")),
                default_value,
                auto_increment,
                name,
            });
        }
        Ok(facts)
    }

    /// Lists the indexes of a table.
    pub async fn list_indexes(&self, table: &str) -> Result<Vec<LiveIndexFact>> {
        let strategy = self.dialect.strategy();
        let rows = self.fetch(table, &strategy.indexes_query(table)).await?;
        Ok(strategy.index_facts(&rows))
    }
}
