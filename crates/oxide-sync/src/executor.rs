//! Query execution capability.
//!
//! The engine only needs to run catalog reads and DDL writes. Anything that
//! can do both implements [`QueryExecutor`]; adapters for the `sqlx` MySQL
//! and PostgreSQL pools are provided.

use std::future::Future;

use sqlx::mysql::{MySqlPool, MySqlRow};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::{Column, Row};
use tracing::debug;

/// A database error, carrying the message the tolerance table matches on.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct QueryError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl QueryError {
    /// Creates an error from a database message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Returns the database message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<sqlx::Error> for QueryError {
    fn from(err: sqlx::Error) -> Self {
        let message = match &err {
            sqlx::Error::Database(db) => db.message().to_string(),
            other => other.to_string(),
        };
        Self {
            message,
            source: Some(Box::new(err)),
        }
    }
}

/// One row of a catalog query, with every cell rendered as text.
///
/// Labels are matched case-insensitively since some catalogs report
/// upper-case column labels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogRow {
    labels: Vec<String>,
    values: Vec<Option<String>>,
}

impl CatalogRow {
    /// Creates a row from `(label, value)` pairs.
    #[must_use]
    pub fn from_pairs<L, V>(pairs: impl IntoIterator<Item = (L, Option<V>)>) -> Self
    where
        L: AsRef<str>,
        V: Into<String>,
    {
        let mut row = Self::default();
        for (label, value) in pairs {
            row.labels.push(label.as_ref().to_lowercase());
            row.values.push(value.map(Into::into));
        }
        row
    }

    /// Returns the value of a cell; `None` for SQL NULL or a missing label.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&str> {
        let label = label.to_lowercase();
        let idx = self.labels.iter().position(|l| *l == label)?;
        self.values[idx].as_deref()
    }

    /// Returns a cell parsed as an unsigned integer.
    #[must_use]
    pub fn get_u64(&self, label: &str) -> Option<u64> {
        self.get(label).and_then(|v| v.trim().parse().ok())
    }

    /// Returns the first cell (e.g. of a `COUNT(*)` query).
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        self.values.first().and_then(|v| v.as_deref())
    }
}

/// Runs SQL against a live database.
pub trait QueryExecutor: Send + Sync {
    /// Runs a query and returns its rows.
    fn fetch(&self, sql: &str) -> impl Future<Output = Result<Vec<CatalogRow>, QueryError>> + Send;

    /// Runs a statement and returns the number of affected rows.
    fn execute(&self, sql: &str) -> impl Future<Output = Result<u64, QueryError>> + Send;

    /// Returns the product name reported by the connection, if known.
    fn product_name(&self) -> Option<String> {
        None
    }
}

fn mysql_row(row: &MySqlRow) -> CatalogRow {
    CatalogRow::from_pairs(row.columns().iter().map(|column| {
        let value: Option<String> = row.try_get_unchecked(column.ordinal()).unwrap_or(None);
        (column.name(), value)
    }))
}

fn pg_row(row: &PgRow) -> CatalogRow {
    CatalogRow::from_pairs(row.columns().iter().map(|column| {
        let value: Option<String> = row.try_get_unchecked(column.ordinal()).unwrap_or(None);
        (column.name(), value)
    }))
}

// `raw_sql` uses the text protocol, so every cell decodes as a string.

impl QueryExecutor for MySqlPool {
    async fn fetch(&self, sql: &str) -> Result<Vec<CatalogRow>, QueryError> {
        debug!(sql = %sql, "Fetching");
        let rows = sqlx::raw_sql(sql).fetch_all(self).await?;
        Ok(rows.iter().map(mysql_row).collect())
    }

    async fn execute(&self, sql: &str) -> Result<u64, QueryError> {
        debug!(sql = %sql, "Executing");
        let result = sqlx::raw_sql(sql).execute(self).await?;
        Ok(result.rows_affected())
    }

    fn product_name(&self) -> Option<String> {
        Some("MySQL".to_string())
    }
}

impl QueryExecutor for PgPool {
    async fn fetch(&self, sql: &str) -> Result<Vec<CatalogRow>, QueryError> {
        debug!(sql = %sql, "Fetching");
        let rows = sqlx::raw_sql(sql).fetch_all(self).await?;
        Ok(rows.iter().map(pg_row).collect())
    }

    async fn execute(&self, sql: &str) -> Result<u64, QueryError> {
        debug!(sql = %sql, "Executing");
        let result = sqlx::raw_sql(sql).execute(self).await?;
        Ok(result.rows_affected())
    }

    fn product_name(&self) -> Option<String> {
        Some("PostgreSQL".to_string())
    }
}
