//! Error types for the synchronization engine.

use std::path::PathBuf;

use crate::executor::QueryError;

/// Errors that can occur while building metadata, comparing or synchronizing.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// A table descriptor produced no eligible columns.
    #[error("Table '{table}' has no eligible columns")]
    NoColumns {
        /// The offending table.
        table: String,
    },

    /// More than one column of a table is marked auto-increment.
    #[error("Table '{table}' declares more than one auto-increment column: {columns:?}")]
    MultipleAutoIncrement {
        /// The offending table.
        table: String,
        /// The auto-increment columns.
        columns: Vec<String>,
    },

    /// A logical SQL type name could not be parsed.
    #[error("Unknown SQL type: {0}")]
    UnknownSqlType(String),

    /// A descriptor is missing required data.
    #[error("Invalid entity descriptor: {0}")]
    InvalidDescriptor(String),

    /// Reading the live catalog failed.
    #[error("Failed to introspect table '{table}': {source}")]
    Introspection {
        /// Table being introspected.
        table: String,
        /// Underlying database error.
        #[source]
        source: QueryError,
    },

    /// A corrective statement failed with a non-benign error.
    #[error("Failed to apply fix on table '{table}' ({sql}): {source}")]
    Apply {
        /// Table being synchronized.
        table: String,
        /// The statement that failed.
        sql: String,
        /// Underlying database error.
        #[source]
        source: QueryError,
    },

    /// The schema version ledger could not be read or written.
    #[error("Schema version ledger error: {0}")]
    Ledger(#[source] QueryError),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// IO error (reading schema files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse a schema file.
    #[error("Failed to parse schema file '{path}': {message}")]
    ParseError {
        /// Path to the schema file.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for synchronization operations.
pub type Result<T> = std::result::Result<T, SyncError>;
