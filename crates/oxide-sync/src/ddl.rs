//! DDL generation.
//!
//! Turns canonical [`TableMetadata`] into dialect-specific statements. The
//! statement shapes come from the dialect's [`DialectStrategy`]; this module
//! composes them into the statement lists the comparator and synchronizer
//! work with.
//!
//! [`DialectStrategy`]: crate::dialect::DialectStrategy

use crate::dialect::{ColumnAspect, Dialect};
use crate::error::{Result, SyncError};
use crate::metadata::{ColumnMetadata, IndexDefinition, TableMetadata};

/// Separator used when several statements form one fix.
pub const STATEMENT_SEPARATOR: &str = ";\n";

/// Generates the statements creating a table.
///
/// The first statement is the `CREATE TABLE`; unique-group and named index
/// statements follow, then comment statements for dialects without inline
/// comments.
pub fn generate_create_table(table: &TableMetadata, dialect: Dialect) -> Result<Vec<String>> {
    if table.columns().is_empty() {
        return Err(SyncError::NoColumns {
            table: table.table_name().to_string(),
        });
    }

    let strategy = dialect.strategy();
    let mut statements = vec![strategy.create_table(table)];
    statements.extend(
        table
            .indexes()
            .iter()
            .map(|index| strategy.create_index(table.table_name(), index)),
    );
    statements.extend(strategy.comment_statements(table));
    Ok(statements)
}

/// Generates a single column definition.
#[must_use]
pub fn column_definition(column: &ColumnMetadata, dialect: Dialect) -> String {
    dialect.strategy().column_definition(column)
}

/// Generates the fix adding a missing column.
#[must_use]
pub fn add_column_sql(table: &TableMetadata, column: &ColumnMetadata, dialect: Dialect) -> String {
    join_statements(&dialect.strategy().add_column(table, column))
}

/// Generates the fix dropping an extra column.
#[must_use]
pub fn drop_column_sql(table: &TableMetadata, column: &str, dialect: Dialect) -> String {
    dialect.strategy().drop_column(table.table_name(), column)
}

/// Generates the fix converging one aspect of a column, if the dialect has one.
#[must_use]
pub fn alter_column_sql(
    table: &TableMetadata,
    column: &ColumnMetadata,
    aspect: ColumnAspect,
    dialect: Dialect,
) -> Option<String> {
    let statements = dialect.strategy().alter_column(table, column, aspect);
    (!statements.is_empty()).then(|| join_statements(&statements))
}

/// Generates the fix creating a missing index.
#[must_use]
pub fn create_index_sql(table: &TableMetadata, index: &IndexDefinition, dialect: Dialect) -> String {
    dialect.strategy().create_index(table.table_name(), index)
}

/// Generates the fix dropping an extra index.
#[must_use]
pub fn drop_index_sql(table: &TableMetadata, index: &str, dialect: Dialect) -> String {
    dialect.strategy().drop_index(table.table_name(), index)
}

/// Joins statements into one multi-statement fix.
#[must_use]
pub fn join_statements(statements: &[String]) -> String {
    statements.join(STATEMENT_SEPARATOR)
}

/// Splits a multi-statement fix on top-level `;`.
///
/// Semicolons inside quoted literals or identifiers are kept. Empty
/// statements are dropped.
#[must_use]
pub fn split_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in sql.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if matches!(c, '\'' | '"' | '`') => quote = Some(c),
            None if c == ';' => {
                let statement = current.trim();
                if !statement.is_empty() {
                    statements.push(statement.to_string());
                }
                current.clear();
                continue;
            }
            None => {}
        }
        current.push(c);
    }

    let statement = current.trim();
    if !statement.is_empty() {
        statements.push(statement.to_string());
    }
    statements
}
