//! H2 dialect (MySQL compatibility mode), used as the embedded test database.

use super::{quote_literal, sized_type, Dialect, DialectStrategy};
use crate::metadata::ColumnMetadata;

/// Embedded H2-like dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct H2Dialect;

impl DialectStrategy for H2Dialect {
    fn dialect(&self) -> Dialect {
        Dialect::H2
    }

    fn type_name(&self, column: &ColumnMetadata) -> String {
        sized_type(column.sql_type.name(), column)
    }

    fn current_schema(&self) -> &'static str {
        "SCHEMA()"
    }

    fn table_exists_query(&self, table: &str) -> String {
        format!(
            "SELECT COUNT(*) FROM INFORMATION_SCHEMA.TABLES WHERE TABLE_NAME = {} \
             AND TABLE_SCHEMA = SCHEMA()",
            quote_literal(table)
        )
    }

    fn columns_query(&self, table: &str) -> String {
        format!(
            "SELECT COLUMN_NAME, DATA_TYPE, CHARACTER_MAXIMUM_LENGTH, NUMERIC_PRECISION, \
             NUMERIC_SCALE, IS_NULLABLE, COLUMN_DEFAULT, TABLE_SCHEMA \
             FROM INFORMATION_SCHEMA.COLUMNS WHERE TABLE_NAME = {} AND TABLE_SCHEMA = SCHEMA()",
            quote_literal(table)
        )
    }

    fn indexes_query(&self, table: &str) -> String {
        format!(
            "SELECT INDEX_NAME, COLUMN_NAME, IS_UNIQUE FROM INFORMATION_SCHEMA.INDEX_COLUMNS \
             WHERE TABLE_NAME = {} AND TABLE_SCHEMA = SCHEMA() \
             ORDER BY INDEX_NAME, ORDINAL_POSITION",
            quote_literal(table)
        )
    }

    /// H2 reports identity columns inconsistently across versions and
    /// compatibility modes, so an `id`-like column without a default also
    /// counts as auto-increment.
    fn is_auto_increment(&self, column: &str, default: Option<&str>, _extra: Option<&str>) -> bool {
        match default.map(str::trim).filter(|d| !d.is_empty()) {
            Some(default) => {
                let upper = default.to_uppercase();
                upper.contains("AUTO_INCREMENT")
                    || upper.contains("NEXT VALUE FOR")
                    || upper.contains("IDENTITY")
            }
            None => column.to_lowercase().contains("id"),
        }
    }

    fn type_aliases(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("boolean", "bit"),
            ("text", "character large object"),
            ("double", "double precision"),
        ]
    }
}
