//! MySQL dialect.

use super::{parse_bool_literal, quote_literal, sized_type, Dialect, DialectStrategy};
use crate::metadata::{ColumnMetadata, SqlType, TableMetadata};

/// MySQL-like dialect (MySQL, MariaDB).
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl DialectStrategy for MySqlDialect {
    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }

    fn quote_char(&self) -> char {
        '`'
    }

    fn type_name(&self, column: &ColumnMetadata) -> String {
        match column.sql_type {
            // MySQL treats REAL as DOUBLE unless REAL_AS_FLOAT is set.
            SqlType::Real => "FLOAT".to_string(),
            other => sized_type(other.name(), column),
        }
    }

    fn render_default(&self, column: &ColumnMetadata) -> Option<String> {
        let value = column.default_value.as_deref()?;
        if column.default_is_expression {
            return Some(value.to_string());
        }
        if column.sql_type == SqlType::Boolean {
            if let Some(b) = parse_bool_literal(value) {
                return Some(if b { "1" } else { "0" }.to_string());
            }
        }
        Some(quote_literal(value))
    }

    fn table_options(&self, table: &TableMetadata) -> String {
        let mut options = String::new();
        if let Some(engine) = table.storage_engine() {
            options.push_str(&format!(" ENGINE={}", engine));
        }
        if let Some(charset) = table.charset() {
            options.push_str(&format!(" DEFAULT CHARSET={}", charset));
        }
        if let Some(collation) = table.collation() {
            options.push_str(&format!(" COLLATE={}", collation));
        }
        if let Some(comment) = table.comment() {
            options.push_str(&format!(" COMMENT={}", quote_literal(comment)));
        }
        options
    }

    fn drop_index(&self, table: &str, index: &str) -> String {
        format!(
            "DROP INDEX {} ON {}",
            self.quote_identifier(index),
            self.quote_identifier(table)
        )
    }

    fn current_schema(&self) -> &'static str {
        "DATABASE()"
    }

    fn columns_query(&self, table: &str) -> String {
        format!(
            "SELECT column_name, data_type, character_maximum_length, numeric_precision, \
             numeric_scale, is_nullable, column_default, extra, table_schema \
             FROM information_schema.columns WHERE table_name = {} AND table_schema = DATABASE()",
            quote_literal(table)
        )
    }

    fn indexes_query(&self, table: &str) -> String {
        format!(
            "SELECT index_name, column_name, non_unique FROM information_schema.statistics \
             WHERE table_name = {} AND table_schema = DATABASE() \
             ORDER BY index_name, seq_in_index",
            quote_literal(table)
        )
    }

    fn is_auto_increment(&self, _column: &str, _default: Option<&str>, extra: Option<&str>) -> bool {
        extra.is_some_and(|e| e.to_lowercase().contains("auto_increment"))
    }

    fn type_aliases(&self) -> &'static [(&'static str, &'static str)] {
        // BOOLEAN is stored as TINYINT(1); BIT(1) is the other common spelling.
        &[("boolean", "tinyint"), ("boolean", "bit"), ("bool", "tinyint")]
    }
}
