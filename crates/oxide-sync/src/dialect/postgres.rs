//! PostgreSQL dialect.
//!
//! PostgreSQL has no inline comments and no `MODIFY COLUMN`: comments become
//! trailing `COMMENT ON` statements and column fixes use the
//! `ALTER COLUMN ... TYPE` / `SET` / `DROP` sub-forms.

use super::{quote_literal, sized_type, ColumnAspect, Dialect, DialectStrategy};
use crate::executor::CatalogRow;
use crate::introspect::LiveIndexFact;
use crate::metadata::{ColumnMetadata, SqlType, TableMetadata};

/// PostgreSQL-like dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Returns the SERIAL type replacing an auto-increment integer column.
    const fn serial_type(column: &ColumnMetadata) -> Option<&'static str> {
        if !column.auto_increment {
            return None;
        }
        match column.sql_type {
            SqlType::Int => Some("SERIAL"),
            SqlType::BigInt => Some("BIGSERIAL"),
            SqlType::SmallInt | SqlType::TinyInt => Some("SMALLSERIAL"),
            _ => None,
        }
    }

    fn column_comment(&self, table: &str, column: &ColumnMetadata) -> Option<String> {
        column.comment.as_ref().map(|comment| {
            format!(
                "COMMENT ON COLUMN {}.{} IS {}",
                self.quote_identifier(table),
                self.quote_identifier(&column.name),
                quote_literal(comment)
            )
        })
    }
}

impl DialectStrategy for PostgresDialect {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn type_name(&self, column: &ColumnMetadata) -> String {
        match column.sql_type {
            SqlType::Int => "INTEGER".to_string(),
            SqlType::SmallInt | SqlType::TinyInt => "SMALLINT".to_string(),
            SqlType::Double => "DOUBLE PRECISION".to_string(),
            other => sized_type(other.name(), column),
        }
    }

    fn auto_increment_keyword(&self) -> Option<&'static str> {
        None
    }

    fn inline_comments(&self) -> bool {
        false
    }

    fn supports_modify_column(&self) -> bool {
        false
    }

    fn column_definition(&self, column: &ColumnMetadata) -> String {
        let name = self.quote_identifier(&column.name);

        // SERIAL implies NOT NULL and a sequence default.
        if let Some(serial) = Self::serial_type(column) {
            return format!("{} {}", name, serial);
        }

        let mut sql = format!("{} {}", name, self.type_name(column));
        if !column.nullable || column.is_primary_key {
            sql.push_str(" NOT NULL");
        }
        if let Some(default) = self.render_default(column) {
            sql.push_str(" DEFAULT ");
            sql.push_str(&default);
        }
        sql
    }

    fn comment_statements(&self, table: &TableMetadata) -> Vec<String> {
        let mut statements = Vec::new();
        if let Some(comment) = table.comment() {
            statements.push(format!(
                "COMMENT ON TABLE {} IS {}",
                self.quote_identifier(table.table_name()),
                quote_literal(comment)
            ));
        }
        statements.extend(
            table
                .columns()
                .iter()
                .filter_map(|c| self.column_comment(table.table_name(), c)),
        );
        statements
    }

    fn add_column(&self, table: &TableMetadata, column: &ColumnMetadata) -> Vec<String> {
        let mut statements = vec![format!(
            "ALTER TABLE {} ADD COLUMN {}",
            self.quote_identifier(table.table_name()),
            self.column_definition(column)
        )];
        statements.extend(self.column_comment(table.table_name(), column));
        statements
    }

    fn alter_column(
        &self,
        table: &TableMetadata,
        column: &ColumnMetadata,
        aspect: ColumnAspect,
    ) -> Vec<String> {
        let prefix = format!(
            "ALTER TABLE {} ALTER COLUMN {}",
            self.quote_identifier(table.table_name()),
            self.quote_identifier(&column.name)
        );
        match aspect {
            ColumnAspect::Type => {
                let ty = self.type_name(column);
                vec![format!(
                    "{} TYPE {} USING {}::{}",
                    prefix,
                    ty,
                    self.quote_identifier(&column.name),
                    ty
                )]
            }
            ColumnAspect::Nullable => {
                if column.nullable && !column.is_primary_key {
                    vec![format!("{} DROP NOT NULL", prefix)]
                } else {
                    vec![format!("{} SET NOT NULL", prefix)]
                }
            }
            ColumnAspect::Default => match self.render_default(column) {
                Some(default) => vec![format!("{} SET DEFAULT {}", prefix, default)],
                None => vec![format!("{} DROP DEFAULT", prefix)],
            },
            // Turning a column into SERIAL needs a sequence; report only.
            ColumnAspect::AutoIncrement => Vec::new(),
        }
    }

    fn current_schema(&self) -> &'static str {
        "current_schema()"
    }

    fn indexes_query(&self, table: &str) -> String {
        format!(
            "SELECT indexname, indexdef FROM pg_indexes WHERE tablename = {} \
             AND schemaname = current_schema()",
            quote_literal(table)
        )
    }

    fn index_facts(&self, rows: &[CatalogRow]) -> Vec<LiveIndexFact> {
        rows.iter()
            .filter_map(|row| {
                let name = row.get("indexname")?;
                let definition = row.get("indexdef")?;
                Some(LiveIndexFact {
                    name: name.to_lowercase(),
                    columns: index_columns(definition),
                    unique: definition.to_uppercase().starts_with("CREATE UNIQUE"),
                })
            })
            .collect()
    }

    fn is_auto_increment(&self, _column: &str, default: Option<&str>, _extra: Option<&str>) -> bool {
        default.is_some_and(|d| d.to_lowercase().contains("nextval("))
    }
}

/// Extracts the column list of a `pg_indexes.indexdef` value, e.g.
/// `CREATE UNIQUE INDEX i ON public.t USING btree (a, b)`.
fn index_columns(definition: &str) -> Vec<String> {
    let Some(open) = definition.find('(') else {
        return Vec::new();
    };
    let Some(close) = definition.rfind(')') else {
        return Vec::new();
    };
    if close <= open {
        return Vec::new();
    }
    definition[open + 1..close]
        .split(',')
        .map(|c| c.trim().trim_matches('"').to_lowercase())
        .filter(|c| !c.is_empty())
        .collect()
}
