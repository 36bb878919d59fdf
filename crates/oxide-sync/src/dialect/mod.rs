//! Database dialect implementations.
//!
//! Every dialect-dependent decision (quoting, type rendering, auto-increment
//! syntax, comment placement, catalog query text, auto-increment detection,
//! type aliases and `ALTER TABLE` forms) lives behind [`DialectStrategy`].
//! Each supported database is one implementation.

mod h2;
mod mysql;
mod postgres;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub use h2::H2Dialect;
pub use mysql::MySqlDialect;
pub use postgres::PostgresDialect;

use crate::error::SyncError;
use crate::executor::{CatalogRow, QueryExecutor};
use crate::introspect::LiveIndexFact;
use crate::metadata::{ColumnMetadata, IndexDefinition, SqlType, TableMetadata};

/// The supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// MySQL-like (MySQL, MariaDB).
    MySql,
    /// PostgreSQL-like.
    Postgres,
    /// Embedded H2-like, in MySQL compatibility mode.
    H2,
}

impl Dialect {
    /// Returns the strategy implementing this dialect.
    #[must_use]
    pub fn strategy(self) -> &'static dyn DialectStrategy {
        match self {
            Self::MySql => &MySqlDialect,
            Self::Postgres => &PostgresDialect,
            Self::H2 => &H2Dialect,
        }
    }

    /// Returns the dialect name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::MySql => "mysql",
            Self::Postgres => "postgresql",
            Self::H2 => "h2",
        }
    }

    /// Maps a product name reported by a connection to a dialect.
    ///
    /// Unknown or missing products fall back to MySQL-like so that
    /// synchronization stays available.
    #[must_use]
    pub fn from_product_name(product: Option<&str>) -> Self {
        let Some(product) = product else {
            warn!("Database product unknown, falling back to MySQL dialect");
            return Self::MySql;
        };
        let lower = product.to_lowercase();
        if lower.contains("postgres") {
            Self::Postgres
        } else if lower.contains("h2") {
            Self::H2
        } else if lower.contains("mysql") || lower.contains("mariadb") {
            Self::MySql
        } else {
            warn!(product = %product, "Unrecognized database product, falling back to MySQL dialect");
            Self::MySql
        }
    }

    /// Determines the dialect of a live connection.
    pub fn detect<E: QueryExecutor>(executor: &E) -> Self {
        Self::from_product_name(executor.product_name().as_deref())
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Self::MySql),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            "h2" => Ok(Self::H2),
            other => Err(SyncError::InvalidDescriptor(format!(
                "unknown dialect '{}'",
                other
            ))),
        }
    }
}

/// Which aspect of a column an `ALTER` fix targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnAspect {
    /// Type, length or precision.
    Type,
    /// Nullability.
    Nullable,
    /// Default value.
    Default,
    /// Auto-increment.
    AutoIncrement,
}

/// Quotes a string literal, doubling embedded single quotes.
#[must_use]
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Parses a boolean literal the way defaults spell them.
#[must_use]
pub fn parse_bool_literal(value: &str) -> Option<bool> {
    match value.trim().trim_matches('\'').to_lowercase().as_str() {
        "true" | "1" | "b'1'" => Some(true),
        "false" | "0" | "b'0'" => Some(false),
        _ => None,
    }
}

/// Renders `BASE(n)` or `BASE(p, s)` from the column's declared sizes.
fn sized_type(base: &str, column: &ColumnMetadata) -> String {
    match column.sql_type {
        SqlType::Varchar => {
            let length = if column.length > 0 { column.length } else { 255 };
            format!("{}({})", base, length)
        }
        SqlType::Decimal if column.precision > 0 => {
            format!("{}({}, {})", base, column.precision, column.scale)
        }
        _ => base.to_string(),
    }
}

/// Trait for database-specific SQL generation and catalog access.
pub trait DialectStrategy: Send + Sync {
    /// Returns the dialect this strategy implements.
    fn dialect(&self) -> Dialect;

    /// Returns the identifier quote character.
    fn quote_char(&self) -> char {
        '"'
    }

    /// Quote an identifier (table name, column name, etc.).
    fn quote_identifier(&self, name: &str) -> String {
        let q = self.quote_char();
        let escaped = name.replace(q, &format!("{q}{q}"));
        format!("{q}{escaped}{q}")
    }

    /// Returns the SQL type of a column, including length or precision.
    fn type_name(&self, column: &ColumnMetadata) -> String;

    /// Returns the auto-increment keyword, if the dialect uses one.
    fn auto_increment_keyword(&self) -> Option<&'static str> {
        Some("AUTO_INCREMENT")
    }

    /// Returns whether column and table comments are rendered inline.
    fn inline_comments(&self) -> bool {
        true
    }

    /// Returns whether `ALTER TABLE ... MODIFY COLUMN` is supported.
    fn supports_modify_column(&self) -> bool {
        true
    }

    /// Renders the default clause value of a column.
    fn render_default(&self, column: &ColumnMetadata) -> Option<String> {
        let value = column.default_value.as_deref()?;
        if column.default_is_expression {
            Some(value.to_string())
        } else {
            Some(quote_literal(value))
        }
    }

    /// Generates a column definition.
    fn column_definition(&self, column: &ColumnMetadata) -> String {
        let mut sql = format!(
            "{} {}",
            self.quote_identifier(&column.name),
            self.type_name(column)
        );

        if !column.nullable || column.is_primary_key {
            sql.push_str(" NOT NULL");
        }

        if !column.auto_increment {
            if let Some(default) = self.render_default(column) {
                sql.push_str(" DEFAULT ");
                sql.push_str(&default);
            }
        }

        if column.auto_increment {
            if let Some(keyword) = self.auto_increment_keyword() {
                sql.push(' ');
                sql.push_str(keyword);
            }
        }

        if self.inline_comments() {
            if let Some(comment) = &column.comment {
                sql.push_str(" COMMENT ");
                sql.push_str(&quote_literal(comment));
            }
        }

        sql
    }

    /// Returns the options appended after the column list.
    fn table_options(&self, table: &TableMetadata) -> String {
        match table.comment() {
            Some(comment) if self.inline_comments() => {
                format!(" COMMENT={}", quote_literal(comment))
            }
            _ => String::new(),
        }
    }

    /// Generates SQL for CREATE TABLE.
    fn create_table(&self, table: &TableMetadata) -> String {
        let mut sql = String::from("CREATE TABLE ");
        sql.push_str(&self.quote_identifier(table.table_name()));
        sql.push_str(" (\n  ");

        let mut definitions: Vec<String> = table
            .columns()
            .iter()
            .map(|c| self.column_definition(c))
            .collect();
        if let Some(pk) = table.primary_key() {
            definitions.push(format!("PRIMARY KEY ({})", self.quote_identifier(pk)));
        }
        sql.push_str(&definitions.join(",\n  "));

        sql.push_str("\n)");
        sql.push_str(&self.table_options(table));
        sql
    }

    /// Generates the comment statements that follow CREATE TABLE, for
    /// dialects without inline comments.
    fn comment_statements(&self, _table: &TableMetadata) -> Vec<String> {
        Vec::new()
    }

    /// Generates the statements adding a column.
    fn add_column(&self, table: &TableMetadata, column: &ColumnMetadata) -> Vec<String> {
        vec![format!(
            "ALTER TABLE {} ADD COLUMN {}",
            self.quote_identifier(table.table_name()),
            self.column_definition(column)
        )]
    }

    /// Generates SQL for DROP COLUMN.
    fn drop_column(&self, table: &str, column: &str) -> String {
        format!(
            "ALTER TABLE {} DROP COLUMN {}",
            self.quote_identifier(table),
            self.quote_identifier(column)
        )
    }

    /// Generates the statements converging one aspect of a column.
    ///
    /// Dialects supporting `MODIFY COLUMN` re-emit the whole definition
    /// whatever the aspect.
    fn alter_column(
        &self,
        table: &TableMetadata,
        column: &ColumnMetadata,
        _aspect: ColumnAspect,
    ) -> Vec<String> {
        vec![format!(
            "ALTER TABLE {} MODIFY COLUMN {}",
            self.quote_identifier(table.table_name()),
            self.column_definition(column)
        )]
    }

    /// Generates SQL for CREATE INDEX.
    fn create_index(&self, table: &str, index: &IndexDefinition) -> String {
        let columns: Vec<String> = index
            .columns
            .iter()
            .map(|c| self.quote_identifier(c))
            .collect();
        format!(
            "CREATE {}INDEX {} ON {} ({})",
            if index.unique { "UNIQUE " } else { "" },
            self.quote_identifier(&index.name),
            self.quote_identifier(table),
            columns.join(", ")
        )
    }

    /// Generates SQL for DROP INDEX.
    fn drop_index(&self, _table: &str, index: &str) -> String {
        format!("DROP INDEX {}", self.quote_identifier(index))
    }

    /// Returns the SQL expression naming the connection's current schema.
    ///
    /// Catalog queries are restricted to it so that a same-named table in
    /// another schema (e.g. `mysql.user`) is never read.
    fn current_schema(&self) -> &'static str;

    /// Returns the catalog query counting tables with the given name.
    fn table_exists_query(&self, table: &str) -> String {
        format!(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = {} \
             AND table_schema = {}",
            quote_literal(table),
            self.current_schema()
        )
    }

    /// Returns the catalog query listing the columns of a table.
    fn columns_query(&self, table: &str) -> String {
        format!(
            "SELECT column_name, data_type, character_maximum_length, numeric_precision, \
             numeric_scale, is_nullable, column_default, table_schema \
             FROM information_schema.columns WHERE table_name = {} AND table_schema = {}",
            quote_literal(table),
            self.current_schema()
        )
    }

    /// Returns the catalog query listing the indexes of a table.
    fn indexes_query(&self, table: &str) -> String;

    /// Groups index catalog rows (one row per index column) into facts.
    fn index_facts(&self, rows: &[CatalogRow]) -> Vec<LiveIndexFact> {
        let mut facts: Vec<LiveIndexFact> = Vec::new();
        for row in rows {
            let (Some(name), Some(column)) = (row.get("index_name"), row.get("column_name"))
            else {
                continue;
            };
            let name = name.to_lowercase();
            let column = column.to_lowercase();
            let unique = match (row.get("non_unique"), row.get("is_unique")) {
                (Some(non_unique), _) => non_unique.trim() == "0",
                (None, Some(is_unique)) => parse_bool_literal(is_unique).unwrap_or(false),
                (None, None) => false,
            };
            match facts.iter_mut().find(|f| f.name == name) {
                Some(fact) => fact.columns.push(column),
                None => facts.push(LiveIndexFact {
                    name,
                    columns: vec![column],
                    unique,
                }),
            }
        }
        facts
    }

    /// Decides whether a live column auto-increments.
    fn is_auto_increment(&self, column: &str, default: Option<&str>, extra: Option<&str>)
        -> bool;

    /// Returns dialect-specific type aliases, as lower-case pairs.
    fn type_aliases(&self) -> &'static [(&'static str, &'static str)] {
        &[]
    }
}
