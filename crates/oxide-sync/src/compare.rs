//! Structure comparison.
//!
//! Compares canonical [`TableMetadata`] with the live catalog and produces an
//! ordered list of [`Difference`]s, each carrying the SQL that fixes it.
//!
//! The equivalence rules are deliberately permissive: three catalogs report
//! types, defaults and identity columns in incompatible ways, and a spurious
//! difference triggers DDL against a live table. Same-class types match,
//! defaults are compared after normalization, and auto-increment drift is
//! only reported in strict mode.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::ddl;
use crate::dialect::{parse_bool_literal, ColumnAspect, Dialect};
use crate::error::Result;
use crate::executor::QueryExecutor;
use crate::introspect::{Introspector, LiveColumnFact, LiveIndexFact};
use crate::metadata::{ColumnMetadata, IndexDefinition, SqlType, TableMetadata};

/// Tolerance of the numeric default comparison.
const NUMERIC_EPSILON: f64 = 1e-4;

/// Kind of schema discrepancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DifferenceKind {
    /// The table does not exist.
    TableMissing,
    /// A canonical column is missing from the live table.
    ColumnMissing,
    /// The live table has a column the metadata does not declare.
    ColumnExtra,
    /// Incompatible column types.
    TypeMismatch,
    /// Different length or precision.
    LengthMismatch,
    /// Different nullability.
    NullableMismatch,
    /// Different default value.
    DefaultMismatch,
    /// Auto-increment expected but not reported.
    AutoIncrementMismatch,
    /// A canonical index is missing.
    IndexMissing,
    /// A managed index is no longer declared.
    IndexExtra,
}

impl fmt::Display for DifferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One atomic discrepancy between canonical and live schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Difference {
    /// What differs.
    pub kind: DifferenceKind,
    /// Table name.
    pub table_name: String,
    /// Column name, absent for table- and index-level kinds.
    pub column_name: Option<String>,
    /// Expected shape, for diagnostics.
    pub expected: String,
    /// Live shape, for diagnostics.
    pub actual: String,
    /// Statement(s) fixing the difference; `None` means informational.
    pub fix_sql: Option<String>,
}

impl Difference {
    fn table(
        kind: DifferenceKind,
        table: &TableMetadata,
        expected: impl Into<String>,
        actual: impl Into<String>,
        fix_sql: Option<String>,
    ) -> Self {
        Self {
            kind,
            table_name: table.table_name().to_string(),
            column_name: None,
            expected: expected.into(),
            actual: actual.into(),
            fix_sql,
        }
    }

    fn column(
        kind: DifferenceKind,
        table: &TableMetadata,
        column: &str,
        expected: impl Into<String>,
        actual: impl Into<String>,
        fix_sql: Option<String>,
    ) -> Self {
        Self {
            column_name: Some(column.to_string()),
            ..Self::table(kind, table, expected, actual, fix_sql)
        }
    }
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.table_name)?;
        if let Some(column) = &self.column_name {
            write!(f, ".{}", column)?;
        }
        write!(f, ": expected {}, found {}", self.expected, self.actual)
    }
}

/// Options for the comparator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompareOptions {
    /// Whether unique groups and named indexes are compared.
    pub compare_indexes: bool,
    /// Report auto-increment columns the catalog does not flag.
    pub strict_auto_increment: bool,
    /// Disable the H2 primary-key nullability relaxation.
    pub strict_primary_key_nullability: bool,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            compare_indexes: true,
            strict_auto_increment: false,
            strict_primary_key_nullability: false,
        }
    }
}

impl CompareOptions {
    /// Creates default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables index comparison.
    #[must_use]
    pub const fn with_indexes(mut self, enabled: bool) -> Self {
        self.compare_indexes = enabled;
        self
    }

    /// Enables both strict checks.
    #[must_use]
    pub const fn strict(mut self) -> Self {
        self.strict_auto_increment = true;
        self.strict_primary_key_nullability = true;
        self
    }
}

// ================================================================
// Type equivalence
// ================================================================

/// Broad type families; two types of the same family are compatible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeClass {
    /// Integral numbers.
    Integer,
    /// Character data.
    String,
    /// Decimal and floating point numbers.
    Decimal,
    /// Booleans.
    Boolean,
    /// Dates and times.
    Temporal,
}

const INTEGER_TYPES: &[&str] = &[
    "int", "integer", "int2", "int4", "int8", "bigint", "smallint", "tinyint", "mediumint",
    "serial", "bigserial", "smallserial",
];
const STRING_TYPES: &[&str] = &[
    "varchar", "character varying", "char", "character", "text", "tinytext", "mediumtext",
    "longtext", "clob", "character large object", "nvarchar", "nchar", "varchar_ignorecase",
];
const DECIMAL_TYPES: &[&str] = &[
    "decimal", "numeric", "double", "double precision", "real", "float", "float4", "float8",
    "decfloat",
];
const BOOLEAN_TYPES: &[&str] = &["boolean", "bool"];
const TEMPORAL_TYPES: &[&str] = &[
    "timestamp", "datetime", "date", "time", "timestamptz", "timetz",
    "timestamp without time zone", "timestamp with time zone", "time without time zone",
    "time with time zone",
];

/// Cross-dialect spellings of the same type, shared by every dialect.
pub const COMMON_TYPE_ALIASES: &[(&str, &str)] = &[
    ("varchar", "character varying"),
    ("char", "character"),
    ("decimal", "numeric"),
    ("boolean", "bool"),
    ("int", "integer"),
    ("timestamp", "datetime"),
    ("timestamp", "timestamp without time zone"),
    ("timestamp", "timestamptz"),
    ("datetime", "timestamp without time zone"),
    ("text", "clob"),
];

/// Lower-cases a type name and drops parameters: `VARCHAR(255)` → `varchar`.
#[must_use]
pub fn normalize_type(name: &str) -> String {
    let mut out = String::new();
    let mut depth = 0usize;
    for c in name.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.extend(c.to_lowercase()),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Returns the family of a normalized type name.
#[must_use]
pub fn type_class(name: &str) -> Option<TypeClass> {
    let classes = [
        (INTEGER_TYPES, TypeClass::Integer),
        (STRING_TYPES, TypeClass::String),
        (DECIMAL_TYPES, TypeClass::Decimal),
        (BOOLEAN_TYPES, TypeClass::Boolean),
        (TEMPORAL_TYPES, TypeClass::Temporal),
    ];
    classes
        .iter()
        .find(|(names, _)| names.contains(&name))
        .map(|(_, class)| *class)
}

fn aliased(aliases: &[(&str, &str)], a: &str, b: &str) -> bool {
    aliases
        .iter()
        .any(|&(x, y)| (x == a && y == b) || (x == b && y == a))
}

/// Checks whether an expected and a reported type are compatible.
#[must_use]
pub fn type_compatible(expected: &str, actual: &str, dialect: Dialect) -> bool {
    let expected = normalize_type(expected);
    let actual = normalize_type(actual);
    if expected == actual {
        return true;
    }
    if let (Some(a), Some(b)) = (type_class(&expected), type_class(&actual)) {
        if a == b {
            return true;
        }
    }
    aliased(COMMON_TYPE_ALIASES, &expected, &actual)
        || aliased(dialect.strategy().type_aliases(), &expected, &actual)
}

// ================================================================
// Length, nullability, defaults, auto-increment
// ================================================================

/// Which catalog size a column's declared size is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SizeKind {
    Length,
    Precision,
}

/// The canonical size compared for a column: precision for DECIMAL, length
/// for VARCHAR, nothing otherwise.
///
/// Only sizes the DDL renders are compared; a length on TEXT or a precision
/// on DOUBLE never reaches the database.
fn expected_size(column: &ColumnMetadata) -> Option<(SizeKind, u64)> {
    let (kind, size) = match column.sql_type {
        SqlType::Decimal => (SizeKind::Precision, column.precision),
        SqlType::Varchar => (SizeKind::Length, column.length),
        _ => return None,
    };
    (size > 0).then_some((kind, u64::from(size)))
}

/// Checks length (VARCHAR) or precision (DECIMAL).
///
/// A canonical size of 0 is unspecified and always compatible.
#[must_use]
pub fn length_compatible(expected: &ColumnMetadata, actual: &LiveColumnFact) -> bool {
    match expected_size(expected) {
        None => true,
        Some((SizeKind::Precision, size)) => actual.precision == Some(size),
        Some((SizeKind::Length, size)) => actual.length == Some(size),
    }
}

/// Checks nullability.
///
/// Primary keys are relaxed under H2, whose catalog does not reliably
/// report NOT NULL on primary key columns.
#[must_use]
pub fn nullable_compatible(
    expected: &ColumnMetadata,
    actual_nullable: bool,
    dialect: Dialect,
    strict_primary_key: bool,
) -> bool {
    if !expected.is_primary_key {
        return expected.nullable == actual_nullable;
    }
    match (expected.nullable, actual_nullable) {
        (false, true) => dialect == Dialect::H2 && !strict_primary_key,
        (true, false) => false,
        _ => true,
    }
}

/// Expression defaults reported differently by different catalogs.
const EXPRESSION_ALIASES: &[(&str, &str)] = &[
    ("current_timestamp", "now()"),
    ("current_timestamp", "current_timestamp()"),
];

/// Normalizes a default for comparison: drops PostgreSQL casts, wrapping
/// parentheses and surrounding quotes, then lower-cases. `NULL` normalizes to
/// the empty string.
#[must_use]
pub fn normalize_default(value: &str) -> String {
    let mut v = strip_parens(value.trim());

    if let Some(idx) = v.rfind("::") {
        if !v[idx..].contains(['\'', '"']) {
            v = strip_parens(v[..idx].trim());
        }
    }

    let unquoted = if v.len() >= 2
        && ((v.starts_with('\'') && v.ends_with('\'')) || (v.starts_with('"') && v.ends_with('"')))
    {
        v[1..v.len() - 1].replace("''", "'")
    } else {
        v.to_string()
    };

    let lower = unquoted.to_lowercase();
    if lower == "null" {
        String::new()
    } else {
        lower
    }
}

fn strip_parens(mut v: &str) -> &str {
    while v.len() >= 2 && v.starts_with('(') && v.ends_with(')') {
        v = v[1..v.len() - 1].trim();
    }
    v
}

/// Checks whether two defaults are equivalent.
#[must_use]
pub fn default_compatible(expected: Option<&str>, actual: Option<&str>) -> bool {
    let expected = expected.map(normalize_default).unwrap_or_default();
    let actual = actual.map(normalize_default).unwrap_or_default();

    match (expected.is_empty(), actual.is_empty()) {
        (true, true) => return true,
        (true, false) | (false, true) => return false,
        (false, false) => {}
    }
    if expected == actual {
        return true;
    }
    if let (Some(a), Some(b)) = (parse_bool_literal(&expected), parse_bool_literal(&actual)) {
        return a == b;
    }
    if let (Ok(a), Ok(b)) = (expected.parse::<f64>(), actual.parse::<f64>()) {
        return (a - b).abs() < NUMERIC_EPSILON;
    }
    if aliased(EXPRESSION_ALIASES, &expected, &actual) {
        return true;
    }
    expected.eq_ignore_ascii_case(&actual)
}

/// Checks auto-increment. Permissive unless `strict`: catalogs report
/// identity columns unreliably enough that a false mismatch is worse than a
/// missed one.
#[must_use]
pub const fn auto_increment_compatible(expected: bool, actual: bool, strict: bool) -> bool {
    !expected || actual || !strict
}

// ================================================================
// Comparator
// ================================================================

/// Compares canonical metadata with a live database.
pub struct StructureComparator<'a, E> {
    introspector: Introspector<'a, E>,
    options: CompareOptions,
}

impl<'a, E: QueryExecutor> StructureComparator<'a, E> {
    /// Creates a comparator.
    pub const fn new(executor: &'a E, dialect: Dialect, options: CompareOptions) -> Self {
        Self {
            introspector: Introspector::new(executor, dialect),
            options,
        }
    }

    /// Returns the dialect.
    #[must_use]
    pub const fn dialect(&self) -> Dialect {
        self.introspector.dialect()
    }

    /// Compares a table with the live catalog.
    pub async fn compare(&self, table: &TableMetadata) -> Result<Vec<Difference>> {
        let dialect = self.dialect();
        let name = table.table_name();

        if !self.introspector.table_exists(name).await? {
            debug!(table = %name, "Table missing");
            let statements = ddl::generate_create_table(table, dialect)?;
            return Ok(vec![Difference::table(
                DifferenceKind::TableMissing,
                table,
                "table",
                "missing",
                Some(ddl::join_statements(&statements)),
            )]);
        }

        let live_columns = self.introspector.list_columns(name).await?;
        let live_indexes = if self.options.compare_indexes {
            self.introspector.list_indexes(name).await?
        } else {
            Vec::new()
        };

        let differences = diff_table(table, &live_columns, &live_indexes, dialect, self.options);
        debug!(table = %name, count = differences.len(), "Compared table");
        Ok(differences)
    }

    /// Returns whether the live table differs from the metadata.
    pub async fn needs_synchronization(&self, table: &TableMetadata) -> Result<bool> {
        Ok(!self.compare(table).await?.is_empty())
    }
}

/// Diffs an existing table against its introspected facts.
#[must_use]
pub fn diff_table(
    table: &TableMetadata,
    live_columns: &[LiveColumnFact],
    live_indexes: &[LiveIndexFact],
    dialect: Dialect,
    options: CompareOptions,
) -> Vec<Difference> {
    let live: HashMap<&str, &LiveColumnFact> =
        live_columns.iter().map(|c| (c.name.as_str(), c)).collect();
    let mut differences = Vec::new();

    for column in table.columns() {
        if !live.contains_key(column.name.as_str()) {
            differences.push(Difference::column(
                DifferenceKind::ColumnMissing,
                table,
                &column.name,
                ddl::column_definition(column, dialect),
                "missing",
                Some(ddl::add_column_sql(table, column, dialect)),
            ));
        }
    }

    for column in table.columns() {
        if let Some(actual) = live.get(column.name.as_str()) {
            diff_column(table, column, actual, dialect, options, &mut differences);
        }
    }

    for actual in live_columns {
        if table.column(&actual.name).is_none() {
            differences.push(Difference::column(
                DifferenceKind::ColumnExtra,
                table,
                &actual.name,
                "absent",
                actual.reported_type.clone(),
                Some(ddl::drop_column_sql(table, &actual.name, dialect)),
            ));
        }
    }

    if options.compare_indexes {
        diff_indexes(table, live_indexes, dialect, &mut differences);
    }

    differences
}

fn diff_column(
    table: &TableMetadata,
    expected: &ColumnMetadata,
    actual: &LiveColumnFact,
    dialect: Dialect,
    options: CompareOptions,
    differences: &mut Vec<Difference>,
) {
    let fix = |aspect| ddl::alter_column_sql(table, expected, aspect, dialect);
    let push = |differences: &mut Vec<Difference>, kind, e: String, a: String, fix_sql| {
        differences.push(Difference::column(kind, table, &expected.name, e, a, fix_sql));
    };

    if !type_compatible(expected.sql_type.name(), &actual.reported_type, dialect) {
        push(
            differences,
            DifferenceKind::TypeMismatch,
            expected.sql_type.name().to_string(),
            actual.reported_type.clone(),
            fix(ColumnAspect::Type),
        );
    }

    if !length_compatible(expected, actual) {
        let (e, a) = match expected_size(expected) {
            Some((SizeKind::Precision, size)) => (size, actual.precision),
            Some((SizeKind::Length, size)) => (size, actual.length),
            None => (0, None),
        };
        push(
            differences,
            DifferenceKind::LengthMismatch,
            e.to_string(),
            a.map_or_else(|| "unspecified".to_string(), |a| a.to_string()),
            fix(ColumnAspect::Type),
        );
    }

    if !nullable_compatible(
        expected,
        actual.nullable,
        dialect,
        options.strict_primary_key_nullability,
    ) {
        push(
            differences,
            DifferenceKind::NullableMismatch,
            nullability(expected.nullable && !expected.is_primary_key),
            nullability(actual.nullable),
            fix(ColumnAspect::Nullable),
        );
    }

    // The live default of an auto-increment column is its sequence.
    if !expected.auto_increment
        && !default_compatible(
            expected.default_value.as_deref(),
            actual.default_value.as_deref(),
        )
    {
        push(
            differences,
            DifferenceKind::DefaultMismatch,
            expected.default_value.clone().unwrap_or_else(|| "none".to_string()),
            actual.default_value.clone().unwrap_or_else(|| "none".to_string()),
            fix(ColumnAspect::Default),
        );
    }

    if !auto_increment_compatible(
        expected.auto_increment,
        actual.auto_increment,
        options.strict_auto_increment,
    ) {
        push(
            differences,
            DifferenceKind::AutoIncrementMismatch,
            "AUTO_INCREMENT".to_string(),
            "none".to_string(),
            fix(ColumnAspect::AutoIncrement),
        );
    }
}

fn nullability(nullable: bool) -> String {
    if nullable { "NULL" } else { "NOT NULL" }.to_string()
}

fn describe_index(index: &IndexDefinition) -> String {
    format!(
        "{}({})",
        if index.unique { "UNIQUE " } else { "" },
        index.columns.join(", ")
    )
}

fn diff_indexes(
    table: &TableMetadata,
    live_indexes: &[LiveIndexFact],
    dialect: Dialect,
    differences: &mut Vec<Difference>,
) {
    for index in table.indexes() {
        if !live_indexes.iter().any(|l| l.name == index.name) {
            differences.push(Difference::table(
                DifferenceKind::IndexMissing,
                table,
                describe_index(index),
                format!("missing index {}", index.name),
                Some(ddl::create_index_sql(table, index, dialect)),
            ));
        }
    }

    let prefix = table.index_prefix();
    for live in live_indexes {
        let managed = live.name.starts_with(&prefix);
        if managed && !table.indexes().iter().any(|i| i.name == live.name) {
            differences.push(Difference::table(
                DifferenceKind::IndexExtra,
                table,
                "absent",
                format!("index {} ({})", live.name, live.columns.join(", ")),
                Some(ddl::drop_index_sql(table, &live.name, dialect)),
            ));
        }
    }
}
