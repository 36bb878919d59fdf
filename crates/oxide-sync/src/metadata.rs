//! Canonical table metadata.
//!
//! An [`EntityDescriptor`] is the declarative description of one table as
//! produced by `#[derive(Entity)]`, a JSON schema file, or manual
//! registration. [`TableMetadata`] is the validated, immutable form the rest
//! of the engine works with.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, SyncError};

/// Logical SQL types understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SqlType {
    /// 32-bit integer.
    #[serde(alias = "INTEGER")]
    Int,
    /// 16-bit integer.
    SmallInt,
    /// 8-bit integer.
    TinyInt,
    /// 64-bit integer.
    BigInt,
    /// Exact decimal with precision and scale.
    #[serde(alias = "NUMERIC")]
    Decimal,
    /// Double precision float.
    Double,
    /// Single precision float.
    #[serde(alias = "FLOAT")]
    Real,
    /// Boolean.
    #[serde(alias = "BOOL")]
    Boolean,
    /// Variable-length string.
    Varchar,
    /// Date and time.
    #[serde(alias = "DATETIME")]
    Timestamp,
    /// Date only.
    Date,
    /// Time only.
    Time,
    /// Unbounded text.
    Text,
}

impl SqlType {
    /// Returns the canonical upper-case name of this type.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Int => "INT",
            Self::SmallInt => "SMALLINT",
            Self::TinyInt => "TINYINT",
            Self::BigInt => "BIGINT",
            Self::Decimal => "DECIMAL",
            Self::Double => "DOUBLE",
            Self::Real => "REAL",
            Self::Boolean => "BOOLEAN",
            Self::Varchar => "VARCHAR",
            Self::Timestamp => "TIMESTAMP",
            Self::Date => "DATE",
            Self::Time => "TIME",
            Self::Text => "TEXT",
        }
    }

    /// Infers the logical type from a Rust type name.
    ///
    /// Returns the type and whether the field is nullable (`Option<T>`).
    /// Paths and generic arguments are ignored, so `chrono::DateTime<Utc>`
    /// maps like `DateTime`.
    #[must_use]
    pub fn from_rust_type(rust_type: &str) -> Option<(Self, bool)> {
        let compact = normalize_rust_type(rust_type);
        let (inner, nullable) = match unwrap_generic(&compact, "Option") {
            Some(inner) => (inner, true),
            None => (compact.as_str(), false),
        };

        let base = inner.split('<').next().unwrap_or(inner);
        let base = base.rsplit("::").next().unwrap_or(base);

        let sql_type = match base {
            "i8" | "u8" => Self::TinyInt,
            "i16" | "u16" => Self::SmallInt,
            "i32" | "u32" => Self::Int,
            "i64" | "u64" | "isize" | "usize" => Self::BigInt,
            "f32" => Self::Real,
            "f64" => Self::Double,
            "bool" => Self::Boolean,
            "String" | "str" | "char" => Self::Varchar,
            "Decimal" | "BigDecimal" => Self::Decimal,
            "NaiveDateTime" | "DateTime" | "OffsetDateTime" | "PrimitiveDateTime"
            | "SystemTime" => Self::Timestamp,
            "NaiveDate" | "Date" => Self::Date,
            "NaiveTime" | "Time" => Self::Time,
            _ => return None,
        };
        Some((sql_type, nullable))
    }
}

/// Drops whitespace, references and lifetimes: `& 'a mut str` becomes `str`.
fn normalize_rust_type(ty: &str) -> String {
    let mut out = String::new();
    for token in ty.split_whitespace() {
        let mut cleaned = String::new();
        let mut chars = token.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '&' => {}
                '\'' => while chars.next_if(|c| c.is_alphanumeric() || *c == '_').is_some() {},
                _ => cleaned.push(c),
            }
        }
        if cleaned != "mut" {
            out.push_str(&cleaned);
        }
    }
    out
}

fn unwrap_generic<'a>(ty: &'a str, wrapper: &str) -> Option<&'a str> {
    let open = ty.find('<')?;
    let path = &ty[..open];
    if path.rsplit("::").next() != Some(wrapper) {
        return None;
    }
    ty[open + 1..].strip_suffix('>')
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SqlType {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INT" | "INTEGER" => Ok(Self::Int),
            "SMALLINT" => Ok(Self::SmallInt),
            "TINYINT" => Ok(Self::TinyInt),
            "BIGINT" => Ok(Self::BigInt),
            "DECIMAL" | "NUMERIC" => Ok(Self::Decimal),
            "DOUBLE" => Ok(Self::Double),
            "REAL" | "FLOAT" => Ok(Self::Real),
            "BOOLEAN" | "BOOL" => Ok(Self::Boolean),
            "VARCHAR" => Ok(Self::Varchar),
            "TIMESTAMP" | "DATETIME" => Ok(Self::Timestamp),
            "DATE" => Ok(Self::Date),
            "TIME" => Ok(Self::Time),
            "TEXT" => Ok(Self::Text),
            _ => Err(SyncError::UnknownSqlType(s.to_string())),
        }
    }
}

// ================================================================
// Descriptors
// ================================================================

const fn default_true() -> bool {
    true
}

const fn default_version() -> u32 {
    1
}

/// Declarative description of one field of an entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field (column) name.
    pub name: String,
    /// Native Rust type name, used when no SQL type is declared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rust_type: Option<String>,
    /// Declared logical SQL type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql_type: Option<SqlType>,
    /// Declared length (0 = unspecified).
    #[serde(default)]
    pub length: u32,
    /// Declared precision (DECIMAL).
    #[serde(default)]
    pub precision: u32,
    /// Declared scale (DECIMAL).
    #[serde(default)]
    pub scale: u32,
    /// Declared nullability; inferred from the Rust type when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
    /// Default value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    /// Whether `default_value` is an SQL expression rather than a literal.
    #[serde(default)]
    pub default_is_expression: bool,
    /// Whether the column auto-increments.
    #[serde(default)]
    pub auto_increment: bool,
    /// Column comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Unique group; fields sharing a group form one composite unique index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_group: Option<String>,
    /// Index name; fields sharing a name form one composite index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_name: Option<String>,
    /// Version in which the field was introduced.
    #[serde(default)]
    pub field_version: u32,
    /// Excludes the field from the table.
    #[serde(default)]
    pub ignore: bool,
}

impl FieldDescriptor {
    /// Creates a new field descriptor.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the native Rust type name.
    #[must_use]
    pub fn rust_type(mut self, rust_type: impl Into<String>) -> Self {
        self.rust_type = Some(rust_type.into());
        self
    }

    /// Sets the logical SQL type.
    #[must_use]
    pub const fn sql_type(mut self, sql_type: SqlType) -> Self {
        self.sql_type = Some(sql_type);
        self
    }

    /// Sets the length.
    #[must_use]
    pub const fn length(mut self, length: u32) -> Self {
        self.length = length;
        self
    }

    /// Sets precision and scale.
    #[must_use]
    pub const fn precision(mut self, precision: u32, scale: u32) -> Self {
        self.precision = precision;
        self.scale = scale;
        self
    }

    /// Sets nullability.
    #[must_use]
    pub const fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = Some(nullable);
        self
    }

    /// Sets a literal default value.
    #[must_use]
    pub fn default_literal(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self.default_is_expression = false;
        self
    }

    /// Sets an expression default (e.g. `CURRENT_TIMESTAMP`).
    #[must_use]
    pub fn default_expression(mut self, expr: impl Into<String>) -> Self {
        self.default_value = Some(expr.into());
        self.default_is_expression = true;
        self
    }

    /// Marks the field as auto-increment.
    #[must_use]
    pub const fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Sets the comment.
    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Sets the unique group.
    #[must_use]
    pub fn unique_group(mut self, group: impl Into<String>) -> Self {
        self.unique_group = Some(group.into());
        self
    }

    /// Sets the index name.
    #[must_use]
    pub fn index(mut self, name: impl Into<String>) -> Self {
        self.index_name = Some(name.into());
        self
    }

    /// Sets the field version.
    #[must_use]
    pub const fn version(mut self, version: u32) -> Self {
        self.field_version = version;
        self
    }

    /// Excludes the field.
    #[must_use]
    pub const fn ignore(mut self) -> Self {
        self.ignore = true;
        self
    }
}

/// Declarative description of an entity (one table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDescriptor {
    /// Table name.
    pub table_name: String,
    /// Primary key field; defaults to `id` when such a field exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<String>,
    /// Schema version.
    #[serde(default = "default_version")]
    pub schema_version: u32,
    /// Whether automatic synchronization is enabled.
    #[serde(default = "default_true")]
    pub auto_sync: bool,
    /// Table comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Character set (MySQL-like only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charset: Option<String>,
    /// Collation (MySQL-like only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collation: Option<String>,
    /// Storage engine (MySQL-like only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
    /// Fields in declaration order.
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

impl EntityDescriptor {
    /// Creates a new entity descriptor.
    #[must_use]
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            primary_key: None,
            schema_version: default_version(),
            auto_sync: true,
            comment: None,
            charset: None,
            collation: None,
            engine: None,
            fields: Vec::new(),
        }
    }

    /// Sets the primary key field.
    #[must_use]
    pub fn primary_key(mut self, field: impl Into<String>) -> Self {
        self.primary_key = Some(field.into());
        self
    }

    /// Sets the schema version.
    #[must_use]
    pub const fn schema_version(mut self, version: u32) -> Self {
        self.schema_version = version;
        self
    }

    /// Enables or disables automatic synchronization.
    #[must_use]
    pub const fn auto_sync(mut self, enabled: bool) -> Self {
        self.auto_sync = enabled;
        self
    }

    /// Sets the table comment.
    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Sets the character set.
    #[must_use]
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    /// Sets the collation.
    #[must_use]
    pub fn collation(mut self, collation: impl Into<String>) -> Self {
        self.collation = Some(collation.into());
        self
    }

    /// Sets the storage engine.
    #[must_use]
    pub fn engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = Some(engine.into());
        self
    }

    /// Adds a field.
    #[must_use]
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Loads a JSON array of descriptors from a schema file.
    pub fn load_all(path: &Path) -> Result<Vec<Self>> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| SyncError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// Types that describe a table.
///
/// Usually implemented with `#[derive(Entity)]`.
pub trait Entity {
    /// Returns the declarative description of the table.
    fn descriptor() -> EntityDescriptor;
}

// ================================================================
// Canonical metadata
// ================================================================

/// Canonical shape of one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnMetadata {
    /// Column name (lower case).
    pub name: String,
    /// Logical type.
    pub sql_type: SqlType,
    /// Length (0 = unspecified).
    pub length: u32,
    /// Precision (DECIMAL).
    pub precision: u32,
    /// Scale (DECIMAL).
    pub scale: u32,
    /// Whether NULL is allowed.
    pub nullable: bool,
    /// Default value.
    pub default_value: Option<String>,
    /// Whether the default is an SQL expression.
    pub default_is_expression: bool,
    /// Whether the column auto-increments.
    pub auto_increment: bool,
    /// Column comment.
    pub comment: Option<String>,
    /// Composite unique group.
    pub unique_group: Option<String>,
    /// Composite index name.
    pub index_name: Option<String>,
    /// Version in which the column was introduced.
    pub field_version: u32,
    /// Whether this is the primary key column.
    pub is_primary_key: bool,
}

/// An index derived from unique groups and index names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexDefinition {
    /// Index name.
    pub name: String,
    /// Member columns in declaration order.
    pub columns: Vec<String>,
    /// Whether this is a unique index.
    pub unique: bool,
}

/// Canonical shape of a table.
///
/// Built once from an [`EntityDescriptor`] and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableMetadata {
    table_name: String,
    primary_key: Option<String>,
    schema_version: u32,
    auto_sync_enabled: bool,
    comment: Option<String>,
    charset: Option<String>,
    collation: Option<String>,
    storage_engine: Option<String>,
    columns: Vec<ColumnMetadata>,
    indexes: Vec<IndexDefinition>,
}

impl TableMetadata {
    /// Builds the metadata of an [`Entity`].
    pub fn of<E: Entity>() -> Result<Self> {
        Self::from_descriptor(&E::descriptor())
    }

    /// Validates a descriptor and builds the canonical metadata.
    pub fn from_descriptor(descriptor: &EntityDescriptor) -> Result<Self> {
        let table_name = descriptor.table_name.trim().to_lowercase();
        if table_name.is_empty() {
            return Err(SyncError::InvalidDescriptor(
                "table name must not be empty".to_string(),
            ));
        }

        let mut declared: Vec<ColumnMetadata> = Vec::new();
        let mut seen = HashSet::new();
        for field in &descriptor.fields {
            if field.ignore {
                debug!(table = %table_name, field = %field.name, "Ignoring field");
                continue;
            }
            let Some(mut column) = column_from_field(&table_name, field) else {
                continue;
            };
            if !seen.insert(column.name.clone()) {
                return Err(SyncError::InvalidDescriptor(format!(
                    "duplicate column '{}' in table '{}'",
                    column.name, table_name
                )));
            }
            column.is_primary_key = false;
            declared.push(column);
        }

        if declared.is_empty() {
            return Err(SyncError::NoColumns { table: table_name });
        }

        let primary_key = match &descriptor.primary_key {
            Some(pk) => {
                let pk = pk.to_lowercase();
                if !seen.contains(&pk) {
                    return Err(SyncError::InvalidDescriptor(format!(
                        "primary key '{}' is not an eligible column of '{}'",
                        pk, table_name
                    )));
                }
                Some(pk)
            }
            None => seen.contains("id").then(|| "id".to_string()),
        };

        for column in &mut declared {
            if primary_key.as_deref() == Some(column.name.as_str()) {
                column.is_primary_key = true;
                column.nullable = false;
            }
        }

        let auto_columns: Vec<String> = declared
            .iter()
            .filter(|c| c.auto_increment)
            .map(|c| c.name.clone())
            .collect();
        if auto_columns.len() > 1 {
            return Err(SyncError::MultipleAutoIncrement {
                table: table_name,
                columns: auto_columns,
            });
        }

        let indexes = derive_indexes(&table_name, &declared);

        let mut columns = declared;
        columns.sort_by(|a, b| {
            b.is_primary_key
                .cmp(&a.is_primary_key)
                .then_with(|| a.name.cmp(&b.name))
        });

        Ok(Self {
            table_name,
            primary_key,
            schema_version: descriptor.schema_version,
            auto_sync_enabled: descriptor.auto_sync,
            comment: non_empty(descriptor.comment.as_deref()),
            charset: non_empty(descriptor.charset.as_deref()),
            collation: non_empty(descriptor.collation.as_deref()),
            storage_engine: non_empty(descriptor.engine.as_deref()),
            columns,
            indexes,
        })
    }

    /// Returns the table name.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Returns the primary key column name.
    #[must_use]
    pub fn primary_key(&self) -> Option<&str> {
        self.primary_key.as_deref()
    }

    /// Returns the schema version.
    #[must_use]
    pub const fn schema_version(&self) -> u32 {
        self.schema_version
    }

    /// Returns whether automatic synchronization is enabled.
    #[must_use]
    pub const fn auto_sync_enabled(&self) -> bool {
        self.auto_sync_enabled
    }

    /// Returns the table comment.
    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Returns the character set.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.charset.as_deref()
    }

    /// Returns the collation.
    #[must_use]
    pub fn collation(&self) -> Option<&str> {
        self.collation.as_deref()
    }

    /// Returns the storage engine.
    #[must_use]
    pub fn storage_engine(&self) -> Option<&str> {
        self.storage_engine.as_deref()
    }

    /// Returns the columns in generation order (primary key first, then by name).
    #[must_use]
    pub fn columns(&self) -> &[ColumnMetadata] {
        &self.columns
    }

    /// Gets a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnMetadata> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Returns the derived indexes (unique groups first).
    #[must_use]
    pub fn indexes(&self) -> &[IndexDefinition] {
        &self.indexes
    }

    /// Returns the name prefix of indexes managed for this table.
    #[must_use]
    pub fn index_prefix(&self) -> String {
        format!("idx_{}_", self.table_name)
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn column_from_field(table: &str, field: &FieldDescriptor) -> Option<ColumnMetadata> {
    let inferred = field.rust_type.as_deref().and_then(SqlType::from_rust_type);
    let sql_type = match (field.sql_type, inferred) {
        (Some(declared), _) => declared,
        (None, Some((inferred, _))) => inferred,
        (None, None) => {
            warn!(
                table = %table,
                field = %field.name,
                rust_type = ?field.rust_type,
                "Skipping field with unsupported type"
            );
            return None;
        }
    };
    let nullable = field
        .nullable
        .unwrap_or_else(|| inferred.map_or(true, |(_, nullable)| nullable));

    Some(ColumnMetadata {
        name: field.name.trim().to_lowercase(),
        sql_type,
        length: field.length,
        precision: field.precision,
        scale: field.scale,
        nullable,
        default_value: non_empty(field.default_value.as_deref()),
        default_is_expression: field.default_is_expression,
        auto_increment: field.auto_increment,
        comment: non_empty(field.comment.as_deref()),
        unique_group: non_empty(field.unique_group.as_deref()),
        index_name: non_empty(field.index_name.as_deref()),
        field_version: field.field_version,
        is_primary_key: false,
    })
}

fn derive_indexes(table: &str, declared: &[ColumnMetadata]) -> Vec<IndexDefinition> {
    let mut indexes: Vec<IndexDefinition> = Vec::new();

    let mut push = |name: String, column: &str, unique: bool| {
        match indexes.iter_mut().find(|i| i.name == name) {
            Some(index) => index.columns.push(column.to_string()),
            None => indexes.push(IndexDefinition {
                name,
                columns: vec![column.to_string()],
                unique,
            }),
        }
    };

    for column in declared {
        if let Some(group) = &column.unique_group {
            push(
                format!("idx_{}_{}", table, group.to_lowercase()),
                &column.name,
                true,
            );
        }
    }
    for column in declared {
        if let Some(index) = &column.index_name {
            push(
                format!("idx_{}_{}", table, index.to_lowercase()),
                &column.name,
                false,
            );
        }
    }

    indexes
}
