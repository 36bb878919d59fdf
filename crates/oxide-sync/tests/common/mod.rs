//! In-memory catalog used by the integration tests.
//!
//! `MemoryCatalog` interprets the DDL the engine generates and answers the
//! catalog queries the way each dialect's catalog reports them: MySQL
//! reports `varchar`/`tinyint` and an `extra` column, PostgreSQL reports
//! `character varying` with casted defaults and `nextval` sequences, H2
//! reports upper-case `CHARACTER VARYING`/`NUMERIC` types.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use oxide_sync::dialect::Dialect;
use oxide_sync::executor::{CatalogRow, QueryError, QueryExecutor};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Ident(String),
    Str(String),
    Sym(char),
}

fn tokenize(sql: &str) -> Vec<Token> {
    let chars: Vec<char> = sql.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if matches!(c, '\'' | '"' | '`') {
            let mut value = String::new();
            i += 1;
            while i < chars.len() {
                if chars[i] == c {
                    if chars.get(i + 1) == Some(&c) {
                        value.push(c);
                        i += 2;
                        continue;
                    }
                    i += 1;
                    break;
                }
                value.push(chars[i]);
                i += 1;
            }
            tokens.push(if c == '\'' {
                Token::Str(value)
            } else {
                Token::Ident(value)
            });
        } else if c.is_alphanumeric() || c == '_' || c == '.' {
            let mut word = String::new();
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '.') {
                word.push(chars[i]);
                i += 1;
            }
            tokens.push(Token::Word(word));
        } else {
            tokens.push(Token::Sym(c));
            i += 1;
        }
    }
    tokens
}

const CONSTRAINT_KEYWORDS: &[&str] = &[
    "NOT", "NULL", "DEFAULT", "AUTO_INCREMENT", "COMMENT", "USING", "PRIMARY",
];

struct Cursor {
    tokens: Vec<Token>,
    pos: usize,
}

impl Cursor {
    fn new(sql: &str) -> Self {
        Self {
            tokens: tokenize(sql),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn peek_kw(&self, kw: &str) -> bool {
        matches!(self.peek(), Some(Token::Word(w)) if w.eq_ignore_ascii_case(kw))
    }

    fn eat_kw(&mut self, kw: &str) -> bool {
        let found = self.peek_kw(kw);
        if found {
            self.pos += 1;
        }
        found
    }

    fn expect_kw(&mut self, kw: &str) -> Result<(), String> {
        if self.eat_kw(kw) {
            Ok(())
        } else {
            Err(format!("Syntax error in SQL statement: expected {kw}"))
        }
    }

    fn eat_sym(&mut self, sym: char) -> bool {
        let found = self.peek() == Some(&Token::Sym(sym));
        if found {
            self.pos += 1;
        }
        found
    }

    fn expect_sym(&mut self, sym: char) -> Result<(), String> {
        if self.eat_sym(sym) {
            Ok(())
        } else {
            Err(format!("Syntax error in SQL statement: expected '{sym}'"))
        }
    }

    fn name(&mut self) -> Result<String, String> {
        match self.next() {
            Some(Token::Ident(name) | Token::Word(name)) => Ok(name),
            other => Err(format!("Syntax error in SQL statement: expected name, found {other:?}")),
        }
    }

    fn names(&mut self) -> Result<Vec<String>, String> {
        self.expect_sym('(')?;
        let mut names = vec![self.name()?];
        while self.eat_sym(',') {
            names.push(self.name()?);
        }
        self.expect_sym(')')?;
        Ok(names)
    }

    fn first_string(&self) -> Option<String> {
        self.tokens.iter().find_map(|t| match t {
            Token::Str(s) => Some(s.clone()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
enum DefaultValue {
    Literal(String),
    Expression(String),
}

#[derive(Debug, Clone)]
struct MemColumn {
    name: String,
    base: String,
    params: Vec<u64>,
    nullable: bool,
    default: Option<DefaultValue>,
    auto_increment: bool,
}

#[derive(Debug, Clone)]
struct MemIndex {
    name: String,
    columns: Vec<String>,
    unique: bool,
}

#[derive(Debug, Clone, Default)]
struct MemTable {
    columns: Vec<MemColumn>,
    primary_key: Vec<String>,
    indexes: Vec<MemIndex>,
}

#[derive(Debug, Default)]
struct CatalogState {
    tables: BTreeMap<String, MemTable>,
    ledger: BTreeMap<String, (u64, String)>,
    executed: Vec<String>,
    execute_failures: Vec<(String, String)>,
    fetch_failures: Vec<(String, String)>,
}

/// A catalog living in memory, speaking one dialect.
#[derive(Debug, Clone)]
pub struct MemoryCatalog {
    dialect: Dialect,
    state: Arc<Mutex<CatalogState>>,
}

impl MemoryCatalog {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            state: Arc::new(Mutex::new(CatalogState::default())),
        }
    }

    /// Runs DDL directly, panicking on failure.
    pub fn seed(&self, sql: &str) {
        let mut state = self.state.lock().unwrap();
        for statement in oxide_sync::ddl::split_statements(sql) {
            self.apply(&mut state, &statement)
                .unwrap_or_else(|e| panic!("seeding failed: {e}: {statement}"));
        }
    }

    /// Fails every executed statement containing `needle` with `message`.
    pub fn fail_execute(&self, needle: &str, message: &str) {
        self.state
            .lock()
            .unwrap()
            .execute_failures
            .push((needle.to_string(), message.to_string()));
    }

    /// Fails every catalog query containing `needle` with `message`.
    pub fn fail_fetch(&self, needle: &str, message: &str) {
        self.state
            .lock()
            .unwrap()
            .fetch_failures
            .push((needle.to_string(), message.to_string()));
    }

    /// Statements passed to `execute`, in order, including failed ones.
    pub fn executed(&self) -> Vec<String> {
        self.state.lock().unwrap().executed.clone()
    }

    pub fn table_names(&self) -> Vec<String> {
        self.state.lock().unwrap().tables.keys().cloned().collect()
    }

    pub fn column_names(&self, table: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .tables
            .get(table)
            .map(|t| t.columns.iter().map(|c| c.name.clone()).collect())
            .unwrap_or_default()
    }

    pub fn index_names(&self, table: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .tables
            .get(table)
            .map(|t| t.indexes.iter().map(|i| i.name.clone()).collect())
            .unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // DDL interpretation
    // ------------------------------------------------------------------

    fn apply(&self, state: &mut CatalogState, sql: &str) -> Result<u64, String> {
        let mut c = Cursor::new(sql);
        if c.eat_kw("CREATE") {
            if c.eat_kw("TABLE") {
                return self.create_table(state, &mut c);
            }
            let unique = c.eat_kw("UNIQUE");
            c.expect_kw("INDEX")?;
            return self.create_index(state, &mut c, unique);
        }
        if c.eat_kw("ALTER") {
            c.expect_kw("TABLE")?;
            return self.alter_table(state, &mut c);
        }
        if c.eat_kw("DROP") {
            c.expect_kw("INDEX")?;
            return self.drop_index(state, &mut c);
        }
        if c.eat_kw("COMMENT") {
            return Ok(0);
        }
        if c.eat_kw("DELETE") {
            c.expect_kw("FROM")?;
            let table = c.name()?;
            self.require_table(state, &table)?;
            let key = c.first_string().unwrap_or_default();
            return Ok(u64::from(state.ledger.remove(&key).is_some()));
        }
        if c.eat_kw("INSERT") {
            c.expect_kw("INTO")?;
            let table = c.name()?;
            self.require_table(state, &table)?;
            c.names()?;
            c.expect_kw("VALUES")?;
            c.expect_sym('(')?;
            let key = match c.next() {
                Some(Token::Str(s)) => s,
                other => return Err(format!("Syntax error in SQL statement: {other:?}")),
            };
            c.expect_sym(',')?;
            let version = match c.next() {
                Some(Token::Word(w)) => w.parse().map_err(|_| "Data conversion error".to_string())?,
                other => return Err(format!("Syntax error in SQL statement: {other:?}")),
            };
            c.expect_sym(',')?;
            let synced_at = match c.next() {
                Some(Token::Str(s)) => s,
                _ => String::new(),
            };
            state.ledger.insert(key, (version, synced_at));
            return Ok(1);
        }
        Err(format!("Syntax error in SQL statement \"{sql}\""))
    }

    fn require_table<'s>(&self, state: &'s mut CatalogState, table: &str) -> Result<&'s mut MemTable, String> {
        let message = match self.dialect {
            Dialect::MySql => format!("Table '{table}' doesn't exist"),
            Dialect::Postgres => format!("relation \"{table}\" does not exist"),
            Dialect::H2 => format!("Table \"{table}\" not found"),
        };
        state.tables.get_mut(table).ok_or(message)
    }

    fn create_table(&self, state: &mut CatalogState, c: &mut Cursor) -> Result<u64, String> {
        let if_not_exists = if c.eat_kw("IF") {
            c.expect_kw("NOT")?;
            c.expect_kw("EXISTS")?;
            true
        } else {
            false
        };
        let name = c.name()?;
        if state.tables.contains_key(&name) {
            if if_not_exists {
                return Ok(0);
            }
            return Err(match self.dialect {
                Dialect::MySql => format!("Table '{name}' already exists"),
                Dialect::Postgres => format!("relation \"{name}\" already exists"),
                Dialect::H2 => format!("Table \"{name}\" already exists"),
            });
        }

        let mut table = MemTable::default();
        c.expect_sym('(')?;
        loop {
            if c.eat_kw("PRIMARY") {
                c.expect_kw("KEY")?;
                table.primary_key = c.names()?;
            } else {
                table.columns.push(parse_column(c)?);
            }
            if !c.eat_sym(',') {
                c.expect_sym(')')?;
                break;
            }
        }
        for pk in &table.primary_key {
            if let Some(column) = table.columns.iter_mut().find(|col| &col.name == pk) {
                column.nullable = false;
            }
        }
        state.tables.insert(name, table);
        Ok(0)
    }

    fn create_index(&self, state: &mut CatalogState, c: &mut Cursor, unique: bool) -> Result<u64, String> {
        let name = c.name()?;
        c.expect_kw("ON")?;
        let table_name = c.name()?;
        let columns = c.names()?;
        let dialect = self.dialect;
        let table = self.require_table(state, &table_name)?;
        if table.indexes.iter().any(|i| i.name == name) {
            return Err(match dialect {
                Dialect::MySql => format!("Duplicate key name '{name}'"),
                Dialect::Postgres => format!("relation \"{name}\" already exists"),
                Dialect::H2 => format!("Index \"{name}\" already exists"),
            });
        }
        if let Some(missing) = columns
            .iter()
            .find(|col| !table.columns.iter().any(|existing| &existing.name == *col))
        {
            return Err(format!("Key column '{missing}' doesn't exist in table"));
        }
        table.indexes.push(MemIndex { name, columns, unique });
        Ok(0)
    }

    fn drop_index(&self, state: &mut CatalogState, c: &mut Cursor) -> Result<u64, String> {
        let name = c.name()?;
        let owner = if c.eat_kw("ON") {
            Some(c.name()?)
        } else {
            None
        };
        let found = state
            .tables
            .iter_mut()
            .filter(|(table, _)| owner.as_ref().map_or(true, |o| o == *table))
            .find_map(|(_, t)| {
                let pos = t.indexes.iter().position(|i| i.name == name)?;
                t.indexes.remove(pos);
                Some(())
            });
        found.map(|()| 0).ok_or_else(|| match self.dialect {
            Dialect::MySql => format!("Can't DROP '{name}'; check that column/key exists"),
            Dialect::Postgres => format!("index \"{name}\" does not exist"),
            Dialect::H2 => format!("Index \"{name}\" not found"),
        })
    }

    fn alter_table(&self, state: &mut CatalogState, c: &mut Cursor) -> Result<u64, String> {
        let table_name = c.name()?;
        let dialect = self.dialect;
        let table = self.require_table(state, &table_name)?;

        if c.eat_kw("ADD") {
            c.eat_kw("COLUMN");
            let column = parse_column(c)?;
            if table.columns.iter().any(|col| col.name == column.name) {
                return Err(match dialect {
                    Dialect::MySql => format!("Duplicate column name '{}'", column.name),
                    Dialect::Postgres => {
                        format!("column \"{}\" of relation \"{table_name}\" already exists", column.name)
                    }
                    Dialect::H2 => format!("Duplicate column name \"{}\"", column.name),
                });
            }
            table.columns.push(column);
            return Ok(0);
        }

        if c.eat_kw("DROP") {
            c.eat_kw("COLUMN");
            let name = c.name()?;
            let Some(pos) = table.columns.iter().position(|col| col.name == name) else {
                return Err(match dialect {
                    Dialect::MySql => format!("Can't DROP '{name}'; check that column/key exists"),
                    Dialect::Postgres => {
                        format!("column \"{name}\" of relation \"{table_name}\" does not exist")
                    }
                    Dialect::H2 => format!("Column \"{name}\" not found"),
                });
            };
            table.columns.remove(pos);
            return Ok(0);
        }

        if c.eat_kw("MODIFY") {
            if dialect == Dialect::Postgres {
                return Err("syntax error at or near \"MODIFY\"".to_string());
            }
            c.eat_kw("COLUMN");
            let column = parse_column(c)?;
            let Some(existing) = table.columns.iter_mut().find(|col| col.name == column.name) else {
                return Err(format!("Column \"{}\" not found", column.name));
            };
            *existing = column;
            return Ok(0);
        }

        c.expect_kw("ALTER")?;
        c.eat_kw("COLUMN");
        let name = c.name()?;
        let Some(column) = table.columns.iter_mut().find(|col| col.name == name) else {
            return Err(format!("column \"{name}\" does not exist"));
        };
        if c.eat_kw("TYPE") {
            let (base, params) = parse_type(c)?;
            column.base = base;
            column.params = params;
        } else if c.eat_kw("SET") {
            if c.eat_kw("NOT") {
                c.expect_kw("NULL")?;
                column.nullable = false;
            } else {
                c.expect_kw("DEFAULT")?;
                column.default = Some(parse_default(c)?);
            }
        } else {
            c.expect_kw("DROP")?;
            if c.eat_kw("NOT") {
                c.expect_kw("NULL")?;
                column.nullable = true;
            } else {
                c.expect_kw("DEFAULT")?;
                column.default = None;
            }
        }
        Ok(0)
    }

    // ------------------------------------------------------------------
    // Catalog queries
    // ------------------------------------------------------------------

    fn query(&self, state: &CatalogState, sql: &str) -> Result<Vec<CatalogRow>, String> {
        let upper = sql.to_uppercase();
        let c = Cursor::new(sql);

        if upper.contains("OXIDE_SCHEMA_VERSIONS") {
            if !state.tables.contains_key("oxide_schema_versions") {
                return Err("Table 'oxide_schema_versions' doesn't exist".to_string());
            }
            let key = c.first_string();
            return Ok(state
                .ledger
                .iter()
                .filter(|(table, _)| key.as_ref().map_or(true, |k| k == *table))
                .map(|(table, (version, synced_at))| {
                    CatalogRow::from_pairs([
                        ("table_name", Some(table.clone())),
                        ("schema_version", Some(version.to_string())),
                        ("synced_at", Some(synced_at.clone())),
                    ])
                })
                .collect());
        }

        let table_name = c.first_string().unwrap_or_default();
        if upper.contains("INFORMATION_SCHEMA.TABLES") {
            let count = u64::from(state.tables.contains_key(&table_name));
            return Ok(vec![CatalogRow::from_pairs([("COUNT(*)", Some(count.to_string()))])]);
        }

        let Some(table) = state.tables.get(&table_name) else {
            return Ok(Vec::new());
        };
        if upper.contains("INFORMATION_SCHEMA.COLUMNS") {
            return Ok(table
                .columns
                .iter()
                .map(|col| self.column_row(&table_name, col))
                .collect());
        }
        if upper.contains("INFORMATION_SCHEMA.STATISTICS")
            || upper.contains("INFORMATION_SCHEMA.INDEX_COLUMNS")
            || upper.contains("PG_INDEXES")
        {
            return Ok(self.index_rows(&table_name, table));
        }
        Err(format!("Syntax error in SQL statement \"{sql}\""))
    }

    fn column_row(&self, table: &str, col: &MemColumn) -> CatalogRow {
        let reported = report_type(self.dialect, col);
        let default = if col.auto_increment {
            match self.dialect {
                Dialect::Postgres => Some(format!("nextval('{table}_{}_seq'::regclass)", col.name)),
                _ => None,
            }
        } else {
            col.default
                .as_ref()
                .map(|d| report_default(self.dialect, reported.class, d))
        };
        let nullable = if col.nullable { "YES" } else { "NO" };

        let mut pairs: Vec<(&str, Option<String>)> = vec![
            ("column_name", Some(col.name.clone())),
            ("data_type", Some(reported.name)),
            ("character_maximum_length", reported.length.map(|v| v.to_string())),
            ("numeric_precision", reported.precision.map(|v| v.to_string())),
            ("numeric_scale", reported.scale.map(|v| v.to_string())),
            ("is_nullable", Some(nullable.to_string())),
            ("column_default", default),
        ];
        if self.dialect == Dialect::MySql {
            let extra = if col.auto_increment { "auto_increment" } else { "" };
            pairs.push(("extra", Some(extra.to_string())));
        }
        CatalogRow::from_pairs(pairs)
    }

    fn index_rows(&self, table_name: &str, table: &MemTable) -> Vec<CatalogRow> {
        let primary = MemIndex {
            name: match self.dialect {
                Dialect::MySql => "PRIMARY".to_string(),
                Dialect::Postgres => format!("{table_name}_pkey"),
                Dialect::H2 => "PRIMARY_KEY_8".to_string(),
            },
            columns: table.primary_key.clone(),
            unique: true,
        };
        let indexes = (!primary.columns.is_empty())
            .then_some(&primary)
            .into_iter()
            .chain(&table.indexes);

        let mut rows = Vec::new();
        for index in indexes {
            match self.dialect {
                Dialect::Postgres => {
                    let columns = index.columns.join(", ");
                    let definition = format!(
                        "CREATE {}INDEX {} ON public.{table_name} USING btree ({columns})",
                        if index.unique { "UNIQUE " } else { "" },
                        index.name
                    );
                    rows.push(CatalogRow::from_pairs([
                        ("indexname", Some(index.name.clone())),
                        ("indexdef", Some(definition)),
                    ]));
                }
                Dialect::MySql => {
                    for column in &index.columns {
                        rows.push(CatalogRow::from_pairs([
                            ("INDEX_NAME", Some(index.name.clone())),
                            ("COLUMN_NAME", Some(column.clone())),
                            ("NON_UNIQUE", Some(if index.unique { "0" } else { "1" }.to_string())),
                        ]));
                    }
                }
                Dialect::H2 => {
                    for column in &index.columns {
                        rows.push(CatalogRow::from_pairs([
                            ("INDEX_NAME", Some(index.name.clone())),
                            ("COLUMN_NAME", Some(column.clone())),
                            ("IS_UNIQUE", Some(if index.unique { "TRUE" } else { "FALSE" }.to_string())),
                        ]));
                    }
                }
            }
        }
        rows
    }
}

impl QueryExecutor for MemoryCatalog {
    async fn fetch(&self, sql: &str) -> Result<Vec<CatalogRow>, QueryError> {
        tokio::task::yield_now().await;
        let state = self.state.lock().unwrap();
        if let Some((_, message)) = state.fetch_failures.iter().find(|(n, _)| sql.contains(n.as_str())) {
            return Err(QueryError::new(message.clone()));
        }
        self.query(&state, sql).map_err(QueryError::new)
    }

    async fn execute(&self, sql: &str) -> Result<u64, QueryError> {
        tokio::task::yield_now().await;
        let mut state = self.state.lock().unwrap();
        state.executed.push(sql.to_string());
        if let Some((_, message)) = state.execute_failures.iter().find(|(n, _)| sql.contains(n.as_str())) {
            return Err(QueryError::new(message.clone()));
        }
        self.apply(&mut state, sql).map_err(QueryError::new)
    }

    fn product_name(&self) -> Option<String> {
        Some(
            match self.dialect {
                Dialect::MySql => "MySQL",
                Dialect::Postgres => "PostgreSQL",
                Dialect::H2 => "H2",
            }
            .to_string(),
        )
    }
}

// ----------------------------------------------------------------------
// Column parsing
// ----------------------------------------------------------------------

fn parse_type(c: &mut Cursor) -> Result<(String, Vec<u64>), String> {
    let mut words = Vec::new();
    while let Some(Token::Word(w)) = c.peek() {
        if CONSTRAINT_KEYWORDS.iter().any(|k| w.eq_ignore_ascii_case(k)) {
            break;
        }
        words.push(w.to_uppercase());
        c.pos += 1;
    }
    if words.is_empty() {
        return Err("Syntax error in SQL statement: expected type".to_string());
    }
    let mut params = Vec::new();
    if c.eat_sym('(') {
        loop {
            match c.next() {
                Some(Token::Word(w)) => params.push(w.parse().map_err(|_| format!("bad size {w}"))?),
                other => return Err(format!("Syntax error in SQL statement: {other:?}")),
            }
            if !c.eat_sym(',') {
                c.expect_sym(')')?;
                break;
            }
        }
    }
    // Trailing words such as `DOUBLE PRECISION` after parameters are not generated.
    Ok((words.join(" "), params))
}

fn parse_default(c: &mut Cursor) -> Result<DefaultValue, String> {
    match c.next() {
        Some(Token::Str(s)) => Ok(DefaultValue::Literal(s)),
        Some(Token::Sym('-')) => match c.next() {
            Some(Token::Word(w)) => Ok(DefaultValue::Expression(format!("-{w}"))),
            other => Err(format!("Syntax error in SQL statement: {other:?}")),
        },
        Some(Token::Word(w)) => {
            if c.eat_sym('(') {
                c.expect_sym(')')?;
                Ok(DefaultValue::Expression(format!("{w}()")))
            } else {
                Ok(DefaultValue::Expression(w))
            }
        }
        other => Err(format!("Syntax error in SQL statement: {other:?}")),
    }
}

fn parse_column(c: &mut Cursor) -> Result<MemColumn, String> {
    let name = c.name()?;
    let (base, params) = parse_type(c)?;
    let serial = matches!(base.as_str(), "SERIAL" | "BIGSERIAL" | "SMALLSERIAL");
    let mut column = MemColumn {
        name,
        base,
        params,
        nullable: !serial,
        default: None,
        auto_increment: serial,
    };
    loop {
        if c.eat_kw("NOT") {
            c.expect_kw("NULL")?;
            column.nullable = false;
        } else if c.eat_kw("NULL") {
            column.nullable = true;
        } else if c.eat_kw("DEFAULT") {
            column.default = Some(parse_default(c)?);
        } else if c.eat_kw("AUTO_INCREMENT") {
            column.auto_increment = true;
        } else if c.eat_kw("COMMENT") {
            c.next();
        } else {
            break;
        }
    }
    Ok(column)
}

// ----------------------------------------------------------------------
// Catalog reporting
// ----------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    Integer,
    Decimal,
    String,
    Boolean,
    Temporal,
}

struct Reported {
    name: String,
    class: Class,
    length: Option<u64>,
    precision: Option<u64>,
    scale: Option<u64>,
}

fn report_type(dialect: Dialect, col: &MemColumn) -> Reported {
    let param = |i: usize| col.params.get(i).copied();
    let integer = |name: &str, precision: u64| Reported {
        name: name.to_string(),
        class: Class::Integer,
        length: None,
        precision: Some(precision),
        scale: Some(0),
    };
    let decimal = |name: &str, precision: Option<u64>, scale: Option<u64>| Reported {
        name: name.to_string(),
        class: Class::Decimal,
        length: None,
        precision,
        scale,
    };
    let string = |name: &str, length: Option<u64>| Reported {
        name: name.to_string(),
        class: Class::String,
        length,
        precision: None,
        scale: None,
    };
    let other = |name: &str, class: Class| Reported {
        name: name.to_string(),
        class,
        length: None,
        precision: None,
        scale: None,
    };

    match (dialect, col.base.as_str()) {
        (Dialect::MySql, "INT" | "INTEGER") => integer("int", 10),
        (Dialect::MySql, "BIGINT") => integer("bigint", 19),
        (Dialect::MySql, "SMALLINT") => integer("smallint", 5),
        (Dialect::MySql, "TINYINT" | "BOOLEAN") => integer("tinyint", 3),
        (Dialect::MySql, "DECIMAL") => decimal("decimal", param(0).or(Some(10)), param(1).or(Some(0))),
        (Dialect::MySql, "DOUBLE") => decimal("double", Some(22), None),
        (Dialect::MySql, "FLOAT" | "REAL") => decimal("float", Some(12), None),
        (Dialect::MySql, "VARCHAR") => string("varchar", param(0)),
        (Dialect::MySql, "TEXT") => string("text", Some(65_535)),
        (Dialect::MySql, "TIMESTAMP") => other("timestamp", Class::Temporal),
        (Dialect::MySql, "DATE") => other("date", Class::Temporal),
        (Dialect::MySql, "TIME") => other("time", Class::Temporal),

        (Dialect::Postgres, "INT" | "INTEGER" | "SERIAL") => integer("integer", 32),
        (Dialect::Postgres, "BIGINT" | "BIGSERIAL") => integer("bigint", 64),
        (Dialect::Postgres, "SMALLINT" | "SMALLSERIAL" | "TINYINT") => integer("smallint", 16),
        (Dialect::Postgres, "DECIMAL" | "NUMERIC") => decimal("numeric", param(0), param(1)),
        (Dialect::Postgres, "DOUBLE" | "DOUBLE PRECISION") => decimal("double precision", Some(53), None),
        (Dialect::Postgres, "REAL") => decimal("real", Some(24), None),
        (Dialect::Postgres, "BOOLEAN") => other("boolean", Class::Boolean),
        (Dialect::Postgres, "VARCHAR") => string("character varying", param(0)),
        (Dialect::Postgres, "TEXT") => string("text", None),
        (Dialect::Postgres, "TIMESTAMP") => other("timestamp without time zone", Class::Temporal),
        (Dialect::Postgres, "DATE") => other("date", Class::Temporal),
        (Dialect::Postgres, "TIME") => other("time without time zone", Class::Temporal),

        (Dialect::H2, "INT" | "INTEGER") => integer("INTEGER", 32),
        (Dialect::H2, "BIGINT") => integer("BIGINT", 64),
        (Dialect::H2, "SMALLINT") => integer("SMALLINT", 16),
        (Dialect::H2, "TINYINT") => integer("TINYINT", 8),
        (Dialect::H2, "DECIMAL" | "NUMERIC") => decimal("NUMERIC", param(0).or(Some(100_000)), param(1).or(Some(0))),
        (Dialect::H2, "DOUBLE" | "DOUBLE PRECISION") => decimal("DOUBLE PRECISION", Some(53), None),
        (Dialect::H2, "REAL") => decimal("REAL", Some(24), None),
        (Dialect::H2, "BOOLEAN") => other("BOOLEAN", Class::Boolean),
        (Dialect::H2, "VARCHAR") => string("CHARACTER VARYING", param(0).or(Some(1_000_000_000))),
        (Dialect::H2, "TEXT") => string("CHARACTER LARGE OBJECT", Some(1_000_000_000)),
        (Dialect::H2, "TIMESTAMP") => other("TIMESTAMP", Class::Temporal),
        (Dialect::H2, "DATE") => other("DATE", Class::Temporal),
        (Dialect::H2, "TIME") => other("TIME", Class::Temporal),

        (_, base) => other(&base.to_lowercase(), Class::String),
    }
}

fn report_default(dialect: Dialect, class: Class, default: &DefaultValue) -> String {
    let value = match default {
        DefaultValue::Expression(expr) => return expr.clone(),
        DefaultValue::Literal(value) => value,
    };
    let quoted = format!("'{}'", value.replace('\'', "''"));
    match (dialect, class) {
        (Dialect::MySql, _) => value.clone(),
        (Dialect::Postgres, Class::String) => format!("{quoted}::character varying"),
        (Dialect::Postgres, Class::Boolean) => value.to_lowercase(),
        (Dialect::Postgres, Class::Temporal) => format!("{quoted}::timestamp without time zone"),
        (Dialect::Postgres, _) => value.clone(),
        (Dialect::H2, Class::String | Class::Temporal) => quoted,
        (Dialect::H2, Class::Boolean) => value.to_uppercase(),
        (Dialect::H2, _) => value.clone(),
    }
}
