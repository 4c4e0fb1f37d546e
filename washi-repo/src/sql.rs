//! SQL text generation from the schema model.
//!
//! Everything here is plain string building over `EntityType`s; the adapters
//! bind the returned parameters and execute the statements.

use washi_types::entity::ID;
use washi_types::schema::{ColumnType, EntityType, Model};
use washi_types::{Filter, Record, RepoError, Value};

/// Target SQL dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    Postgres,
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::Sqlite => write!(f, "sqlite"),
            Dialect::Postgres => write!(f, "postgres"),
        }
    }
}

impl std::str::FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(Dialect::Sqlite),
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            other => Err(format!("Unsupported dialect: {}", other)),
        }
    }
}

impl Dialect {
    fn placeholder(self, n: usize) -> String {
        match self {
            Dialect::Sqlite => "?".to_string(),
            Dialect::Postgres => format!("${}", n),
        }
    }

    fn column_type(self, column_type: ColumnType) -> String {
        match (self, column_type) {
            (Dialect::Sqlite, ColumnType::Integer) => "INTEGER".into(),
            (Dialect::Sqlite, ColumnType::Real) => "REAL".into(),
            (Dialect::Sqlite, ColumnType::Text { .. }) => "TEXT".into(),
            (Dialect::Sqlite, ColumnType::Timestamp) => "TEXT".into(),
            (Dialect::Postgres, ColumnType::Integer) => "BIGINT".into(),
            (Dialect::Postgres, ColumnType::Real) => "DOUBLE PRECISION".into(),
            (Dialect::Postgres, ColumnType::Text { max_length: Some(n) }) => {
                format!("VARCHAR({})", n)
            }
            (Dialect::Postgres, ColumnType::Text { max_length: None }) => "TEXT".into(),
            (Dialect::Postgres, ColumnType::Timestamp) => "TIMESTAMPTZ".into(),
        }
    }
}

/// A bound parameter. The column type is carried so adapters can bind a
/// correctly typed NULL.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub value: Value,
    pub column_type: ColumnType,
}

/// SQL text plus its parameters in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Param>,
}

struct StatementBuilder {
    dialect: Dialect,
    params: Vec<Param>,
}

impl StatementBuilder {
    fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            params: Vec::new(),
        }
    }

    /// Registers a parameter and returns its placeholder.
    fn push(&mut self, value: Value, column_type: ColumnType) -> String {
        self.params.push(Param { value, column_type });
        self.dialect.placeholder(self.params.len())
    }

    fn finish(self, sql: String) -> Statement {
        Statement {
            sql,
            params: self.params,
        }
    }
}

/// Quotes an identifier.
pub fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn column_list(et: &EntityType) -> String {
    et.properties()
        .iter()
        .map(|p| quote(&p.column))
        .collect::<Vec<_>>()
        .join(", ")
}

// ─────────────────────────────────────────────────────────────────────────────
// DDL
// ─────────────────────────────────────────────────────────────────────────────

pub fn create_table(dialect: Dialect, model: &Model, et: &EntityType) -> Result<String, RepoError> {
    let mut lines = Vec::new();

    for property in et.properties() {
        let mut line = format!(
            "    {} {}",
            quote(&property.column),
            dialect.column_type(property.column_type)
        );
        if property.required {
            line.push_str(" NOT NULL");
        }
        if property.name == ID {
            match dialect {
                Dialect::Sqlite => line.push_str(&format!(
                    " CONSTRAINT {} PRIMARY KEY AUTOINCREMENT",
                    quote(&et.primary_key().name)
                )),
                Dialect::Postgres => line.push_str(" GENERATED BY DEFAULT AS IDENTITY"),
            }
        }
        lines.push(line);
    }

    if dialect == Dialect::Postgres {
        let key_columns = et
            .primary_key()
            .properties
            .iter()
            .map(|p| quote(et.column(p).unwrap_or(*p)))
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!(
            "    CONSTRAINT {} PRIMARY KEY ({})",
            quote(&et.primary_key().name),
            key_columns
        ));
    }

    for fk in et.foreign_keys() {
        let principal = model.entity(fk.principal).ok_or_else(|| {
            RepoError::Schema(format!("{} references unknown entity {}", et.name, fk.principal))
        })?;
        lines.push(format!(
            "    CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({}) ON DELETE CASCADE",
            quote(&fk.constraint_name),
            quote(et.column(fk.property).unwrap_or(fk.property)),
            quote(&principal.table),
            quote(principal.key_column()),
        ));
    }

    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {} (\n{}\n)",
        quote(&et.table),
        lines.join(",\n")
    ))
}

pub fn create_indexes(et: &EntityType) -> Vec<String> {
    et.indexes()
        .iter()
        .map(|index| {
            let columns = index
                .properties
                .iter()
                .map(|p| quote(et.column(p).unwrap_or(*p)))
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "CREATE {}INDEX IF NOT EXISTS {} ON {} ({})",
                if index.unique { "UNIQUE " } else { "" },
                quote(&index.name),
                quote(&et.table),
                columns
            )
        })
        .collect()
}

/// Every CREATE TABLE / CREATE INDEX statement, principals first.
pub fn schema_statements(dialect: Dialect, model: &Model) -> Result<Vec<String>, RepoError> {
    let mut statements = Vec::new();
    for et in model.entity_types() {
        statements.push(create_table(dialect, model, et)?);
        statements.extend(create_indexes(et));
    }
    Ok(statements)
}

/// Moves a Postgres identity past the highest existing id.
pub fn reset_identity(et: &EntityType) -> String {
    format!(
        "SELECT setval(pg_get_serial_sequence('{}', '{}'), COALESCE((SELECT MAX({}) FROM {}), 0) + 1, false)",
        quote(&et.table),
        et.key_column(),
        quote(et.key_column()),
        quote(&et.table),
    )
}

/// Query listing the tables already present, one name per row.
pub fn existing_tables(dialect: Dialect) -> &'static str {
    match dialect {
        Dialect::Sqlite => "SELECT name FROM sqlite_master WHERE type = 'table'",
        Dialect::Postgres => {
            "SELECT table_name::text FROM information_schema.tables \
             WHERE table_schema = current_schema()"
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// DML
// ─────────────────────────────────────────────────────────────────────────────

fn insert_statement(dialect: Dialect, et: &EntityType, record: &Record, suffix: &str) -> Statement {
    let mut builder = StatementBuilder::new(dialect);
    let mut columns = Vec::new();
    let mut placeholders = Vec::new();

    for property in et.properties() {
        if property.generated_on_add && record.get(property.name).is_null() {
            continue;
        }
        columns.push(quote(&property.column));
        placeholders.push(builder.push(record.get(property.name).clone(), property.column_type));
    }

    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({}){}",
        quote(&et.table),
        columns.join(", "),
        placeholders.join(", "),
        suffix
    );
    builder.finish(sql)
}

/// INSERT returning the row's id. A record carrying an id keeps it.
pub fn insert(dialect: Dialect, et: &EntityType, record: &Record) -> Statement {
    let suffix = format!(" RETURNING {}", quote(et.key_column()));
    insert_statement(dialect, et, record, &suffix)
}

/// INSERT of a seed row; a row with the same id already present is kept.
pub fn insert_seed(dialect: Dialect, et: &EntityType, record: &Record) -> Statement {
    insert_statement(dialect, et, record, " ON CONFLICT DO NOTHING")
}

pub fn update(dialect: Dialect, et: &EntityType, record: &Record, id: i64) -> Statement {
    let mut builder = StatementBuilder::new(dialect);
    let assignments: Vec<String> = et
        .insertable()
        .map(|p| {
            let placeholder = builder.push(record.get(p.name).clone(), p.column_type);
            format!("{} = {}", quote(&p.column), placeholder)
        })
        .collect();
    let key = builder.push(Value::Integer(id), ColumnType::Integer);

    let sql = format!(
        "UPDATE {} SET {} WHERE {} = {}",
        quote(&et.table),
        assignments.join(", "),
        quote(et.key_column()),
        key
    );
    builder.finish(sql)
}

pub fn delete(dialect: Dialect, et: &EntityType, id: i64) -> Statement {
    let mut builder = StatementBuilder::new(dialect);
    let key = builder.push(Value::Integer(id), ColumnType::Integer);
    let sql = format!(
        "DELETE FROM {} WHERE {} = {}",
        quote(&et.table),
        quote(et.key_column()),
        key
    );
    builder.finish(sql)
}

pub fn select_by_id(dialect: Dialect, et: &EntityType, id: i64) -> Statement {
    let mut builder = StatementBuilder::new(dialect);
    let key = builder.push(Value::Integer(id), ColumnType::Integer);
    let sql = format!(
        "SELECT {} FROM {} WHERE {} = {}",
        column_list(et),
        quote(&et.table),
        quote(et.key_column()),
        key
    );
    builder.finish(sql)
}

/// SELECT of every row matching `filter`, ordered by id.
pub fn select(dialect: Dialect, et: &EntityType, filter: &Filter) -> Result<Statement, RepoError> {
    let mut builder = StatementBuilder::new(dialect);
    let mut conditions = Vec::new();

    for (name, value) in filter.conditions() {
        let property = et.property_named(name).ok_or_else(|| {
            RepoError::Schema(format!("{} has no property named {}", et.name, name))
        })?;
        if value.is_null() {
            conditions.push(format!("{} IS NULL", quote(&property.column)));
        } else {
            let placeholder = builder.push(value.clone(), property.column_type);
            conditions.push(format!("{} = {}", quote(&property.column), placeholder));
        }
    }

    let mut sql = format!("SELECT {} FROM {}", column_list(et), quote(&et.table));
    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }
    sql.push_str(&format!(" ORDER BY {}", quote(et.key_column())));

    Ok(builder.finish(sql))
}

// ─────────────────────────────────────────────────────────────────────────────
// Offline script
// ─────────────────────────────────────────────────────────────────────────────

fn literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".into(),
        Value::Integer(v) => v.to_string(),
        Value::Real(v) => format!("{:?}", v),
        Value::Text(v) => format!("'{}'", v.replace('\'', "''")),
        Value::Timestamp(v) => format!("'{}'", v.to_rfc3339()),
    }
}

/// Renders a statement with its parameters inlined as literals.
pub fn inline(dialect: Dialect, statement: &Statement) -> String {
    match dialect {
        Dialect::Sqlite => {
            let mut out = String::with_capacity(statement.sql.len());
            let mut params = statement.params.iter().peekable();
            for c in statement.sql.chars() {
                match params.next_if(|_| c == '?') {
                    Some(param) => out.push_str(&literal(&param.value)),
                    None => out.push(c),
                }
            }
            out
        }
        Dialect::Postgres => {
            // Scans the template once, so `$<n>` inside an inlined literal
            // is never treated as a placeholder.
            let mut out = String::with_capacity(statement.sql.len());
            let mut chars = statement.sql.chars().peekable();
            while let Some(c) = chars.next() {
                if c != '$' {
                    out.push(c);
                    continue;
                }
                let mut digits = String::new();
                while let Some(d) = chars.next_if(char::is_ascii_digit) {
                    digits.push(d);
                }
                let param = digits
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| statement.params.get(i));
                match param {
                    Some(param) => out.push_str(&literal(&param.value)),
                    None => {
                        out.push('$');
                        out.push_str(&digits);
                    }
                }
            }
            out
        }
    }
}

/// The full creation script: tables, indexes and seed rows.
pub fn schema_script(dialect: Dialect, model: &Model) -> Result<String, RepoError> {
    let mut out = String::new();
    for statement in schema_statements(dialect, model)? {
        out.push_str(&statement);
        out.push_str(";\n\n");
    }

    for et in model.entity_types() {
        for record in et.seed() {
            out.push_str(&inline(dialect, &insert_seed(dialect, et, record)));
            out.push_str(";\n");
        }
        if dialect == Dialect::Postgres && !et.seed().is_empty() {
            out.push_str(&reset_identity(et));
            out.push_str(";\n");
        }
    }

    Ok(out)
}
