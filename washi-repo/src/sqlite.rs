//! SQLite store adapter.
#![allow(clippy::collapsible_if)]

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};

use washi_types::schema::{ColumnType, EntityType, Model};
use washi_types::{Entity, Filter, Record, RepoError, Store, UnitOfWork, Value};

use crate::sql::{self, Dialect, Param, Statement};
use crate::{db_error, entity_type};

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

// ─────────────────────────────────────────────────────────────────────────────
// SQLite Store
// ─────────────────────────────────────────────────────────────────────────────

/// SQLite store implementation.
pub struct SqliteStore {
    pool: SqlitePool,
    model: Arc<Model>,
}

impl SqliteStore {
    /// Connects to the database and creates the schema.
    pub async fn new(database_url: &str, model: Model) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            let path = path.split('?').next().unwrap_or(path);
            if path != ":memory:" {
                if let Some(parent) = std::path::Path::new(path).parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        // Every connection to `:memory:` is its own database, so an in-memory
        // store keeps exactly one connection alive for its whole life.
        let pool = if is_in_memory(database_url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new().connect_with(options).await?
        };

        let store = Self {
            pool,
            model: Arc::new(model),
        };
        store.create_schema().await?;

        tracing::debug!(url = %database_url, "sqlite store ready");
        Ok(store)
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Creates missing tables and indexes, atomically. Seed rows go only
    /// into tables created by this call, so rows deleted later stay deleted.
    pub async fn create_schema(&self) -> Result<(), RepoError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;

        let existing: HashSet<String> =
            sqlx::query_scalar::<_, String>(sql::existing_tables(Dialect::Sqlite))
                .fetch_all(&mut *tx)
                .await
                .map_err(db_error)?
                .into_iter()
                .collect();

        for ddl in sql::schema_statements(Dialect::Sqlite, &self.model)? {
            sqlx::query(&ddl)
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;
        }

        for et in self.model.entity_types() {
            if existing.contains(&et.table) || et.seed().is_empty() {
                continue;
            }
            tracing::info!(table = %et.table, rows = et.seed().len(), "seeding new table");
            for record in et.seed() {
                let stmt = sql::insert_seed(Dialect::Sqlite, et, record);
                bind_all(sqlx::query(&stmt.sql), &stmt)
                    .execute(&mut *tx)
                    .await
                    .map_err(db_error)?;
            }
        }

        tx.commit()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))
    }
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

// ─────────────────────────────────────────────────────────────────────────────
// Binding & decoding
// ─────────────────────────────────────────────────────────────────────────────

fn bind<'q>(query: SqliteQuery<'q>, param: &Param) -> SqliteQuery<'q> {
    match &param.value {
        Value::Null => query.bind(None::<String>),
        Value::Integer(v) => query.bind(*v),
        Value::Real(v) => query.bind(*v),
        Value::Text(v) => query.bind(v.clone()),
        // Timestamps are stored as RFC 3339 text.
        Value::Timestamp(v) => query.bind(v.to_rfc3339()),
    }
}

fn bind_all<'q>(query: SqliteQuery<'q>, stmt: &Statement) -> SqliteQuery<'q> {
    stmt.params.iter().fold(query, bind)
}

fn decode(row: &SqliteRow, et: &EntityType) -> Result<Record, RepoError> {
    let mut record = Record::new(et.name);
    for (i, property) in et.properties().iter().enumerate() {
        let value: Value = match property.column_type {
            ColumnType::Integer => row.try_get::<Option<i64>, _>(i).map(Value::from),
            ColumnType::Real => row.try_get::<Option<f64>, _>(i).map(Value::from),
            ColumnType::Text { .. } | ColumnType::Timestamp => {
                row.try_get::<Option<String>, _>(i).map(Value::from)
            }
        }
        .map_err(db_error)?;
        record.set(property.name, value);
    }
    Ok(record)
}

fn decode_entity<E: Entity>(row: &SqliteRow, et: &EntityType) -> Result<E, RepoError> {
    let record = decode(row, et)?;
    E::from_record(&record).map_err(RepoError::Domain)
}

// ─────────────────────────────────────────────────────────────────────────────
// Store implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl Store for SqliteStore {
    type Work = SqliteWork;

    async fn find_by_id<E: Entity>(&self, id: i64) -> Result<Option<E>, RepoError> {
        let et = entity_type::<E>(&self.model)?;
        let stmt = sql::select_by_id(Dialect::Sqlite, et, id);

        let row = bind_all(sqlx::query(&stmt.sql), &stmt)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        row.map(|row| decode_entity(&row, et)).transpose()
    }

    async fn list<E: Entity>(&self) -> Result<Vec<E>, RepoError> {
        self.list_by(&Filter::new()).await
    }

    async fn list_by<E: Entity>(&self, filter: &Filter) -> Result<Vec<E>, RepoError> {
        let et = entity_type::<E>(&self.model)?;
        let stmt = sql::select(Dialect::Sqlite, et, filter)?;

        let rows = bind_all(sqlx::query(&stmt.sql), &stmt)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        rows.iter().map(|row| decode_entity(row, et)).collect()
    }

    async fn begin(&self) -> Result<SqliteWork, RepoError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;

        Ok(SqliteWork {
            tx,
            model: self.model.clone(),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Unit of work
// ─────────────────────────────────────────────────────────────────────────────

/// A unit of work backed by one SQLite transaction. Rolled back on drop
/// unless committed.
pub struct SqliteWork {
    tx: Transaction<'static, Sqlite>,
    model: Arc<Model>,
}

#[async_trait]
impl UnitOfWork for SqliteWork {
    async fn add<E: Entity>(&mut self, mut entity: E) -> Result<E, RepoError> {
        entity.validate()?;
        let et = entity_type::<E>(&self.model)?;
        let stmt = sql::insert(Dialect::Sqlite, et, &entity.to_record());

        let row = bind_all(sqlx::query(&stmt.sql), &stmt)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(db_error)?;
        let id: i64 = row.try_get(0).map_err(db_error)?;

        entity.set_id(Some(id));
        Ok(entity)
    }

    async fn update<E: Entity>(&mut self, entity: &E) -> Result<(), RepoError> {
        let id = entity.id().ok_or(RepoError::NotFound)?;
        entity.validate()?;
        let et = entity_type::<E>(&self.model)?;
        let stmt = sql::update(Dialect::Sqlite, et, &entity.to_record(), id);

        let result = bind_all(sqlx::query(&stmt.sql), &stmt)
            .execute(&mut *self.tx)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn remove<E: Entity>(&mut self, entity: &E) -> Result<(), RepoError> {
        let id = entity.id().ok_or(RepoError::NotFound)?;
        let et = entity_type::<E>(&self.model)?;
        let stmt = sql::delete(Dialect::Sqlite, et, id);

        let result = bind_all(sqlx::query(&stmt.sql), &stmt)
            .execute(&mut *self.tx)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn commit(self) -> Result<(), RepoError> {
        self.tx
            .commit()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))
    }
}
