//! PostgreSQL store adapter.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};

use washi_types::schema::{ColumnType, EntityType, Model};
use washi_types::{Entity, Filter, Record, RepoError, Store, UnitOfWork, Value};

use crate::sql::{self, Dialect, Param, Statement};
use crate::{db_error, entity_type};

type PgQuery<'q> = sqlx::query::Query<'q, Postgres, PgArguments>;

/// PostgreSQL store implementation.
pub struct PostgresStore {
    pool: PgPool,
    model: Arc<Model>,
}

impl PostgresStore {
    /// Connects to the database and creates the schema.
    pub async fn new(database_url: &str, model: Model) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        let store = Self {
            pool,
            model: Arc::new(model),
        };
        store.create_schema().await?;

        tracing::debug!("postgres store ready");
        Ok(store)
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Creates missing tables and indexes, atomically. Tables created by this
    /// call get their seed rows and an identity moved past the highest seed
    /// id; tables that already existed are left as they are.
    pub async fn create_schema(&self) -> Result<(), RepoError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;

        let existing: HashSet<String> =
            sqlx::query_scalar::<_, String>(sql::existing_tables(Dialect::Postgres))
                .fetch_all(&mut *tx)
                .await
                .map_err(db_error)?
                .into_iter()
                .collect();

        for ddl in sql::schema_statements(Dialect::Postgres, &self.model)? {
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
                let stmt = sql::insert_seed(Dialect::Postgres, et, record);
                bind_all(sqlx::query(&stmt.sql), &stmt)
                    .execute(&mut *tx)
                    .await
                    .map_err(db_error)?;
            }
            sqlx::query(&sql::reset_identity(et))
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;
        }

        tx.commit()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Binding & decoding
// ─────────────────────────────────────────────────────────────────────────────

fn bind<'q>(query: PgQuery<'q>, param: &Param) -> PgQuery<'q> {
    match (&param.value, param.column_type) {
        // Postgres checks parameter types, so NULLs carry their column's type.
        (Value::Null, ColumnType::Integer) => query.bind(None::<i64>),
        (Value::Null, ColumnType::Real) => query.bind(None::<f64>),
        (Value::Null, ColumnType::Text { .. }) => query.bind(None::<String>),
        (Value::Null, ColumnType::Timestamp) => query.bind(None::<DateTime<Utc>>),
        (Value::Integer(v), ColumnType::Real) => query.bind(*v as f64),
        (Value::Integer(v), _) => query.bind(*v),
        (Value::Real(v), _) => query.bind(*v),
        (Value::Text(v), ColumnType::Timestamp) => {
            match DateTime::parse_from_rfc3339(v) {
                Ok(ts) => query.bind(ts.with_timezone(&Utc)),
                Err(_) => query.bind(v.clone()),
            }
        }
        (Value::Text(v), _) => query.bind(v.clone()),
        (Value::Timestamp(v), _) => query.bind(*v),
    }
}

fn bind_all<'q>(query: PgQuery<'q>, stmt: &Statement) -> PgQuery<'q> {
    stmt.params.iter().fold(query, bind)
}

fn decode(row: &PgRow, et: &EntityType) -> Result<Record, RepoError> {
    let mut record = Record::new(et.name);
    for (i, property) in et.properties().iter().enumerate() {
        let value: Value = match property.column_type {
            ColumnType::Integer => row.try_get::<Option<i64>, _>(i).map(Value::from),
            ColumnType::Real => row.try_get::<Option<f64>, _>(i).map(Value::from),
            ColumnType::Text { .. } => row.try_get::<Option<String>, _>(i).map(Value::from),
            ColumnType::Timestamp => row.try_get::<Option<DateTime<Utc>>, _>(i).map(Value::from),
        }
        .map_err(db_error)?;
        record.set(property.name, value);
    }
    Ok(record)
}

fn decode_entity<E: Entity>(row: &PgRow, et: &EntityType) -> Result<E, RepoError> {
    let record = decode(row, et)?;
    E::from_record(&record).map_err(RepoError::Domain)
}

// ─────────────────────────────────────────────────────────────────────────────
// Store implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl Store for PostgresStore {
    type Work = PostgresWork;

    async fn find_by_id<E: Entity>(&self, id: i64) -> Result<Option<E>, RepoError> {
        let et = entity_type::<E>(&self.model)?;
        let stmt = sql::select_by_id(Dialect::Postgres, et, id);

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
        let stmt = sql::select(Dialect::Postgres, et, filter)?;

        let rows = bind_all(sqlx::query(&stmt.sql), &stmt)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        rows.iter().map(|row| decode_entity(row, et)).collect()
    }

    async fn begin(&self) -> Result<PostgresWork, RepoError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;

        Ok(PostgresWork {
            tx,
            model: self.model.clone(),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Unit of work
// ─────────────────────────────────────────────────────────────────────────────

/// A unit of work backed by one Postgres transaction. Rolled back on drop
/// unless committed.
pub struct PostgresWork {
    tx: Transaction<'static, Postgres>,
    model: Arc<Model>,
}

#[async_trait]
impl UnitOfWork for PostgresWork {
    async fn add<E: Entity>(&mut self, mut entity: E) -> Result<E, RepoError> {
        entity.validate()?;
        let et = entity_type::<E>(&self.model)?;
        let stmt = sql::insert(Dialect::Postgres, et, &entity.to_record());

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
        let stmt = sql::update(Dialect::Postgres, et, &entity.to_record(), id);

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
        let stmt = sql::delete(Dialect::Postgres, et, id);

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
