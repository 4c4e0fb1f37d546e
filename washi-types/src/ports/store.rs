//! Store port traits.
//!
//! One generic store serves every entity type. Reads go straight to the
//! store; writes go through a `UnitOfWork` and become visible together when
//! it commits.

use crate::entity::{Entity, Value};
use crate::error::RepoError;

/// Conjunction of `property = value` conditions over declared property names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(&'static str, Value)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, property: &'static str, value: impl Into<Value>) -> Self {
        self.conditions.push((property, value.into()));
        self
    }

    pub fn conditions(&self) -> &[(&'static str, Value)] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

/// The read side of persistence plus a factory for units of work.
#[async_trait::async_trait]
pub trait Store: Send + Sync + 'static {
    type Work: UnitOfWork;

    /// Gets an entity by id.
    async fn find_by_id<E: Entity>(&self, id: i64) -> Result<Option<E>, RepoError>;

    /// Lists every entity of a type, ordered by id.
    async fn list<E: Entity>(&self) -> Result<Vec<E>, RepoError>;

    /// Lists entities matching every condition of `filter`, ordered by id.
    async fn list_by<E: Entity>(&self, filter: &Filter) -> Result<Vec<E>, RepoError>;

    /// Opens a unit of work.
    async fn begin(&self) -> Result<Self::Work, RepoError>;
}

/// A set of mutations committed atomically.
///
/// Dropping a unit of work without calling `commit` discards every mutation
/// issued on it.
#[async_trait::async_trait]
pub trait UnitOfWork: Send {
    /// Inserts an entity and returns it with its assigned id.
    ///
    /// An entity that already carries an id is inserted under that id.
    async fn add<E: Entity>(&mut self, entity: E) -> Result<E, RepoError>;

    /// Overwrites the persisted row of an entity with its current values.
    async fn update<E: Entity>(&mut self, entity: &E) -> Result<(), RepoError>;

    /// Deletes the persisted row of an entity.
    async fn remove<E: Entity>(&mut self, entity: &E) -> Result<(), RepoError>;

    /// Persists every pending mutation.
    async fn commit(self) -> Result<(), RepoError>;
}
