//! CRUD Application Services
//!
//! Orchestrates entity operations through the store port.
//! Contains NO infrastructure logic - pure orchestration.
//!
//! Every operation returns `Result<_, ServiceError>`: store failures are
//! caught here and carried as `ServiceError::Persistence` with the store's
//! message text, so nothing below this layer reaches a caller unconverted.

use std::marker::PhantomData;
use std::sync::Arc;

use washi_types::{
    Entity, Filter, Order, RepoError, ServiceAction, ServiceError, Store, UnitOfWork,
};

/// Generic application service for one entity type.
///
/// Generic over `S: Store` - the adapter is injected at compile time.
/// One store instance is shared by every service built from the same `Arc`.
pub struct CrudService<E: Entity, S: Store> {
    store: Arc<S>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity, S: Store> Clone for CrudService<E, S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity, S: Store> CrudService<E, S> {
    /// Creates a new service over the given store.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn failed(action: ServiceAction) -> impl FnOnce(RepoError) -> ServiceError {
        move |err| {
            tracing::warn!(entity = E::LABEL, %action, error = %err, "store operation failed");
            ServiceError::persistence(action, E::LABEL, err)
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────────────

    /// Gets an entity by id.
    #[tracing::instrument(skip(self), fields(entity = E::LABEL))]
    pub async fn find_by_id(&self, id: i64) -> Result<E, ServiceError> {
        self.store
            .find_by_id::<E>(id)
            .await
            .map_err(Self::failed(ServiceAction::Retrieving))?
            .ok_or(ServiceError::NotFound { entity: E::LABEL })
    }

    /// Lists every entity, ordered by id.
    #[tracing::instrument(skip(self), fields(entity = E::LABEL))]
    pub async fn list(&self) -> Result<Vec<E>, ServiceError> {
        self.store
            .list::<E>()
            .await
            .map_err(Self::failed(ServiceAction::Retrieving))
    }

    /// Lists the entities matching `filter`, ordered by id.
    #[tracing::instrument(skip(self), fields(entity = E::LABEL))]
    pub async fn list_by(&self, filter: &Filter) -> Result<Vec<E>, ServiceError> {
        self.store
            .list_by::<E>(filter)
            .await
            .map_err(Self::failed(ServiceAction::Retrieving))
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Writes
    // ─────────────────────────────────────────────────────────────────────────────

    /// Persists a new entity and returns it with its assigned id.
    ///
    /// Any id carried by `entity` is discarded.
    #[tracing::instrument(skip(self, entity), fields(entity = E::LABEL))]
    pub async fn save(&self, mut entity: E) -> Result<E, ServiceError> {
        entity.set_id(None);

        let failed = Self::failed(ServiceAction::Saving);
        let saved = async {
            let mut work = self.store.begin().await?;
            let saved = work.add(entity).await?;
            work.commit().await?;
            Ok::<_, RepoError>(saved)
        }
        .await
        .map_err(failed)?;

        tracing::info!(id = ?saved.id(), "{} saved", E::LABEL);
        Ok(saved)
    }

    /// Copies the updatable fields of `patch` onto the entity stored under
    /// `id` and persists it.
    #[tracing::instrument(skip(self, patch), fields(entity = E::LABEL))]
    pub async fn update(&self, id: i64, patch: E) -> Result<E, ServiceError> {
        let mut existing = self.find_by_id(id).await?;
        existing.apply_patch(&patch);

        let failed = Self::failed(ServiceAction::Updating);
        async {
            let mut work = self.store.begin().await?;
            work.update(&existing).await?;
            work.commit().await
        }
        .await
        .map_err(failed)?;

        tracing::info!(id, "{} updated", E::LABEL);
        Ok(existing)
    }

    /// Deletes the entity stored under `id` and returns its last state.
    #[tracing::instrument(skip(self), fields(entity = E::LABEL))]
    pub async fn delete(&self, id: i64) -> Result<E, ServiceError> {
        let existing = self.find_by_id(id).await?;

        let failed = Self::failed(ServiceAction::Deleting);
        async {
            let mut work = self.store.begin().await?;
            work.remove(&existing).await?;
            work.commit().await
        }
        .await
        .map_err(failed)?;

        tracing::info!(id, "{} deleted", E::LABEL);
        Ok(existing)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Orders
// ─────────────────────────────────────────────────────────────────────────────

/// Order service: the generic CRUD contract plus owner-scoped listings.
pub struct OrderService<S: Store> {
    crud: CrudService<Order, S>,
}

impl<S: Store> Clone for OrderService<S> {
    fn clone(&self) -> Self {
        Self {
            crud: self.crud.clone(),
        }
    }
}

impl<S: Store> std::ops::Deref for OrderService<S> {
    type Target = CrudService<Order, S>;

    fn deref(&self) -> &Self::Target {
        &self.crud
    }
}

impl<S: Store> OrderService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            crud: CrudService::new(store),
        }
    }

    /// Lists every order owned by a user.
    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<Order>, ServiceError> {
        self.crud
            .list_by(&Filter::new().eq("UserId", user_id))
            .await
    }

    /// Lists the orders of a user that are in the given status.
    pub async fn list_by_user_and_status(
        &self,
        user_id: i64,
        order_status_id: i64,
    ) -> Result<Vec<Order>, ServiceError> {
        self.crud
            .list_by(
                &Filter::new()
                    .eq("UserId", user_id)
                    .eq("OrderStatusId", order_status_id),
            )
            .await
    }
}
