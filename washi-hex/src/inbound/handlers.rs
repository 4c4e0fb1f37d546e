//! HTTP request handlers.
//!
//! The CRUD handlers are generic: `E` is the entity behind a resource path
//! and `R` the `Save*Resource` body it accepts. Every response body is an
//! `OperationResponse`.

use std::sync::Arc;

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Query, Request, State},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use washi_types::{Entity, OperationResponse, SaveResource, ServiceError, Store};

use crate::{CrudService, OrderService};

/// Application state shared across handlers.
pub struct AppState<S: Store> {
    pub store: Arc<S>,
    pub orders: OrderService<S>,
}

impl<S: Store> AppState<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            orders: OrderService::new(store.clone()),
            store,
        }
    }

    /// The CRUD service for one entity type over the shared store.
    pub fn crud<E: Entity>(&self) -> CrudService<E, S> {
        CrudService::new(self.store.clone())
    }
}

/// Every failure a handler can answer with. Rendered as an
/// `OperationResponse` with `ok: false`.
#[derive(Debug)]
pub enum ApiError {
    Service(ServiceError),
    /// The request could not be read: malformed body, bad path or query.
    Rejected { status: StatusCode, message: String },
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError::Service(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Service(err) => {
                let status = match &err {
                    ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
                    ServiceError::Persistence { .. } => StatusCode::BAD_REQUEST,
                };
                (status, OperationResponse::<()>::from(Err(err)))
            }
            ApiError::Rejected { status, message } => (
                status,
                OperationResponse {
                    ok: false,
                    value: None,
                    message: Some(message),
                },
            ),
        };
        (status, Json(body)).into_response()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Extractors
// ─────────────────────────────────────────────────────────────────────────────

/// `Json` whose rejection is an `ApiError`.
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(ApiError::Rejected {
                status: rejection.status(),
                message: rejection.body_text(),
            }),
        }
    }
}

/// `Path` whose rejection is an `ApiError`.
pub struct ApiPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(ApiPath(value)),
            Err(rejection) => Err(ApiError::Rejected {
                status: rejection.status(),
                message: rejection.body_text(),
            }),
        }
    }
}

/// `Query` whose rejection is an `ApiError`.
pub struct ApiQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(ApiQuery(value)),
            Err(rejection) => Err(ApiError::Rejected {
                status: rejection.status(),
                message: rejection.body_text(),
            }),
        }
    }
}

fn ok<T: Serialize>(value: T) -> Json<OperationResponse<T>> {
    Json(Ok::<_, ServiceError>(value).into())
}

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

// ─────────────────────────────────────────────────────────────────────────────
// Generic CRUD
// ─────────────────────────────────────────────────────────────────────────────

/// List every entity of a resource.
#[tracing::instrument(skip(state), fields(entity = E::LABEL))]
pub async fn list<E: Entity, S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<impl IntoResponse, ApiError> {
    let items = state.crud::<E>().list().await?;
    Ok(ok(items))
}

/// Get one entity by id.
#[tracing::instrument(skip(state), fields(entity = E::LABEL))]
pub async fn find<E: Entity, S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let item = state.crud::<E>().find_by_id(id).await?;
    Ok(ok(item))
}

/// Save a new entity from its resource body.
#[tracing::instrument(skip(state, body), fields(entity = <R::Entity as Entity>::LABEL))]
pub async fn create<R: SaveResource, S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiJson(body): ApiJson<R>,
) -> Result<impl IntoResponse, ApiError> {
    let saved = state.crud::<R::Entity>().save(body.into_entity()).await?;
    Ok((StatusCode::CREATED, ok(saved)))
}

/// Update an entity; the resource body is read as a patch.
#[tracing::instrument(skip(state, body), fields(entity = <R::Entity as Entity>::LABEL))]
pub async fn update<R: SaveResource, S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<R>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state
        .crud::<R::Entity>()
        .update(id, body.into_entity())
        .await?;
    Ok(ok(updated))
}

/// Delete an entity and return its last state.
#[tracing::instrument(skip(state), fields(entity = E::LABEL))]
pub async fn delete<E: Entity, S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state.crud::<E>().delete(id).await?;
    Ok(ok(deleted))
}

// ─────────────────────────────────────────────────────────────────────────────
// Orders by owner
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<i64>,
}

/// List the orders of a user, optionally narrowed to one status.
#[tracing::instrument(skip(state))]
pub async fn list_user_orders<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(user_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<OrderListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let orders = match query.status {
        Some(status) => {
            state
                .orders
                .list_by_user_and_status(user_id, status)
                .await?
        }
        None => state.orders.list_by_user(user_id).await?,
    };
    Ok(ok(orders))
}
