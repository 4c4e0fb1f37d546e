//! # Washi Types
//!
//! Domain types, schema descriptors and port traits for the laundry service.
//! This crate has ZERO external IO dependencies - only data structures,
//! schema rules, and trait definitions.
//!
//! ## Architecture
//!
//! This crate represents the **innermost core** of the hexagonal architecture:
//! - `domain/` - Pure domain entities (User, Order, Currency, ...)
//! - `schema/` - Schema descriptors and the snake_case naming convention
//! - `entity` - The `Entity` trait tying a domain type to its descriptor
//! - `ports/` - Trait definitions that adapters must implement
//! - `dto` - Inbound `Save*Resource` shapes for API boundaries
//! - `error` - Domain, repository and service error types

pub mod domain;
pub mod dto;
pub mod entity;
pub mod error;
pub mod ports;
pub mod schema;

// Re-export commonly used types
pub use domain::{
    Country, CountryCurrency, Currency, Department, LaundryServiceMaterial, Material, Order,
    OrderStatus, PaymentMethod, Promotion, Service, Subscription, User, UserProfile,
    UserSubscription,
};
pub use dto::*;
pub use entity::{Entity, Record, Value};
pub use error::{
    DomainError, ModelError, OperationResponse, RepoError, ServiceAction, ServiceError,
};
pub use ports::{Filter, Store, UnitOfWork};
pub use schema::{Model, laundry_model, to_snake_case};
