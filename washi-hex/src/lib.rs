//! # Washi Hex
//!
//! Application service layer and HTTP adapter for the laundry service.
//!
//! ## Architecture
//!
//! - `service` - CRUD services (orchestrate store operations)
//! - `inbound/` - HTTP adapter (Axum server)
//!
//! The services are generic over `S: Store`, allowing different store
//! implementations to be injected.

pub mod inbound;
pub mod service;

#[cfg(test)]
mod service_tests;

pub use service::{CrudService, OrderService};
