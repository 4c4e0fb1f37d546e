//! HTTP Inbound Adapter
//!
//! Axum-based HTTP server that drives the CRUD services.

mod handlers;
mod server;

pub use handlers::{ApiError, ApiJson, ApiPath, ApiQuery, AppState};
pub use server::HttpServer;
