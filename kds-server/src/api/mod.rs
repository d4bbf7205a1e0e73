//! API routes
//!
//! # Structure
//!
//! - [`health`] - liveness and pipeline statistics
//! - [`stations`] - station configuration CRUD
//! - [`kitchen`] - commands, board views, sync, and the event feed

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::ServerState;

pub mod health;
pub mod kitchen;
pub mod stations;

// Re-export common types for handlers
pub use crate::utils::{AppResponse, AppResult};

/// Assemble the full application router
pub fn router(state: ServerState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(stations::router())
        .merge(kitchen::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
