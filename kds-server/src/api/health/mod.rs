//! Health check routes
//!
//! | Path | Method | Description |
//! |------|--------|-------------|
//! | /health | GET | Liveness plus pipeline statistics |

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::core::ServerState;
use crate::utils::{AppError, AppResult};

pub fn router() -> Router<ServerState> {
    Router::new().route("/health", get(health))
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    /// Store epoch (changes when the database is replaced)
    epoch: String,
    current_sequence: u64,
    event_count: u64,
    active_ticket_count: u64,
}

async fn health(State(state): State<ServerState>) -> AppResult<Json<HealthResponse>> {
    let stats = state
        .manager
        .get_stats()
        .map_err(|e| AppError::database(e.to_string()))?;

    Ok(Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        epoch: state.manager.epoch().to_string(),
        current_sequence: stats.current_sequence,
        event_count: stats.event_count,
        active_ticket_count: stats.active_ticket_count,
    }))
}
