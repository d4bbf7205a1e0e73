//! Kitchen workflow API
//!
//! | Path | Method | Description |
//! |------|--------|-------------|
//! | /api/kitchen/commands | POST | Submit a workflow command |
//! | /api/kitchen/board | GET | Full board for a tenant |
//! | /api/kitchen/stations/{id}/queue | GET | One station's work queue |
//! | /api/kitchen/dispatch/{id} | GET | Ready-to-serve queue at a dispatch station |
//! | /api/kitchen/tickets/{order_id} | GET | Ticket snapshot |
//! | /api/kitchen/tickets/{order_id}/events | GET | Ticket event stream |
//! | /api/kitchen/items/{item_id}/log | GET | Per-item station trace |
//! | /api/kitchen/sync | GET | Incremental terminal catch-up |
//! | /api/kitchen/feed | GET | SSE event feed |

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/kitchen", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/commands", post(handler::submit_command))
        .route("/board", get(handler::board))
        .route("/stations/{id}/queue", get(handler::station_queue))
        .route("/dispatch/{id}", get(handler::dispatch_queue))
        .route("/tickets/{order_id}", get(handler::ticket))
        .route("/tickets/{order_id}/events", get(handler::ticket_events))
        .route("/items/{item_id}/log", get(handler::item_log))
        .route("/sync", get(handler::sync))
        .route("/feed", get(handler::feed))
}
