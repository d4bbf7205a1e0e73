//! Kitchen API handlers

use std::convert::Infallible;

use axum::{
    Json,
    extract::{Path, Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::Stream;
use serde::Deserialize;
use tokio::sync::broadcast;

use crate::board::{self, BoardItem, BoardView};
use crate::core::ServerState;
use crate::utils::{AppError, AppResult};
use shared::kitchen::{
    CommandResponse, KitchenCommand, KitchenEvent, StationLogEntry, SyncResponse, TicketSnapshot,
};

#[derive(Debug, Deserialize)]
pub struct BoardQuery {
    pub tenant_id: String,
    /// Optional per-request SLA threshold overrides (minutes)
    pub warn_minutes: Option<i64>,
    pub late_minutes: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SyncQuery {
    pub tenant_id: String,
    #[serde(default)]
    pub since_sequence: u64,
}

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub tenant_id: String,
    /// Restrict the feed to events touching one station
    pub station_id: Option<String>,
}

/// POST /api/kitchen/commands - submit a workflow command
///
/// Always answers 200 with a `CommandResponse` envelope: rejections,
/// stale no-ops, and duplicates are protocol outcomes, not HTTP errors.
pub async fn submit_command(
    State(state): State<ServerState>,
    Json(command): Json<KitchenCommand>,
) -> AppResult<Json<CommandResponse>> {
    if command.command_id.is_empty() || command.tenant_id.is_empty() {
        return Err(AppError::validation("command_id and tenant_id are required"));
    }
    Ok(Json(state.manager.process_command(command).await))
}

/// GET /api/kitchen/board?tenant_id=
pub async fn board(
    State(state): State<ServerState>,
    Query(query): Query<BoardQuery>,
) -> AppResult<Json<BoardView>> {
    let tickets = state
        .manager
        .get_active_tickets(Some(&query.tenant_id))
        .map_err(|e| AppError::database(e.to_string()))?;
    let stations = state.manager.registry().active_sorted(&query.tenant_id);

    let mut thresholds = state.config.sla_thresholds();
    if let Some(warn) = query.warn_minutes {
        thresholds.warn_minutes = warn;
    }
    if let Some(late) = query.late_minutes {
        thresholds.late_minutes = late;
    }

    Ok(Json(board::build_board(
        &tickets,
        &stations,
        &thresholds,
        chrono::Utc::now().timestamp_millis(),
    )))
}

/// GET /api/kitchen/stations/:id/queue
pub async fn station_queue(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<BoardItem>>> {
    let station = state
        .manager
        .registry()
        .get(&id)
        .ok_or_else(|| AppError::not_found(format!("Station {} not found", id)))?;
    let tickets = state
        .manager
        .get_active_tickets(Some(&station.tenant_id))
        .map_err(|e| AppError::database(e.to_string()))?;

    Ok(Json(board::station_queue(
        &tickets,
        &station.id,
        &state.config.sla_thresholds(),
        chrono::Utc::now().timestamp_millis(),
    )))
}

/// GET /api/kitchen/dispatch/:id - ready-to-serve queue
pub async fn dispatch_queue(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<BoardItem>>> {
    let station = state
        .manager
        .registry()
        .get(&id)
        .ok_or_else(|| AppError::not_found(format!("Station {} not found", id)))?;
    if !station.is_dispatch() {
        return Err(AppError::validation(format!(
            "Station {} is not a dispatch station",
            id
        )));
    }
    let tickets = state
        .manager
        .get_active_tickets(Some(&station.tenant_id))
        .map_err(|e| AppError::database(e.to_string()))?;

    Ok(Json(board::dispatch_queue(
        &tickets,
        &station.id,
        &state.config.sla_thresholds(),
        chrono::Utc::now().timestamp_millis(),
    )))
}

/// GET /api/kitchen/tickets/:order_id
pub async fn ticket(
    State(state): State<ServerState>,
    Path(order_id): Path<String>,
) -> AppResult<Json<TicketSnapshot>> {
    let ticket = state
        .manager
        .get_ticket(&order_id)
        .map_err(|e| AppError::database(e.to_string()))?
        .ok_or_else(|| AppError::not_found(format!("Order {} not found", order_id)))?;
    Ok(Json(ticket))
}

/// GET /api/kitchen/tickets/:order_id/events - audit trail
pub async fn ticket_events(
    State(state): State<ServerState>,
    Path(order_id): Path<String>,
) -> AppResult<Json<Vec<KitchenEvent>>> {
    let events = state
        .manager
        .get_events_for_order(&order_id)
        .map_err(|e| AppError::database(e.to_string()))?;
    if events.is_empty() {
        return Err(AppError::not_found(format!("Order {} not found", order_id)));
    }
    Ok(Json(events))
}

/// GET /api/kitchen/items/:item_id/log - station trace
pub async fn item_log(
    State(state): State<ServerState>,
    Path(item_id): Path<String>,
) -> AppResult<Json<Vec<StationLogEntry>>> {
    let log = state
        .manager
        .get_item_log(&item_id)
        .map_err(|e| AppError::database(e.to_string()))?;
    Ok(Json(log))
}

/// GET /api/kitchen/sync?tenant_id=&since_sequence=
pub async fn sync(
    State(state): State<ServerState>,
    Query(query): Query<SyncQuery>,
) -> AppResult<Json<SyncResponse>> {
    let response = state
        .manager
        .sync_since(&query.tenant_id, query.since_sequence)
        .map_err(|e| AppError::database(e.to_string()))?;
    Ok(Json(response))
}

/// GET /api/kitchen/feed?tenant_id=&station_id= - SSE event feed
///
/// Events that touch no station (lifecycle events) always pass a
/// station-scoped filter; a station screen still needs to drop a ticket
/// when its order is cancelled.
pub async fn feed(
    State(state): State<ServerState>,
    Query(query): Query<FeedQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.feed.subscribe(&query.tenant_id);

    let stream = futures::stream::unfold(
        (rx, query.station_id),
        |(mut rx, station_id)| async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        if let Some(wanted) = &station_id {
                            let touched = event.stations_touched();
                            if !touched.is_empty() && !touched.contains(&wanted.as_str()) {
                                continue;
                            }
                        }
                        match Event::default()
                            .event(event.event_type.to_string())
                            .json_data(event.as_ref())
                        {
                            Ok(sse_event) => return Some((Ok(sse_event), (rx, station_id))),
                            Err(e) => {
                                tracing::error!("Failed to serialize feed event: {}", e);
                                continue;
                            }
                        }
                    }
                    // A lagged subscriber has holes in its stream; tell it
                    // to recover through /sync
                    Err(broadcast::error::RecvError::Lagged(_)) => {
                        return Some((Ok(Event::default().event("resync").data("")), (rx, station_id)));
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        },
    );

    Sse::new(stream).keep_alive(KeepAlive::default())
}
