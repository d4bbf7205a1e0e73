//! Station API handlers
//!
//! Stations are configuration, not workflow: there is no DELETE. A station
//! that is no longer staffed is deactivated through PUT, which makes it
//! invisible to routing while historical events keep resolving its id.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::core::ServerState;
use crate::stations::RegistryError;
use crate::utils::{AppError, AppResult};
use shared::models::{Station, StationCreate, StationUpdate};

#[derive(Debug, Deserialize)]
pub struct TenantQuery {
    pub tenant_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SetActiveBody {
    pub is_active: bool,
}

fn registry_error(e: RegistryError) -> AppError {
    match e {
        RegistryError::NotFound(id) => AppError::not_found(format!("Station {} not found", id)),
        RegistryError::SortConflict(sort) => AppError::Conflict(format!(
            "Sort order {} is already taken by an active station",
            sort
        )),
        RegistryError::Storage(e) => AppError::database(e.to_string()),
    }
}

/// GET /api/stations?tenant_id= - full station set, pipeline order
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<TenantQuery>,
) -> AppResult<Json<Vec<Station>>> {
    Ok(Json(state.manager.registry().all_for_tenant(&query.tenant_id)))
}

/// GET /api/stations/:id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Station>> {
    let station = state
        .manager
        .registry()
        .get(&id)
        .ok_or_else(|| AppError::not_found(format!("Station {} not found", id)))?;
    Ok(Json(station))
}

/// POST /api/stations
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<StationCreate>,
) -> AppResult<Json<Station>> {
    if payload.tenant_id.is_empty() || payload.name.is_empty() {
        return Err(AppError::validation("tenant_id and name are required"));
    }
    let station = state
        .manager
        .registry()
        .create(payload)
        .map_err(registry_error)?;
    Ok(Json(station))
}

/// PUT /api/stations/:id/active - activate or deactivate in place
///
/// Reactivation fails with a conflict when another active station has
/// taken the sort position in the meantime.
pub async fn set_active(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(body): Json<SetActiveBody>,
) -> AppResult<Json<Station>> {
    let station = state
        .manager
        .registry()
        .update(
            &id,
            StationUpdate {
                is_active: Some(body.is_active),
                ..Default::default()
            },
        )
        .map_err(registry_error)?;
    Ok(Json(station))
}

/// PUT /api/stations/:id
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<StationUpdate>,
) -> AppResult<Json<Station>> {
    let station = state
        .manager
        .registry()
        .update(&id, payload)
        .map_err(registry_error)?;
    Ok(Json(station))
}
