//! Station registry
//!
//! Per-tenant ordered station lists, persisted in redb and cached in
//! memory for routing lookups on the hot command path. Stations are never
//! deleted, only deactivated: historical events and station logs keep
//! referring to them by id.

use parking_lot::RwLock;
use std::collections::HashMap;
use thiserror::Error;

use crate::pipeline::storage::{PipelineStorage, StorageError};
use shared::models::{Station, StationCreate, StationUpdate};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Station not found: {0}")]
    NotFound(String),

    #[error("Sort order {0} is already taken by an active station")]
    SortConflict(i32),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Station registry with write-through cache
pub struct StationRegistry {
    storage: PipelineStorage,
    cache: RwLock<HashMap<String, Station>>,
}

impl StationRegistry {
    /// Load the full station set from storage
    pub fn load(storage: PipelineStorage) -> Result<Self, RegistryError> {
        let stations = storage.get_all_stations()?;
        let cache = stations.into_iter().map(|s| (s.id.clone(), s)).collect();
        Ok(Self {
            storage,
            cache: RwLock::new(cache),
        })
    }

    pub fn get(&self, station_id: &str) -> Option<Station> {
        self.cache.read().get(station_id).cloned()
    }

    /// All of a tenant's stations (including deactivated), sorted by
    /// position. This is what gets injected into routing commands.
    pub fn all_for_tenant(&self, tenant_id: &str) -> Vec<Station> {
        let mut stations: Vec<Station> = self
            .cache
            .read()
            .values()
            .filter(|s| s.tenant_id == tenant_id)
            .cloned()
            .collect();
        stations.sort_by_key(|s| s.sort_order);
        stations
    }

    /// Active stations in pipeline order
    pub fn active_sorted(&self, tenant_id: &str) -> Vec<Station> {
        let mut stations = self.all_for_tenant(tenant_id);
        stations.retain(|s| s.is_active);
        stations
    }

    pub fn create(&self, payload: StationCreate) -> Result<Station, RegistryError> {
        self.check_sort_conflict(&payload.tenant_id, payload.sort_order, None)?;

        let station = Station {
            id: uuid::Uuid::new_v4().to_string(),
            tenant_id: payload.tenant_id,
            name: payload.name,
            kind: payload.kind,
            subtype: payload.subtype,
            color: payload.color,
            sort_order: payload.sort_order,
            is_active: true,
        };

        self.storage.put_station(&station)?;
        self.cache
            .write()
            .insert(station.id.clone(), station.clone());
        Ok(station)
    }

    pub fn update(&self, station_id: &str, payload: StationUpdate) -> Result<Station, RegistryError> {
        let mut station = self
            .get(station_id)
            .ok_or_else(|| RegistryError::NotFound(station_id.to_string()))?;

        if let Some(name) = payload.name {
            station.name = name;
        }
        if let Some(kind) = payload.kind {
            station.kind = kind;
        }
        if let Some(subtype) = payload.subtype {
            station.subtype = Some(subtype);
        }
        if let Some(color) = payload.color {
            station.color = Some(color);
        }
        if let Some(sort_order) = payload.sort_order {
            station.sort_order = sort_order;
        }
        if let Some(is_active) = payload.is_active {
            station.is_active = is_active;
        }

        // Only active stations compete for a position
        if station.is_active {
            self.check_sort_conflict(&station.tenant_id, station.sort_order, Some(station_id))?;
        }

        self.storage.put_station(&station)?;
        self.cache
            .write()
            .insert(station.id.clone(), station.clone());
        Ok(station)
    }

    fn check_sort_conflict(
        &self,
        tenant_id: &str,
        sort_order: i32,
        exclude_id: Option<&str>,
    ) -> Result<(), RegistryError> {
        let cache = self.cache.read();
        let taken = cache.values().any(|s| {
            s.tenant_id == tenant_id
                && s.is_active
                && s.sort_order == sort_order
                && exclude_id.is_none_or(|id| s.id != id)
        });
        if taken {
            Err(RegistryError::SortConflict(sort_order))
        } else {
            Ok(())
        }
    }
}
