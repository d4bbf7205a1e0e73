//! redb-based storage layer for kitchen event sourcing
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `events` | `(order_id, sequence)` | `KitchenEvent` | Event stream (append-only) |
//! | `tickets` | `order_id` | `TicketSnapshot` | Snapshot cache |
//! | `active_tickets` | `order_id` | `tenant_id` | Open ticket index |
//! | `processed_commands` | `command_id` | `()` | Idempotency check |
//! | `counters` | name | `u64` | Global sequence and log id |
//! | `stations` | `station_id` | `Station` | Station configuration |
//! | `station_log` | `(item_id, entry_id)` | `StationLogEntry` | Per-item station trace |
//!
//! # Durability
//!
//! redb commits with `Durability::Immediate`: a committed command survives
//! power loss, which is what lets terminals treat a `CommandResponse` as
//! final. Snapshots are persisted after every event; they can always be
//! rebuilt from the event stream.

use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
    WriteTransaction,
};
use shared::kitchen::{KitchenEvent, StationLogEntry, TicketSnapshot};
use shared::models::Station;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Event stream: key = (order_id, sequence), value = JSON-serialized KitchenEvent
const EVENTS_TABLE: TableDefinition<(&str, u64), &[u8]> = TableDefinition::new("events");

/// Ticket snapshots: key = order_id
const TICKETS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("tickets");

/// Open ticket index: key = order_id, value = tenant_id
const ACTIVE_TICKETS_TABLE: TableDefinition<&str, &str> = TableDefinition::new("active_tickets");

/// Processed command ids: existence check for idempotency
const PROCESSED_COMMANDS_TABLE: TableDefinition<&str, ()> =
    TableDefinition::new("processed_commands");

/// Monotonic counters: key = "seq" or "log_id"
const COUNTERS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("counters");

/// Station configuration: key = station_id, value = JSON-serialized Station
const STATIONS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("stations");

/// Station log: key = (item_id, entry_id), value = JSON-serialized StationLogEntry
const STATION_LOG_TABLE: TableDefinition<(&str, u64), &[u8]> = TableDefinition::new("station_log");

const SEQUENCE_KEY: &str = "seq";
const LOG_ID_KEY: &str = "log_id";

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Ticket not found: {0}")]
    TicketNotFound(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Pipeline storage backed by redb
#[derive(Clone)]
pub struct PipelineStorage {
    db: Arc<Database>,
}

impl PipelineStorage {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init_tables(db)
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init_tables(db)
    }

    fn init_tables(db: Database) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(EVENTS_TABLE)?;
            let _ = write_txn.open_table(TICKETS_TABLE)?;
            let _ = write_txn.open_table(ACTIVE_TICKETS_TABLE)?;
            let _ = write_txn.open_table(PROCESSED_COMMANDS_TABLE)?;
            let _ = write_txn.open_table(STATIONS_TABLE)?;
            let _ = write_txn.open_table(STATION_LOG_TABLE)?;

            let mut counters = write_txn.open_table(COUNTERS_TABLE)?;
            if counters.get(SEQUENCE_KEY)?.is_none() {
                counters.insert(SEQUENCE_KEY, 0u64)?;
            }
            if counters.get(LOG_ID_KEY)?.is_none() {
                counters.insert(LOG_ID_KEY, 0u64)?;
            }
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Counters ==========

    /// Get current global sequence (read-only)
    pub fn get_current_sequence(&self) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(COUNTERS_TABLE)?;
        Ok(table
            .get(SEQUENCE_KEY)?
            .map(|guard| guard.value())
            .unwrap_or(0))
    }

    /// Set the global sequence (within transaction)
    ///
    /// Actions allocate sequences upfront; the manager writes back the
    /// highest allocated value before commit.
    pub fn set_sequence(&self, txn: &WriteTransaction, sequence: u64) -> StorageResult<()> {
        let mut table = txn.open_table(COUNTERS_TABLE)?;
        table.insert(SEQUENCE_KEY, sequence)?;
        Ok(())
    }

    /// Allocate the next station-log entry id (within transaction)
    pub fn next_log_id(&self, txn: &WriteTransaction) -> StorageResult<u64> {
        let mut table = txn.open_table(COUNTERS_TABLE)?;
        let current = table.get(LOG_ID_KEY)?.map(|g| g.value()).unwrap_or(0);
        let next = current + 1;
        table.insert(LOG_ID_KEY, next)?;
        Ok(next)
    }

    // ========== Command Idempotency ==========

    /// Check if a command has been processed
    pub fn is_command_processed(&self, command_id: &str) -> StorageResult<bool> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        Ok(table.get(command_id)?.is_some())
    }

    /// Check if a command has been processed (within transaction)
    pub fn is_command_processed_txn(
        &self,
        txn: &WriteTransaction,
        command_id: &str,
    ) -> StorageResult<bool> {
        let table = txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        Ok(table.get(command_id)?.is_some())
    }

    /// Mark a command as processed
    pub fn mark_command_processed(
        &self,
        txn: &WriteTransaction,
        command_id: &str,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        table.insert(command_id, ())?;
        Ok(())
    }

    // ========== Event Operations ==========

    /// Store an event
    pub fn store_event(&self, txn: &WriteTransaction, event: &KitchenEvent) -> StorageResult<()> {
        let mut table = txn.open_table(EVENTS_TABLE)?;
        let key = (event.order_id.as_str(), event.sequence);
        let value = serde_json::to_vec(event)?;
        table.insert(key, value.as_slice())?;
        Ok(())
    }

    /// Get all events for an order, ordered by sequence
    pub fn get_events_for_order(&self, order_id: &str) -> StorageResult<Vec<KitchenEvent>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(EVENTS_TABLE)?;

        let mut events = Vec::new();
        let range_start = (order_id, 0u64);
        let range_end = (order_id, u64::MAX);

        for result in table.range(range_start..=range_end)? {
            let (_key, value) = result?;
            let event: KitchenEvent = serde_json::from_slice(value.value())?;
            events.push(event);
        }

        events.sort_by_key(|e| e.sequence);
        Ok(events)
    }

    /// Get events since a given sequence (across all orders)
    pub fn get_events_since(&self, since_sequence: u64) -> StorageResult<Vec<KitchenEvent>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(EVENTS_TABLE)?;

        let mut events = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let event: KitchenEvent = serde_json::from_slice(value.value())?;
            if event.sequence > since_sequence {
                events.push(event);
            }
        }

        events.sort_by_key(|e| e.sequence);
        Ok(events)
    }

    // ========== Ticket Snapshots ==========

    /// Store a ticket snapshot
    pub fn store_ticket(
        &self,
        txn: &WriteTransaction,
        snapshot: &TicketSnapshot,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(TICKETS_TABLE)?;
        let value = serde_json::to_vec(snapshot)?;
        table.insert(snapshot.order_id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Get a ticket snapshot by order id
    pub fn get_ticket(&self, order_id: &str) -> StorageResult<Option<TicketSnapshot>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TICKETS_TABLE)?;

        match table.get(order_id)? {
            Some(value) => {
                let snapshot: TicketSnapshot = serde_json::from_slice(value.value())?;
                Ok(Some(snapshot))
            }
            None => Ok(None),
        }
    }

    /// Get a ticket snapshot by order id (within transaction)
    pub fn get_ticket_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Option<TicketSnapshot>> {
        let table = txn.open_table(TICKETS_TABLE)?;

        match table.get(order_id)? {
            Some(value) => {
                let snapshot: TicketSnapshot = serde_json::from_slice(value.value())?;
                Ok(Some(snapshot))
            }
            None => Ok(None),
        }
    }

    // ========== Open Ticket Index ==========

    /// Index a ticket as open for its tenant
    pub fn mark_ticket_active(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
        tenant_id: &str,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(ACTIVE_TICKETS_TABLE)?;
        table.insert(order_id, tenant_id)?;
        Ok(())
    }

    /// Remove a ticket from the open index
    pub fn mark_ticket_inactive(&self, txn: &WriteTransaction, order_id: &str) -> StorageResult<()> {
        let mut table = txn.open_table(ACTIVE_TICKETS_TABLE)?;
        table.remove(order_id)?;
        Ok(())
    }

    /// Get open ticket ids, optionally restricted to one tenant
    pub fn get_active_ticket_ids(&self, tenant_id: Option<&str>) -> StorageResult<Vec<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ACTIVE_TICKETS_TABLE)?;

        let mut order_ids: Vec<String> = Vec::new();
        for result in table.iter()? {
            let (key, value) = result?;
            if tenant_id.is_none_or(|t| t == value.value()) {
                order_ids.push(key.value().to_string());
            }
        }

        Ok(order_ids)
    }

    /// Get all open ticket snapshots, optionally restricted to one tenant
    pub fn get_active_tickets(&self, tenant_id: Option<&str>) -> StorageResult<Vec<TicketSnapshot>> {
        let active_ids = self.get_active_ticket_ids(tenant_id)?;
        let mut snapshots = Vec::new();

        for order_id in active_ids {
            if let Some(snapshot) = self.get_ticket(&order_id)? {
                snapshots.push(snapshot);
            }
        }

        Ok(snapshots)
    }

    // ========== Stations ==========

    /// Insert or replace a station (own transaction)
    pub fn put_station(&self, station: &Station) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(STATIONS_TABLE)?;
            let value = serde_json::to_vec(station)?;
            table.insert(station.id.as_str(), value.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Get a station by id
    pub fn get_station(&self, station_id: &str) -> StorageResult<Option<Station>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(STATIONS_TABLE)?;

        match table.get(station_id)? {
            Some(value) => {
                let station: Station = serde_json::from_slice(value.value())?;
                Ok(Some(station))
            }
            None => Ok(None),
        }
    }

    /// Load the full station set (for registry warm-up at startup)
    pub fn get_all_stations(&self) -> StorageResult<Vec<Station>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(STATIONS_TABLE)?;

        let mut stations = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let station: Station = serde_json::from_slice(value.value())?;
            stations.push(station);
        }

        Ok(stations)
    }

    // ========== Station Log ==========

    /// Append a station log entry (within transaction)
    pub fn append_log(&self, txn: &WriteTransaction, entry: &StationLogEntry) -> StorageResult<()> {
        let mut table = txn.open_table(STATION_LOG_TABLE)?;
        let key = (entry.item_id.as_str(), entry.id);
        let value = serde_json::to_vec(entry)?;
        table.insert(key, value.as_slice())?;
        Ok(())
    }

    /// Get the station log for an item, in append order
    pub fn get_log_for_item(&self, item_id: &str) -> StorageResult<Vec<StationLogEntry>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(STATION_LOG_TABLE)?;

        let mut entries = Vec::new();
        let range_start = (item_id, 0u64);
        let range_end = (item_id, u64::MAX);

        for result in table.range(range_start..=range_end)? {
            let (_key, value) = result?;
            let entry: StationLogEntry = serde_json::from_slice(value.value())?;
            entries.push(entry);
        }

        entries.sort_by_key(|e| e.id);
        Ok(entries)
    }

    // ========== Statistics ==========

    /// Get storage statistics
    pub fn get_stats(&self) -> StorageResult<StorageStats> {
        let read_txn = self.db.begin_read()?;

        let events_table = read_txn.open_table(EVENTS_TABLE)?;
        let tickets_table = read_txn.open_table(TICKETS_TABLE)?;
        let active_table = read_txn.open_table(ACTIVE_TICKETS_TABLE)?;
        let commands_table = read_txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        let counters = read_txn.open_table(COUNTERS_TABLE)?;

        Ok(StorageStats {
            event_count: events_table.len()?,
            ticket_count: tickets_table.len()?,
            active_ticket_count: active_table.len()?,
            processed_command_count: commands_table.len()?,
            current_sequence: counters
                .get(SEQUENCE_KEY)?
                .map(|guard| guard.value())
                .unwrap_or(0),
        })
    }
}

/// Storage statistics
#[derive(Debug, Clone)]
pub struct StorageStats {
    pub event_count: u64,
    pub ticket_count: u64,
    pub active_ticket_count: u64,
    pub processed_command_count: u64,
    pub current_sequence: u64,
}
