//! Command and event processing traits
//!
//! - [`CommandHandler`] - one implementation per command, produces events
//! - [`EventApplier`] - one implementation per event, mutates snapshots
//! - [`CommandContext`] - transactional snapshot access for handlers
//!
//! Handlers validate against current state and emit events; they never
//! mutate snapshots themselves. Appliers are pure: the same event stream
//! always rebuilds the same snapshot.

use super::storage::{PipelineStorage, StorageError};
// enum_dispatch generates the EventAction trait impl at this trait's
// definition site; the applier variant types must be in scope here.
use crate::pipeline::appliers::*;
use async_trait::async_trait;
use enum_dispatch::enum_dispatch;
use redb::WriteTransaction;
use shared::kitchen::{CommandError, KitchenEvent, TicketSnapshot};
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised while validating or executing a command
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Order already finalized: {0}")]
    OrderAlreadyFinalized(String),

    #[error("Order cancelled: {0}")]
    OrderCancelled(String),

    /// Finalize refused: some items are not yet served
    #[error("Order {order_id} is not ready: {} unserved item(s)", items.len())]
    NotReady { order_id: String, items: Vec<String> },

    /// The expected-station precondition no longer holds. The manager
    /// converts this into a success-equivalent stale response, never a
    /// failure.
    #[error("Stale transition on order {order_id}")]
    Stale { order_id: String },

    /// Pipeline shape problem (e.g. no active station to route to)
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<StorageError> for PipelineError {
    fn from(e: StorageError) -> Self {
        PipelineError::Storage(e.to_string())
    }
}

/// Command metadata passed to every handler
#[derive(Debug, Clone)]
pub struct CommandMetadata {
    pub command_id: String,
    pub tenant_id: String,
    pub operator_id: String,
    pub operator_name: String,
    /// Client timestamp (audit only)
    pub timestamp: i64,
}

/// What a handler produced: events to commit, plus an optional non-fatal
/// warning to surface alongside the success response
#[derive(Debug, Default)]
pub struct ActionOutcome {
    pub events: Vec<KitchenEvent>,
    pub warning: Option<CommandError>,
}

impl ActionOutcome {
    pub fn with_warning(events: Vec<KitchenEvent>, warning: CommandError) -> Self {
        Self {
            events,
            warning: Some(warning),
        }
    }
}

impl From<Vec<KitchenEvent>> for ActionOutcome {
    fn from(events: Vec<KitchenEvent>) -> Self {
        Self {
            events,
            warning: None,
        }
    }
}

/// Command handler trait - one implementation per command type
#[async_trait]
pub trait CommandHandler {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<ActionOutcome, PipelineError>;
}

/// Event applier trait - one implementation per event type
///
/// Appliers mutate the snapshot and nothing else. They never consult the
/// station registry: everything they need is in the event payload.
#[enum_dispatch]
pub trait EventApplier {
    fn apply(&self, snapshot: &mut TicketSnapshot, event: &KitchenEvent);
}

/// Transactional context handed to command handlers
///
/// Caches loaded snapshots so one command sees its own writes, and tracks
/// sequence allocation for the events it produces.
pub struct CommandContext<'a> {
    txn: &'a WriteTransaction,
    storage: &'a PipelineStorage,
    next_sequence: u64,
    snapshots: HashMap<String, TicketSnapshot>,
}

impl<'a> CommandContext<'a> {
    pub fn new(txn: &'a WriteTransaction, storage: &'a PipelineStorage, current_sequence: u64) -> Self {
        Self {
            txn,
            storage,
            next_sequence: current_sequence + 1,
            snapshots: HashMap::new(),
        }
    }

    /// Allocate the next event sequence number
    pub fn next_sequence(&mut self) -> u64 {
        let seq = self.next_sequence;
        self.next_sequence += 1;
        seq
    }

    /// Load a ticket snapshot, preferring snapshots already modified in
    /// this command
    pub fn load_snapshot(&mut self, order_id: &str) -> Result<TicketSnapshot, PipelineError> {
        if let Some(snapshot) = self.snapshots.get(order_id) {
            return Ok(snapshot.clone());
        }
        self.storage
            .get_ticket_txn(self.txn, order_id)?
            .ok_or_else(|| PipelineError::OrderNotFound(order_id.to_string()))
    }

    /// Check whether an order already exists
    pub fn order_exists(&mut self, order_id: &str) -> Result<bool, PipelineError> {
        if self.snapshots.contains_key(order_id) {
            return Ok(true);
        }
        Ok(self.storage.get_ticket_txn(self.txn, order_id)?.is_some())
    }

    /// Stage an updated snapshot for persistence
    pub fn save_snapshot(&mut self, snapshot: TicketSnapshot) {
        self.snapshots.insert(snapshot.order_id.clone(), snapshot);
    }

    /// Snapshots modified during this command
    pub fn modified_snapshots(&self) -> impl Iterator<Item = &TicketSnapshot> {
        self.snapshots.values()
    }
}
