//! Command response and sync types

use super::event::KitchenEvent;
use super::snapshot::TicketSnapshot;
use serde::{Deserialize, Serialize};

/// Item input for OpenTicket / AddItems
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemInput {
    pub product_id: String,
    pub product_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variation: Option<String>,
    pub quantity: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extras: Vec<String>,
}

/// Command processing response
///
/// Every response that touches an existing order carries the authoritative
/// ticket, so a terminal can reconcile its view no matter what happened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    /// Command ID this response is for
    pub command_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    /// Authoritative ticket state after processing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket: Option<TicketSnapshot>,
    /// Set when a precondition (expected_station_id) no longer held:
    /// success-equivalent, no state changed, `ticket` is authoritative
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub stale: bool,
    /// Set when the command was already processed (idempotent retry)
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub duplicate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CommandError>,
    /// Non-fatal condition the caller should surface (e.g. the pipeline had
    /// no dispatch station to route to)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<CommandError>,
}

impl CommandResponse {
    pub fn success(command_id: String, ticket: TicketSnapshot) -> Self {
        Self {
            command_id,
            success: true,
            order_id: Some(ticket.order_id.clone()),
            ticket: Some(ticket),
            stale: false,
            duplicate: false,
            error: None,
            warning: None,
        }
    }

    pub fn with_warning(mut self, warning: CommandError) -> Self {
        self.warning = Some(warning);
        self
    }

    /// Precondition mismatch: nothing changed, here is the current state
    pub fn stale(command_id: String, ticket: TicketSnapshot) -> Self {
        Self {
            command_id,
            success: true,
            order_id: Some(ticket.order_id.clone()),
            ticket: Some(ticket),
            stale: true,
            duplicate: false,
            error: None,
            warning: Some(CommandError::new(
                CommandErrorCode::StaleTransition,
                "State changed since the terminal last synced; no transition applied",
            )),
        }
    }

    /// Command already processed (idempotent retry)
    pub fn duplicate(command_id: String, ticket: Option<TicketSnapshot>) -> Self {
        Self {
            command_id,
            success: true,
            order_id: ticket.as_ref().map(|t| t.order_id.clone()),
            ticket,
            stale: false,
            duplicate: true,
            error: None,
            warning: None,
        }
    }

    pub fn error(command_id: String, error: CommandError) -> Self {
        Self {
            command_id,
            success: false,
            order_id: None,
            ticket: None,
            stale: false,
            duplicate: false,
            error: Some(error),
            warning: None,
        }
    }

    /// Failed command, but the order exists: attach its current state
    pub fn error_with_ticket(
        command_id: String,
        error: CommandError,
        ticket: TicketSnapshot,
    ) -> Self {
        Self {
            command_id,
            success: false,
            order_id: Some(ticket.order_id.clone()),
            ticket: Some(ticket),
            stale: false,
            duplicate: false,
            error: Some(error),
            warning: None,
        }
    }
}

/// Command error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandError {
    pub code: CommandErrorCode,
    pub message: String,
    /// Offending item ids, when the error is about specific items
    /// (e.g. NOT_READY lists the unserved items blocking finalize)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<String>,
}

impl CommandError {
    pub fn new(code: CommandErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            items: Vec::new(),
        }
    }

    pub fn with_items(mut self, items: Vec<String>) -> Self {
        self.items = items;
        self
    }
}

/// Command error codes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandErrorCode {
    // Business rules
    OrderNotFound,
    ItemNotFound,
    OrderAlreadyFinalized,
    OrderCancelled,
    /// Finalize refused: unserved items remain
    NotReady,
    /// Precondition station mismatch (reported as stale, not failure)
    StaleTransition,
    /// Pipeline shape problem, e.g. no active station after the current one
    InvalidConfiguration,
    /// Operation not applicable to the item's position, e.g. skip at dispatch
    InvalidOperation,

    // System
    InternalError,
    StorageFull,
    StorageCorrupted,
    SystemBusy,
}

/// Incremental sync request: replay everything after `since_sequence`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncRequest {
    #[serde(default)]
    pub since_sequence: u64,
}

/// Sync response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncResponse {
    /// Events after `since_sequence`, ordered by sequence
    pub events: Vec<KitchenEvent>,
    /// Full snapshots of currently open tickets
    pub active_tickets: Vec<TicketSnapshot>,
    /// Server's current global sequence
    pub server_sequence: u64,
    /// Store epoch; clients holding a different epoch must resync from zero
    pub epoch: String,
    /// Set when `since_sequence` is ahead of the server or from another
    /// epoch: the client must drop local state and take the snapshots
    pub requires_full_sync: bool,
}
