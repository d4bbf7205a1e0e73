//! Kitchen commands - requests from terminals to mutate pipeline state

use super::types::ItemInput;
use serde::{Deserialize, Serialize};

/// Kitchen command envelope
///
/// `command_id` is the idempotency key: a terminal that retries a request
/// after a transport failure reuses the same id, and the server applies it
/// at most once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KitchenCommand {
    /// Client-generated unique id (idempotency key)
    pub command_id: String,
    /// Tenant this command belongs to
    pub tenant_id: String,
    /// Operator who issued the command
    pub operator_id: String,
    /// Operator name (snapshot for audit)
    pub operator_name: String,
    /// Client timestamp (Unix milliseconds) - audit only, never authoritative
    pub timestamp: i64,
    /// Command payload
    pub payload: KitchenCommandPayload,
}

impl KitchenCommand {
    pub fn new(
        tenant_id: String,
        operator_id: String,
        operator_name: String,
        payload: KitchenCommandPayload,
    ) -> Self {
        Self {
            command_id: uuid::Uuid::new_v4().to_string(),
            tenant_id,
            operator_id,
            operator_name,
            timestamp: chrono::Utc::now().timestamp_millis(),
            payload,
        }
    }
}

impl KitchenCommandPayload {
    /// The order this command targets, when it targets an existing one
    pub fn order_id(&self) -> Option<&str> {
        match self {
            KitchenCommandPayload::OpenTicket { order_id, .. } => order_id.as_deref(),
            KitchenCommandPayload::AddItems { order_id, .. }
            | KitchenCommandPayload::SubmitDraft { order_id }
            | KitchenCommandPayload::StartItem { order_id, .. }
            | KitchenCommandPayload::AdvanceItem { order_id, .. }
            | KitchenCommandPayload::SkipStation { order_id, .. }
            | KitchenCommandPayload::ServeItem { order_id, .. }
            | KitchenCommandPayload::CancelItem { order_id, .. }
            | KitchenCommandPayload::FinalizeTicket { order_id }
            | KitchenCommandPayload::CancelTicket { order_id, .. } => Some(order_id),
        }
    }
}

/// Command payload variants
///
/// `AdvanceItem` and `SkipStation` carry the precondition
/// `expected_station_id`: if the item's actual current station no longer
/// matches, the call is a success-equivalent no-op returning the
/// authoritative ticket, which is what makes concurrent double-clicks from
/// two terminals safe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KitchenCommandPayload {
    /// Open a ticket for an order supplied by the order-entry collaborator.
    /// Items are assigned the tenant's first active station unless the
    /// ticket is a draft.
    OpenTicket {
        /// Caller-supplied order id; generated when absent
        #[serde(skip_serializing_if = "Option::is_none")]
        order_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        order_kind: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        seating: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        customer: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        note: Option<String>,
        #[serde(default)]
        is_draft: bool,
        items: Vec<ItemInput>,
    },

    /// Append items to an existing ticket
    AddItems {
        order_id: String,
        items: Vec<ItemInput>,
    },

    /// Commit a draft: assign every pending item its first station
    SubmitDraft { order_id: String },

    /// Optional cosmetic queued -> in_progress signal
    StartItem {
        order_id: String,
        item_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        expected_station_id: Option<String>,
    },

    /// Complete the item at its current production station and re-queue it
    /// at the next active station (one atomic step)
    AdvanceItem {
        order_id: String,
        item_id: String,
        expected_station_id: String,
    },

    /// Route past the current station without completing it
    SkipStation {
        order_id: String,
        item_id: String,
        expected_station_id: String,
    },

    /// Hand a dispatch-station item to the customer
    ServeItem { order_id: String, item_id: String },

    /// Cancel a single item (terminal transition)
    CancelItem {
        order_id: String,
        item_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// Close the order once every non-cancelled item is served
    FinalizeTicket { order_id: String },

    /// Cancel the whole ticket (terminal transition)
    CancelTicket {
        order_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}
