//! Kitchen events - immutable facts recorded after command processing

use super::snapshot::TicketItem;
use serde::{Deserialize, Serialize};

/// Kitchen event - immutable audit record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KitchenEvent {
    /// Event unique ID
    pub event_id: String,
    /// Global sequence number (for ordering and replay)
    /// This is the AUTHORITATIVE ordering mechanism for state evolution
    pub sequence: u64,
    /// Order this event belongs to
    pub order_id: String,
    /// Tenant the order belongs to (feed routing key)
    pub tenant_id: String,
    /// Server timestamp (Unix milliseconds) - AUTHORITATIVE for state evolution
    pub timestamp: i64,
    /// Client timestamp (Unix milliseconds) - for audit and debugging
    /// Preserved from the original command, may differ due to clock skew
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_timestamp: Option<i64>,
    /// Operator who triggered this event
    pub operator_id: String,
    /// Operator name (snapshot for audit)
    pub operator_name: String,
    /// Command that triggered this event (for audit tracing)
    pub command_id: String,
    /// Event type
    pub event_type: KitchenEventType,
    /// Event payload
    pub payload: EventPayload,
}

/// Event type enumeration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KitchenEventType {
    // Lifecycle
    TicketOpened,
    TicketFinalized,
    TicketCancelled,

    // Items
    ItemsQueued,
    DraftSubmitted,
    ItemStarted,
    ItemAdvanced,
    StationSkipped,
    ItemReady,
    ItemServed,
    ItemCancelled,
}

impl std::fmt::Display for KitchenEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KitchenEventType::TicketOpened => write!(f, "TICKET_OPENED"),
            KitchenEventType::TicketFinalized => write!(f, "TICKET_FINALIZED"),
            KitchenEventType::TicketCancelled => write!(f, "TICKET_CANCELLED"),
            KitchenEventType::ItemsQueued => write!(f, "ITEMS_QUEUED"),
            KitchenEventType::DraftSubmitted => write!(f, "DRAFT_SUBMITTED"),
            KitchenEventType::ItemStarted => write!(f, "ITEM_STARTED"),
            KitchenEventType::ItemAdvanced => write!(f, "ITEM_ADVANCED"),
            KitchenEventType::StationSkipped => write!(f, "STATION_SKIPPED"),
            KitchenEventType::ItemReady => write!(f, "ITEM_READY"),
            KitchenEventType::ItemServed => write!(f, "ITEM_SERVED"),
            KitchenEventType::ItemCancelled => write!(f, "ITEM_CANCELLED"),
        }
    }
}

/// Event payload variants
///
/// Payloads carry everything an applier needs: appliers are pure functions
/// and never consult the live station registry (routing was resolved at
/// command time, against the then-current active set).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventPayload {
    // ========== Lifecycle ==========
    TicketOpened {
        #[serde(skip_serializing_if = "Option::is_none")]
        order_kind: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        seating: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        customer: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        note: Option<String>,
        is_draft: bool,
    },

    TicketFinalized {},

    TicketCancelled {
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    // ========== Items ==========
    /// Complete snapshots of queued items, station already assigned
    /// (or None when the ticket is still a draft)
    ItemsQueued { items: Vec<TicketItem> },

    /// Draft committed: all pending items enter the first active station
    DraftSubmitted {
        station_id: String,
        #[serde(default)]
        station_is_dispatch: bool,
        item_ids: Vec<String>,
    },

    ItemStarted {
        item_id: String,
        station_id: String,
    },

    /// done@from and queued@to as a single atomic fact.
    /// `to_station_id = None` records the misconfiguration case: no next
    /// active station existed, the item is held done at `from_station_id`.
    ItemAdvanced {
        item_id: String,
        from_station_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        to_station_id: Option<String>,
        #[serde(default)]
        to_is_dispatch: bool,
    },

    /// Routed past `from_station_id` without completing it - the item
    /// effectively never visited that station for dispatch purposes
    StationSkipped {
        item_id: String,
        from_station_id: String,
        to_station_id: String,
        #[serde(default)]
        to_is_dispatch: bool,
    },

    /// Item marked done at its dispatch station (ready to serve)
    ItemReady {
        item_id: String,
        station_id: String,
    },

    ItemServed {
        item_id: String,
        station_id: String,
    },

    ItemCancelled {
        item_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

impl KitchenEvent {
    /// Create a new event; the server timestamp is always set here and is
    /// authoritative
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sequence: u64,
        order_id: String,
        tenant_id: String,
        operator_id: String,
        operator_name: String,
        command_id: String,
        client_timestamp: Option<i64>,
        event_type: KitchenEventType,
        payload: EventPayload,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            sequence,
            order_id,
            tenant_id,
            timestamp: chrono::Utc::now().timestamp_millis(),
            client_timestamp,
            operator_id,
            operator_name,
            command_id,
            event_type,
            payload,
        }
    }

    /// Station ids this event touches (source and destination), used for
    /// station-scoped feed subscriptions
    pub fn stations_touched(&self) -> Vec<&str> {
        match &self.payload {
            EventPayload::ItemsQueued { items } => items
                .iter()
                .filter_map(|i| i.station_id.as_deref())
                .collect(),
            EventPayload::DraftSubmitted { station_id, .. } => vec![station_id],
            EventPayload::ItemStarted { station_id, .. } => vec![station_id],
            EventPayload::ItemAdvanced {
                from_station_id,
                to_station_id,
                ..
            } => {
                let mut out = vec![from_station_id.as_str()];
                if let Some(to) = to_station_id {
                    out.push(to);
                }
                out
            }
            EventPayload::StationSkipped {
                from_station_id,
                to_station_id,
                ..
            } => vec![from_station_id, to_station_id],
            EventPayload::ItemReady { station_id, .. } => vec![station_id],
            EventPayload::ItemServed { station_id, .. } => vec![station_id],
            _ => vec![],
        }
    }
}
