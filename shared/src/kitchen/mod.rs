//! Kitchen Fulfillment Types
//!
//! This module provides the types for the kitchen order fulfillment
//! pipeline:
//! - Commands: requests from terminals to move items through the pipeline
//! - Events: immutable facts recorded after command processing
//! - Snapshots: computed ticket state from the event stream
//! - Station log: append-only per-item audit records
//! - SLA: elapsed-time urgency classification for board display

pub mod command;
pub mod event;
pub mod log;
pub mod sla;
pub mod snapshot;
pub mod types;

// Re-exports
pub use command::{KitchenCommand, KitchenCommandPayload};
pub use event::{EventPayload, KitchenEvent, KitchenEventType};
pub use log::{LogAction, StationLogEntry};
pub use sla::{SlaColor, SlaThresholds, classify, minutes_between};
pub use snapshot::{ItemProgress, ItemStatus, TicketItem, TicketSnapshot, TicketStatus};
pub use types::{
    CommandError, CommandErrorCode, CommandResponse, ItemInput, SyncRequest, SyncResponse,
};
