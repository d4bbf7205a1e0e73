//! Shared types for the KDS (kitchen display system) suite
//!
//! Common types used by the server and the kitchen terminals: station
//! configuration records, workflow commands and events, ticket snapshots,
//! and the SLA classifier. Everything here is plain data plus pure
//! functions; the engine lives in `kds-server`.

pub mod kitchen;
pub mod models;

// Re-exports
pub use serde::{Deserialize, Serialize};

// Kitchen re-exports (for convenient access)
pub use kitchen::{KitchenCommand, KitchenEvent, TicketSnapshot};
pub use models::{Station, StationKind};
