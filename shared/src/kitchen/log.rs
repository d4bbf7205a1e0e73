//! Station log - append-only per-item trace of station visits
//!
//! Derived from events at commit time and kept queryable on its own so a
//! terminal can show "where has this item been" without replaying the
//! event stream.

use serde::{Deserialize, Serialize};

/// What happened to the item at the station
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogAction {
    /// Item was queued at the station
    Entered,
    /// Item's work at the station was completed
    Completed,
    /// Item was routed past the station without completing it
    Skipped,
}

/// One station visit record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationLogEntry {
    /// Monotonic per-store id, assigned at append time
    pub id: u64,
    pub item_id: String,
    pub order_id: String,
    pub station_id: String,
    pub action: LogAction,
    pub operator_id: String,
    pub operator_name: String,
    /// Server timestamp (Unix milliseconds)
    pub created_at: i64,
}
