//! SLA classification - elapsed-time urgency for board display
//!
//! Pure presentation metadata: SLA colors never gate transitions and are
//! computed at read time, so they are always current without any timer
//! machinery.

use serde::{Deserialize, Serialize};

/// Urgency color
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlaColor {
    Green,
    Yellow,
    Red,
}

/// Per-tenant thresholds, in whole minutes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SlaThresholds {
    /// At or past this many minutes the item turns yellow
    pub warn_minutes: i64,
    /// At or past this many minutes the item turns red
    pub late_minutes: i64,
}

impl Default for SlaThresholds {
    fn default() -> Self {
        Self {
            warn_minutes: 10,
            late_minutes: 20,
        }
    }
}

/// Classify an elapsed duration. Boundaries are half-open: green strictly
/// below `warn_minutes`, yellow from `warn_minutes` up to but excluding
/// `late_minutes`, red from `late_minutes`.
pub fn classify(elapsed_minutes: i64, thresholds: &SlaThresholds) -> SlaColor {
    if elapsed_minutes >= thresholds.late_minutes {
        SlaColor::Red
    } else if elapsed_minutes >= thresholds.warn_minutes {
        SlaColor::Yellow
    } else {
        SlaColor::Green
    }
}

/// Whole minutes between two Unix-millisecond timestamps, truncated.
/// Clock skew can make `now_ms` lag the stored stamp; clamp to zero so a
/// fresh item never classifies as late through i64 wraparound.
pub fn minutes_between(start_ms: i64, now_ms: i64) -> i64 {
    ((now_ms - start_ms).max(0)) / 60_000
}
