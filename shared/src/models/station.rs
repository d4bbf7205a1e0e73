//! Production station model
//!
//! Stations are pure configuration data: an ordered, per-tenant list that
//! defines the pipeline shape. The engine never hard-codes station names or
//! positions; all routing resolves against the live active set.

use serde::{Deserialize, Serialize};

/// Station kind - production stations do preparation work, dispatch
/// stations hold finished items awaiting pickup/serving.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StationKind {
    #[default]
    Production,
    Dispatch,
}

/// Station entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Station {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub kind: StationKind,
    /// Free-form label: "prep", "assembly", "oven", "custom", ...
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    /// Display color for terminal boards
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Position in the pipeline; unique per tenant among active stations
    pub sort_order: i32,
    pub is_active: bool,
}

impl Station {
    pub fn is_dispatch(&self) -> bool {
        self.kind == StationKind::Dispatch
    }
}

/// Create station payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationCreate {
    pub tenant_id: String,
    pub name: String,
    #[serde(default)]
    pub kind: StationKind,
    pub subtype: Option<String>,
    pub color: Option<String>,
    pub sort_order: i32,
}

/// Update station payload
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StationUpdate {
    pub name: Option<String>,
    pub kind: Option<StationKind>,
    pub subtype: Option<String>,
    pub color: Option<String>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}
