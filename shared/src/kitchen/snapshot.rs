//! Ticket snapshot - computed state from the event stream
//!
//! Ticket status is never stored as an independently-mutable field: it is
//! re-derived from the items after every applied event, except for the two
//! explicit terminal transitions (`Delivered` via FinalizeTicket and
//! `Cancelled` via CancelTicket).

use serde::{Deserialize, Serialize};

/// Ticket (order-level) status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    /// No item has entered a station yet (e.g. a draft being built)
    #[default]
    Pending,
    /// At least one non-cancelled item is still producing
    Preparing,
    /// Every non-cancelled item is done at a dispatch station (or served)
    Ready,
    /// Explicit finalize - never inferred from items
    Delivered,
    Cancelled,
}

/// Item-level lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    #[default]
    Pending,
    Preparing,
    Ready,
    Delivered,
    Cancelled,
}

/// In-station progress
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemProgress {
    #[default]
    Queued,
    InProgress,
    Done,
}

/// One line of an order, tracked independently through the pipeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TicketItem {
    pub item_id: String,
    pub product_id: String,
    pub product_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variation: Option<String>,
    pub quantity: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extras: Vec<String>,
    pub status: ItemStatus,
    /// Current station; None only before pipeline assignment (draft)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub station_id: Option<String>,
    /// Whether the current station is a dispatch station - recorded at
    /// routing time so status derivation stays a pure function of the items
    #[serde(default)]
    pub station_is_dispatch: bool,
    pub progress: ItemProgress,
    /// When the item entered its current station (Unix ms)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub station_entered_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub served_at: Option<i64>,
    pub created_at: i64,
}

impl TicketItem {
    pub fn is_cancelled(&self) -> bool {
        self.status == ItemStatus::Cancelled
    }

    /// Terminal items accept no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, ItemStatus::Delivered | ItemStatus::Cancelled)
    }

    pub fn is_served(&self) -> bool {
        self.served_at.is_some()
    }

    /// Done at a dispatch station and not yet handed out
    pub fn is_ready_to_serve(&self) -> bool {
        !self.is_cancelled()
            && self.station_id.is_some()
            && self.station_is_dispatch
            && self.progress == ItemProgress::Done
            && self.served_at.is_none()
    }

    /// Re-derive the lifecycle status from station/progress fields.
    /// Terminal statuses are sticky.
    pub fn refresh_status(&mut self) {
        if self.is_terminal() {
            return;
        }
        self.status = if self.is_served() {
            ItemStatus::Delivered
        } else if self.station_id.is_none() {
            ItemStatus::Pending
        } else if self.station_is_dispatch && self.progress == ItemProgress::Done {
            ItemStatus::Ready
        } else {
            ItemStatus::Preparing
        };
    }
}

/// Ticket snapshot - computed from the event stream
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TicketSnapshot {
    pub order_id: String,
    pub tenant_id: String,
    pub status: TicketStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seating: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default)]
    pub is_draft: bool,
    pub items: Vec<TicketItem>,
    /// When the ticket last became ready (for SLA display)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ready_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    /// Last applied event sequence (for incremental terminal updates)
    pub last_sequence: u64,
}

impl TicketSnapshot {
    pub fn new(order_id: String, tenant_id: String) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            order_id,
            tenant_id,
            status: TicketStatus::Pending,
            order_kind: None,
            seating: None,
            customer: None,
            note: None,
            is_draft: false,
            items: Vec::new(),
            ready_at: None,
            delivered_at: None,
            created_at: now,
            updated_at: now,
            last_sequence: 0,
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.status, TicketStatus::Delivered | TicketStatus::Cancelled)
    }

    pub fn item(&self, item_id: &str) -> Option<&TicketItem> {
        self.items.iter().find(|i| i.item_id == item_id)
    }

    pub fn item_mut(&mut self, item_id: &str) -> Option<&mut TicketItem> {
        self.items.iter_mut().find(|i| i.item_id == item_id)
    }

    /// Non-cancelled items
    pub fn active_items(&self) -> impl Iterator<Item = &TicketItem> {
        self.items.iter().filter(|i| !i.is_cancelled())
    }

    /// Items blocking FinalizeTicket: non-cancelled and not yet served
    pub fn unserved_items(&self) -> impl Iterator<Item = &TicketItem> {
        self.active_items().filter(|i| !i.is_served())
    }

    /// Re-derive ticket status from the items (least-advanced wins).
    /// `now_ms` stamps `ready_at` when the ticket first becomes ready.
    pub fn recompute_status(&mut self, now_ms: i64) {
        if !self.is_open() {
            return;
        }
        let next = derive_status(self.status, &self.items);
        if next == TicketStatus::Ready && self.status != TicketStatus::Ready {
            self.ready_at = Some(now_ms);
        }
        self.status = next;
    }
}

/// Derive order status as a pure function of the non-cancelled items.
///
/// Tie-break: the order reflects the *least* advanced non-cancelled item -
/// production outranks ready, which outranks pending-assignment. This favors
/// under- rather than over-reporting completion. Returns `current` unchanged
/// when there is nothing to derive from (all items cancelled, or none):
/// closure of such orders is the collaborator's call, not the engine's.
pub fn derive_status(current: TicketStatus, items: &[TicketItem]) -> TicketStatus {
    if matches!(current, TicketStatus::Delivered | TicketStatus::Cancelled) {
        return current;
    }
    let active: Vec<&TicketItem> = items.iter().filter(|i| !i.is_cancelled()).collect();
    if active.is_empty() {
        return current;
    }
    if !active
        .iter()
        .any(|i| i.station_id.is_some() || i.is_served())
    {
        return TicketStatus::Pending;
    }
    let all_done = active
        .iter()
        .all(|i| i.is_served() || i.is_ready_to_serve());
    if all_done {
        TicketStatus::Ready
    } else {
        TicketStatus::Preparing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, station: Option<&str>, dispatch: bool, progress: ItemProgress) -> TicketItem {
        let mut item = TicketItem {
            item_id: id.to_string(),
            product_id: "product-1".to_string(),
            product_name: "Test Product".to_string(),
            variation: None,
            quantity: 1,
            note: None,
            extras: vec![],
            status: ItemStatus::Pending,
            station_id: station.map(|s| s.to_string()),
            station_is_dispatch: dispatch,
            progress,
            station_entered_at: station.map(|_| 1_000),
            served_at: None,
            created_at: 1_000,
        };
        item.refresh_status();
        item
    }

    #[test]
    fn test_no_items_leaves_status_unchanged() {
        assert_eq!(derive_status(TicketStatus::Preparing, &[]), TicketStatus::Preparing);
    }

    #[test]
    fn test_all_cancelled_leaves_status_unchanged() {
        let mut cancelled = item("i1", Some("s1"), false, ItemProgress::Queued);
        cancelled.status = ItemStatus::Cancelled;
        assert_eq!(
            derive_status(TicketStatus::Preparing, &[cancelled]),
            TicketStatus::Preparing
        );
    }

    #[test]
    fn test_unassigned_items_are_pending() {
        let items = vec![item("i1", None, false, ItemProgress::Queued)];
        assert_eq!(derive_status(TicketStatus::Pending, &items), TicketStatus::Pending);
    }

    #[test]
    fn test_production_item_means_preparing() {
        let items = vec![item("i1", Some("prep"), false, ItemProgress::Queued)];
        assert_eq!(derive_status(TicketStatus::Pending, &items), TicketStatus::Preparing);
    }

    #[test]
    fn test_least_advanced_wins() {
        // One item ready at dispatch, one still queued in production:
        // production outranks ready
        let items = vec![
            item("i1", Some("pass"), true, ItemProgress::Done),
            item("i2", Some("grill"), false, ItemProgress::Queued),
        ];
        assert_eq!(derive_status(TicketStatus::Preparing, &items), TicketStatus::Preparing);
    }

    #[test]
    fn test_queued_at_dispatch_is_not_ready() {
        let items = vec![item("i1", Some("pass"), true, ItemProgress::Queued)];
        assert_eq!(derive_status(TicketStatus::Preparing, &items), TicketStatus::Preparing);
    }

    #[test]
    fn test_all_done_at_dispatch_means_ready() {
        let items = vec![
            item("i1", Some("pass"), true, ItemProgress::Done),
            item("i2", Some("pass"), true, ItemProgress::Done),
        ];
        assert_eq!(derive_status(TicketStatus::Preparing, &items), TicketStatus::Ready);
    }

    #[test]
    fn test_cancelled_items_are_excluded() {
        let mut cancelled = item("i2", Some("grill"), false, ItemProgress::Queued);
        cancelled.status = ItemStatus::Cancelled;
        let items = vec![item("i1", Some("pass"), true, ItemProgress::Done), cancelled];
        assert_eq!(derive_status(TicketStatus::Preparing, &items), TicketStatus::Ready);
    }

    #[test]
    fn test_delivered_is_never_inferred() {
        let mut served = item("i1", Some("pass"), true, ItemProgress::Done);
        served.served_at = Some(2_000);
        served.refresh_status();
        // All items served, but the order stays Ready until FinalizeTicket
        assert_eq!(derive_status(TicketStatus::Ready, &[served]), TicketStatus::Ready);
    }

    #[test]
    fn test_terminal_status_is_sticky() {
        let items = vec![item("i1", Some("grill"), false, ItemProgress::Queued)];
        assert_eq!(derive_status(TicketStatus::Delivered, &items), TicketStatus::Delivered);
        assert_eq!(derive_status(TicketStatus::Cancelled, &items), TicketStatus::Cancelled);
    }

    #[test]
    fn test_unserved_items_skips_cancelled_and_served() {
        let mut ticket = TicketSnapshot::new("o1".to_string(), "t1".to_string());
        let mut served = item("served", Some("pass"), true, ItemProgress::Done);
        served.served_at = Some(2_000);
        served.refresh_status();
        let mut cancelled = item("cancelled", Some("grill"), false, ItemProgress::Queued);
        cancelled.status = ItemStatus::Cancelled;
        ticket.items = vec![
            served,
            cancelled,
            item("blocking", Some("grill"), false, ItemProgress::Queued),
        ];

        let blocking: Vec<String> = ticket
            .unserved_items()
            .map(|i| i.item_id.clone())
            .collect();
        assert_eq!(blocking, vec!["blocking".to_string()]);
    }

    #[test]
    fn test_recompute_stamps_ready_at_once() {
        let mut ticket = TicketSnapshot::new("o1".to_string(), "t1".to_string());
        ticket.items.push(item("i1", Some("pass"), true, ItemProgress::Done));
        ticket.recompute_status(5_000);
        assert_eq!(ticket.status, TicketStatus::Ready);
        assert_eq!(ticket.ready_at, Some(5_000));

        // Already ready: a later recompute must not move the stamp
        ticket.recompute_status(9_000);
        assert_eq!(ticket.ready_at, Some(5_000));
    }

    #[test]
    fn test_item_ready_to_serve() {
        let ready = item("i1", Some("pass"), true, ItemProgress::Done);
        assert!(ready.is_ready_to_serve());
        assert_eq!(ready.status, ItemStatus::Ready);

        let mut served = ready.clone();
        served.served_at = Some(2_000);
        assert!(!served.is_ready_to_serve());

        let producing = item("i2", Some("grill"), false, ItemProgress::Done);
        assert!(!producing.is_ready_to_serve());
    }
}
