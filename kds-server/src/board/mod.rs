//! Board views - what the kitchen screens render
//!
//! Pure projections over open ticket snapshots: per-station work queues,
//! the dispatch pickup queue, and a front-of-house ticket overview. Every
//! row carries an SLA color so screens can highlight aging work without
//! any client-side clock logic.

use serde::Serialize;

use shared::kitchen::sla::{classify, minutes_between, SlaColor, SlaThresholds};
use shared::kitchen::{ItemProgress, TicketSnapshot, TicketStatus};
use shared::models::Station;

/// One item row on a station screen
#[derive(Debug, Clone, Serialize)]
pub struct BoardItem {
    pub order_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seating: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_kind: Option<String>,
    pub item_id: String,
    pub product_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variation: Option<String>,
    pub quantity: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extras: Vec<String>,
    pub progress: ItemProgress,
    /// Minutes the item has been sitting at its current station
    pub minutes_in_station: i64,
    pub sla: SlaColor,
}

/// One station column of the kitchen board
#[derive(Debug, Clone, Serialize)]
pub struct StationColumn {
    pub station: Station,
    pub items: Vec<BoardItem>,
}

/// Ticket-level overview row
#[derive(Debug, Clone, Serialize)]
pub struct TicketCard {
    pub order_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seating: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,
    pub status: TicketStatus,
    pub is_draft: bool,
    pub item_count: usize,
    pub served_count: usize,
    /// Minutes since the ticket was opened, or since it last became
    /// ready; becoming ready restarts the clock for the pickup wait
    pub minutes_open: i64,
    pub sla: SlaColor,
}

/// Full board payload
#[derive(Debug, Clone, Serialize)]
pub struct BoardView {
    pub columns: Vec<StationColumn>,
    pub tickets: Vec<TicketCard>,
}

/// Items currently queued at a station, oldest first
///
/// Cancelled and served items disappear; an item held done at a production
/// station stays visible (it has nowhere to go until the pipeline is
/// fixed or it is advanced onward).
pub fn station_queue(
    tickets: &[TicketSnapshot],
    station_id: &str,
    thresholds: &SlaThresholds,
    now_ms: i64,
) -> Vec<BoardItem> {
    let mut items: Vec<BoardItem> = tickets
        .iter()
        .flat_map(|ticket| {
            ticket
                .items
                .iter()
                .filter(|item| {
                    !item.is_terminal()
                        && !item.is_served()
                        && item.station_id.as_deref() == Some(station_id)
                })
                .map(|item| {
                    let since = item.station_entered_at.unwrap_or(item.created_at);
                    let minutes = minutes_between(since, now_ms);
                    BoardItem {
                        order_id: ticket.order_id.clone(),
                        seating: ticket.seating.clone(),
                        order_kind: ticket.order_kind.clone(),
                        item_id: item.item_id.clone(),
                        product_name: item.product_name.clone(),
                        variation: item.variation.clone(),
                        quantity: item.quantity,
                        note: item.note.clone(),
                        extras: item.extras.clone(),
                        progress: item.progress,
                        minutes_in_station: minutes,
                        sla: classify(minutes, thresholds),
                    }
                })
        })
        .collect();

    items.sort_by_key(|item| std::cmp::Reverse(item.minutes_in_station));
    items
}

/// Ready-to-serve items at a dispatch station, oldest first
pub fn dispatch_queue(
    tickets: &[TicketSnapshot],
    station_id: &str,
    thresholds: &SlaThresholds,
    now_ms: i64,
) -> Vec<BoardItem> {
    let mut items = station_queue(tickets, station_id, thresholds, now_ms);
    items.retain(|item| item.progress == ItemProgress::Done);
    items
}

/// Build the full board for a tenant
pub fn build_board(
    tickets: &[TicketSnapshot],
    active_stations: &[Station],
    thresholds: &SlaThresholds,
    now_ms: i64,
) -> BoardView {
    let columns = active_stations
        .iter()
        .map(|station| StationColumn {
            station: station.clone(),
            items: station_queue(tickets, &station.id, thresholds, now_ms),
        })
        .collect();

    let mut tickets: Vec<TicketCard> = tickets
        .iter()
        .map(|ticket| {
            let since = ticket.ready_at.unwrap_or(ticket.created_at);
            let minutes = minutes_between(since, now_ms);
            TicketCard {
                order_id: ticket.order_id.clone(),
                seating: ticket.seating.clone(),
                customer: ticket.customer.clone(),
                status: ticket.status,
                is_draft: ticket.is_draft,
                item_count: ticket.active_items().count(),
                served_count: ticket.active_items().filter(|i| i.is_served()).count(),
                minutes_open: minutes,
                sla: classify(minutes, thresholds),
            }
        })
        .collect();
    tickets.sort_by_key(|card| std::cmp::Reverse(card.minutes_open));

    BoardView { columns, tickets }
}
