//! ItemCancelled event applier
//!
//! Cancellation is terminal and detaches the item from the pipeline: a
//! cancelled item has no current station, so it can never show up in a
//! station queue or block routing.

use crate::pipeline::appliers::stamp;
use crate::pipeline::traits::EventApplier;
use shared::kitchen::{EventPayload, ItemStatus, KitchenEvent, TicketSnapshot};

pub struct ItemCancelledApplier;

impl EventApplier for ItemCancelledApplier {
    fn apply(&self, snapshot: &mut TicketSnapshot, event: &KitchenEvent) {
        if let EventPayload::ItemCancelled { item_id, .. } = &event.payload {
            if let Some(item) = snapshot.item_mut(item_id) {
                item.status = ItemStatus::Cancelled;
                item.station_id = None;
                item.station_is_dispatch = false;
                item.station_entered_at = None;
            }
            stamp(snapshot, event);
        }
    }
}
