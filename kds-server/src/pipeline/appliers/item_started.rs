//! ItemStarted event applier

use crate::pipeline::appliers::stamp;
use crate::pipeline::traits::EventApplier;
use shared::kitchen::{EventPayload, ItemProgress, KitchenEvent, TicketSnapshot};

pub struct ItemStartedApplier;

impl EventApplier for ItemStartedApplier {
    fn apply(&self, snapshot: &mut TicketSnapshot, event: &KitchenEvent) {
        if let EventPayload::ItemStarted { item_id, .. } = &event.payload {
            if let Some(item) = snapshot.item_mut(item_id) {
                item.progress = ItemProgress::InProgress;
                item.refresh_status();
            }
            stamp(snapshot, event);
        }
    }
}
