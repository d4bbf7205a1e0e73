//! ItemReady event applier

use crate::pipeline::appliers::stamp;
use crate::pipeline::traits::EventApplier;
use shared::kitchen::{EventPayload, ItemProgress, KitchenEvent, TicketSnapshot};

pub struct ItemReadyApplier;

impl EventApplier for ItemReadyApplier {
    fn apply(&self, snapshot: &mut TicketSnapshot, event: &KitchenEvent) {
        if let EventPayload::ItemReady { item_id, .. } = &event.payload {
            if let Some(item) = snapshot.item_mut(item_id) {
                item.progress = ItemProgress::Done;
                item.refresh_status();
            }
            stamp(snapshot, event);
        }
    }
}
