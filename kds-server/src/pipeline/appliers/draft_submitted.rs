//! DraftSubmitted event applier

use crate::pipeline::appliers::stamp;
use crate::pipeline::traits::EventApplier;
use shared::kitchen::{EventPayload, ItemProgress, KitchenEvent, TicketSnapshot};

pub struct DraftSubmittedApplier;

impl EventApplier for DraftSubmittedApplier {
    fn apply(&self, snapshot: &mut TicketSnapshot, event: &KitchenEvent) {
        if let EventPayload::DraftSubmitted {
            station_id,
            station_is_dispatch,
            item_ids,
        } = &event.payload
        {
            snapshot.is_draft = false;
            for item_id in item_ids {
                if let Some(item) = snapshot.item_mut(item_id) {
                    item.station_id = Some(station_id.clone());
                    item.station_is_dispatch = *station_is_dispatch;
                    item.progress = ItemProgress::Queued;
                    item.station_entered_at = Some(event.timestamp);
                    item.refresh_status();
                }
            }
            stamp(snapshot, event);
        }
    }
}
