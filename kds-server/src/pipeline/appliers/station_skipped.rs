//! StationSkipped event applier

use crate::pipeline::appliers::stamp;
use crate::pipeline::traits::EventApplier;
use shared::kitchen::{EventPayload, ItemProgress, KitchenEvent, TicketSnapshot};

pub struct StationSkippedApplier;

impl EventApplier for StationSkippedApplier {
    fn apply(&self, snapshot: &mut TicketSnapshot, event: &KitchenEvent) {
        if let EventPayload::StationSkipped {
            item_id,
            to_station_id,
            to_is_dispatch,
            ..
        } = &event.payload
        {
            if let Some(item) = snapshot.item_mut(item_id) {
                item.station_id = Some(to_station_id.clone());
                item.station_is_dispatch = *to_is_dispatch;
                item.progress = ItemProgress::Queued;
                item.station_entered_at = Some(event.timestamp);
                item.refresh_status();
            }
            stamp(snapshot, event);
        }
    }
}
