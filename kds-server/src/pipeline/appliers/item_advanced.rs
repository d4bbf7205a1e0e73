//! ItemAdvanced event applier
//!
//! done@from and queued@to as one atomic state change. When the payload
//! carries no destination the item is held done at its current station
//! (the pipeline ended on a production station at command time).

use crate::pipeline::appliers::stamp;
use crate::pipeline::traits::EventApplier;
use shared::kitchen::{EventPayload, ItemProgress, KitchenEvent, TicketSnapshot};

pub struct ItemAdvancedApplier;

impl EventApplier for ItemAdvancedApplier {
    fn apply(&self, snapshot: &mut TicketSnapshot, event: &KitchenEvent) {
        if let EventPayload::ItemAdvanced {
            item_id,
            to_station_id,
            to_is_dispatch,
            ..
        } = &event.payload
        {
            if let Some(item) = snapshot.item_mut(item_id) {
                match to_station_id {
                    Some(to) => {
                        item.station_id = Some(to.clone());
                        item.station_is_dispatch = *to_is_dispatch;
                        item.progress = ItemProgress::Queued;
                        item.station_entered_at = Some(event.timestamp);
                    }
                    None => {
                        item.progress = ItemProgress::Done;
                    }
                }
                item.refresh_status();
            }
            stamp(snapshot, event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::appliers::testing::event;
    use shared::kitchen::{ItemStatus, KitchenEventType, TicketItem};

    fn item_at(id: &str, station: &str) -> TicketItem {
        let mut item = TicketItem {
            item_id: id.to_string(),
            product_id: "p1".to_string(),
            product_name: "Burger".to_string(),
            variation: None,
            quantity: 1,
            note: None,
            extras: vec![],
            status: ItemStatus::Pending,
            station_id: Some(station.to_string()),
            station_is_dispatch: false,
            progress: ItemProgress::InProgress,
            station_entered_at: Some(1_000),
            served_at: None,
            created_at: 1_000,
        };
        item.refresh_status();
        item
    }

    #[test]
    fn test_advance_requeues_at_destination() {
        let mut snapshot = TicketSnapshot::new("order-1".to_string(), "t1".to_string());
        snapshot.items = vec![item_at("i1", "grill")];

        let event = event(
            4,
            KitchenEventType::ItemAdvanced,
            EventPayload::ItemAdvanced {
                item_id: "i1".to_string(),
                from_station_id: "grill".to_string(),
                to_station_id: Some("plating".to_string()),
                to_is_dispatch: false,
            },
        );
        ItemAdvancedApplier.apply(&mut snapshot, &event);

        let item = snapshot.item("i1").unwrap();
        assert_eq!(item.station_id.as_deref(), Some("plating"));
        assert_eq!(item.progress, ItemProgress::Queued);
        assert_eq!(item.station_entered_at, Some(event.timestamp));
    }

    #[test]
    fn test_advance_without_destination_holds_item_done() {
        let mut snapshot = TicketSnapshot::new("order-1".to_string(), "t1".to_string());
        snapshot.items = vec![item_at("i1", "grill")];

        let event = event(
            4,
            KitchenEventType::ItemAdvanced,
            EventPayload::ItemAdvanced {
                item_id: "i1".to_string(),
                from_station_id: "grill".to_string(),
                to_station_id: None,
                to_is_dispatch: false,
            },
        );
        ItemAdvancedApplier.apply(&mut snapshot, &event);

        let item = snapshot.item("i1").unwrap();
        assert_eq!(item.station_id.as_deref(), Some("grill"));
        assert_eq!(item.progress, ItemProgress::Done);
        // Done at a production station is not ready to serve
        assert!(!item.is_ready_to_serve());
    }
}
