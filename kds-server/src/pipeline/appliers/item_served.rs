//! ItemServed event applier

use crate::pipeline::appliers::stamp;
use crate::pipeline::traits::EventApplier;
use shared::kitchen::{EventPayload, KitchenEvent, TicketSnapshot};

pub struct ItemServedApplier;

impl EventApplier for ItemServedApplier {
    fn apply(&self, snapshot: &mut TicketSnapshot, event: &KitchenEvent) {
        if let EventPayload::ItemServed { item_id, .. } = &event.payload {
            if let Some(item) = snapshot.item_mut(item_id) {
                item.served_at = Some(event.timestamp);
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
    use shared::kitchen::{ItemProgress, ItemStatus, KitchenEventType, TicketItem, TicketStatus};

    #[test]
    fn test_serving_marks_item_delivered_but_not_the_ticket() {
        let mut snapshot = TicketSnapshot::new("order-1".to_string(), "t1".to_string());
        let mut item = TicketItem {
            item_id: "i1".to_string(),
            product_id: "p1".to_string(),
            product_name: "Burger".to_string(),
            variation: None,
            quantity: 1,
            note: None,
            extras: vec![],
            status: ItemStatus::Pending,
            station_id: Some("pass".to_string()),
            station_is_dispatch: true,
            progress: ItemProgress::Done,
            station_entered_at: Some(1_000),
            served_at: None,
            created_at: 1_000,
        };
        item.refresh_status();
        snapshot.items = vec![item];
        snapshot.recompute_status(1_000);

        let event = event(
            7,
            KitchenEventType::ItemServed,
            EventPayload::ItemServed {
                item_id: "i1".to_string(),
                station_id: "pass".to_string(),
            },
        );
        ItemServedApplier.apply(&mut snapshot, &event);

        let item = snapshot.item("i1").unwrap();
        assert_eq!(item.status, ItemStatus::Delivered);
        assert_eq!(item.served_at, Some(event.timestamp));
        // The ticket closes only on an explicit FinalizeTicket
        assert_eq!(snapshot.status, TicketStatus::Ready);
    }
}
