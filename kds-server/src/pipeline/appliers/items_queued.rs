//! ItemsQueued event applier
//!
//! The payload carries complete item snapshots with stations already
//! assigned, so applying is a plain append.

use crate::pipeline::appliers::stamp;
use crate::pipeline::traits::EventApplier;
use shared::kitchen::{EventPayload, KitchenEvent, TicketSnapshot};

pub struct ItemsQueuedApplier;

impl EventApplier for ItemsQueuedApplier {
    fn apply(&self, snapshot: &mut TicketSnapshot, event: &KitchenEvent) {
        if let EventPayload::ItemsQueued { items } = &event.payload {
            snapshot.items.extend(items.iter().cloned());
            stamp(snapshot, event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::appliers::testing::event;
    use shared::kitchen::{
        ItemProgress, ItemStatus, KitchenEventType, TicketItem, TicketStatus,
    };

    #[test]
    fn test_queued_items_move_ticket_to_preparing() {
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
            station_id: Some("grill".to_string()),
            station_is_dispatch: false,
            progress: ItemProgress::Queued,
            station_entered_at: Some(1_000),
            served_at: None,
            created_at: 1_000,
        };
        item.refresh_status();
        let event = event(
            3,
            KitchenEventType::ItemsQueued,
            EventPayload::ItemsQueued { items: vec![item] },
        );

        ItemsQueuedApplier.apply(&mut snapshot, &event);

        assert_eq!(snapshot.items.len(), 1);
        assert_eq!(snapshot.status, TicketStatus::Preparing);
        assert_eq!(snapshot.last_sequence, 3);
    }
}
