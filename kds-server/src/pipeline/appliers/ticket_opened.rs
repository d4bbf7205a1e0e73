//! TicketOpened event applier

use crate::pipeline::appliers::stamp;
use crate::pipeline::traits::EventApplier;
use shared::kitchen::{EventPayload, KitchenEvent, TicketSnapshot};

pub struct TicketOpenedApplier;

impl EventApplier for TicketOpenedApplier {
    fn apply(&self, snapshot: &mut TicketSnapshot, event: &KitchenEvent) {
        if let EventPayload::TicketOpened {
            order_kind,
            seating,
            customer,
            note,
            is_draft,
        } = &event.payload
        {
            snapshot.order_kind = order_kind.clone();
            snapshot.seating = seating.clone();
            snapshot.customer = customer.clone();
            snapshot.note = note.clone();
            snapshot.is_draft = *is_draft;
            snapshot.created_at = event.timestamp;
            stamp(snapshot, event);
        }
    }
}
