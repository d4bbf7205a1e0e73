//! TicketFinalized event applier

use crate::pipeline::traits::EventApplier;
use shared::kitchen::{EventPayload, KitchenEvent, TicketSnapshot, TicketStatus};

pub struct TicketFinalizedApplier;

impl EventApplier for TicketFinalizedApplier {
    fn apply(&self, snapshot: &mut TicketSnapshot, event: &KitchenEvent) {
        if let EventPayload::TicketFinalized {} = &event.payload {
            snapshot.status = TicketStatus::Delivered;
            snapshot.delivered_at = Some(event.timestamp);
            snapshot.last_sequence = event.sequence;
            snapshot.updated_at = event.timestamp;
        }
    }
}
