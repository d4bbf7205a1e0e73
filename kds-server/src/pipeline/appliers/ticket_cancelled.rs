//! TicketCancelled event applier
//!
//! Only the ticket status changes. Item states stay as recorded; the
//! terminal ticket status gates all further item commands.

use crate::pipeline::traits::EventApplier;
use shared::kitchen::{EventPayload, KitchenEvent, TicketSnapshot, TicketStatus};

pub struct TicketCancelledApplier;

impl EventApplier for TicketCancelledApplier {
    fn apply(&self, snapshot: &mut TicketSnapshot, event: &KitchenEvent) {
        if let EventPayload::TicketCancelled { .. } = &event.payload {
            snapshot.status = TicketStatus::Cancelled;
            snapshot.last_sequence = event.sequence;
            snapshot.updated_at = event.timestamp;
        }
    }
}
