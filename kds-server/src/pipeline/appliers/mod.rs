//! Event applier implementations
//!
//! Each applier folds one event type into a ticket snapshot. Appliers are
//! pure state transitions: replaying the same events always rebuilds the
//! same snapshot, which is what sync recovery and rebuild rely on.

use enum_dispatch::enum_dispatch;

use crate::pipeline::traits::EventApplier;
use shared::kitchen::{EventPayload, KitchenEvent, TicketSnapshot};

mod draft_submitted;
mod item_advanced;
mod item_cancelled;
mod item_ready;
mod item_served;
mod item_started;
mod items_queued;
mod station_skipped;
mod ticket_cancelled;
mod ticket_finalized;
mod ticket_opened;

pub use draft_submitted::DraftSubmittedApplier;
pub use item_advanced::ItemAdvancedApplier;
pub use item_cancelled::ItemCancelledApplier;
pub use item_ready::ItemReadyApplier;
pub use item_served::ItemServedApplier;
pub use item_started::ItemStartedApplier;
pub use items_queued::ItemsQueuedApplier;
pub use station_skipped::StationSkippedApplier;
pub use ticket_cancelled::TicketCancelledApplier;
pub use ticket_finalized::TicketFinalizedApplier;
pub use ticket_opened::TicketOpenedApplier;

/// EventAction enum - dispatches to concrete applier implementations
#[enum_dispatch(EventApplier)]
pub enum EventAction {
    TicketOpened(TicketOpenedApplier),
    ItemsQueued(ItemsQueuedApplier),
    DraftSubmitted(DraftSubmittedApplier),
    ItemStarted(ItemStartedApplier),
    ItemAdvanced(ItemAdvancedApplier),
    StationSkipped(StationSkippedApplier),
    ItemReady(ItemReadyApplier),
    ItemServed(ItemServedApplier),
    ItemCancelled(ItemCancelledApplier),
    TicketFinalized(TicketFinalizedApplier),
    TicketCancelled(TicketCancelledApplier),
}

/// Convert KitchenEvent to EventAction
impl From<&KitchenEvent> for EventAction {
    fn from(event: &KitchenEvent) -> Self {
        match &event.payload {
            EventPayload::TicketOpened { .. } => EventAction::TicketOpened(TicketOpenedApplier),
            EventPayload::ItemsQueued { .. } => EventAction::ItemsQueued(ItemsQueuedApplier),
            EventPayload::DraftSubmitted { .. } => {
                EventAction::DraftSubmitted(DraftSubmittedApplier)
            }
            EventPayload::ItemStarted { .. } => EventAction::ItemStarted(ItemStartedApplier),
            EventPayload::ItemAdvanced { .. } => EventAction::ItemAdvanced(ItemAdvancedApplier),
            EventPayload::StationSkipped { .. } => {
                EventAction::StationSkipped(StationSkippedApplier)
            }
            EventPayload::ItemReady { .. } => EventAction::ItemReady(ItemReadyApplier),
            EventPayload::ItemServed { .. } => EventAction::ItemServed(ItemServedApplier),
            EventPayload::ItemCancelled { .. } => EventAction::ItemCancelled(ItemCancelledApplier),
            EventPayload::TicketFinalized { .. } => {
                EventAction::TicketFinalized(TicketFinalizedApplier)
            }
            EventPayload::TicketCancelled { .. } => {
                EventAction::TicketCancelled(TicketCancelledApplier)
            }
        }
    }
}

/// Common tail of every applier: bump bookkeeping and re-derive the
/// ticket status from the items
pub(crate) fn stamp(snapshot: &mut TicketSnapshot, event: &KitchenEvent) {
    snapshot.last_sequence = event.sequence;
    snapshot.updated_at = event.timestamp;
    snapshot.recompute_status(event.timestamp);
}
