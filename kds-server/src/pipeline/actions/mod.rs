//! Command action implementations
//!
//! Each action implements the `CommandHandler` trait and handles one
//! specific command type. Routing actions receive the tenant's station set
//! from the manager at dispatch time, so routing always resolves against
//! the configuration that was live when the command arrived.

use async_trait::async_trait;

use crate::pipeline::traits::{ActionOutcome, CommandContext, CommandHandler, CommandMetadata, PipelineError};
use shared::kitchen::{
    ItemInput, ItemProgress, ItemStatus, KitchenCommand, KitchenCommandPayload, TicketItem,
    TicketSnapshot, TicketStatus,
};
use shared::models::Station;

mod add_items;
mod advance_item;
mod cancel_item;
mod cancel_ticket;
mod finalize_ticket;
mod open_ticket;
mod serve_item;
mod skip_station;
mod start_item;
mod submit_draft;

pub use add_items::AddItemsAction;
pub use advance_item::AdvanceItemAction;
pub use cancel_item::CancelItemAction;
pub use cancel_ticket::CancelTicketAction;
pub use finalize_ticket::FinalizeTicketAction;
pub use open_ticket::OpenTicketAction;
pub use serve_item::ServeItemAction;
pub use skip_station::SkipStationAction;
pub use start_item::StartItemAction;
pub use submit_draft::SubmitDraftAction;

/// CommandAction enum - dispatches to concrete action implementations
pub enum CommandAction {
    OpenTicket(OpenTicketAction),
    AddItems(AddItemsAction),
    SubmitDraft(SubmitDraftAction),
    StartItem(StartItemAction),
    AdvanceItem(AdvanceItemAction),
    SkipStation(SkipStationAction),
    ServeItem(ServeItemAction),
    CancelItem(CancelItemAction),
    FinalizeTicket(FinalizeTicketAction),
    CancelTicket(CancelTicketAction),
}

/// Manual implementation of CommandHandler for CommandAction
#[async_trait]
impl CommandHandler for CommandAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<ActionOutcome, PipelineError> {
        match self {
            CommandAction::OpenTicket(action) => action.execute(ctx, metadata).await,
            CommandAction::AddItems(action) => action.execute(ctx, metadata).await,
            CommandAction::SubmitDraft(action) => action.execute(ctx, metadata).await,
            CommandAction::StartItem(action) => action.execute(ctx, metadata).await,
            CommandAction::AdvanceItem(action) => action.execute(ctx, metadata).await,
            CommandAction::SkipStation(action) => action.execute(ctx, metadata).await,
            CommandAction::ServeItem(action) => action.execute(ctx, metadata).await,
            CommandAction::CancelItem(action) => action.execute(ctx, metadata).await,
            CommandAction::FinalizeTicket(action) => action.execute(ctx, metadata).await,
            CommandAction::CancelTicket(action) => action.execute(ctx, metadata).await,
        }
    }
}

/// Convert KitchenCommand to CommandAction
///
/// Covers the commands that need no station set. Actions that route
/// between stations are built in PipelineManager::build_action instead,
/// with the tenant's station set injected; those arms are unreachable
/// here.
impl From<&KitchenCommand> for CommandAction {
    fn from(cmd: &KitchenCommand) -> Self {
        match &cmd.payload {
            KitchenCommandPayload::OpenTicket { .. }
            | KitchenCommandPayload::AddItems { .. }
            | KitchenCommandPayload::SubmitDraft { .. }
            | KitchenCommandPayload::AdvanceItem { .. }
            | KitchenCommandPayload::SkipStation { .. } => {
                unreachable!("routing commands are built by PipelineManager with stations injected")
            }
            KitchenCommandPayload::StartItem {
                order_id,
                item_id,
                expected_station_id,
            } => CommandAction::StartItem(StartItemAction {
                order_id: order_id.clone(),
                item_id: item_id.clone(),
                expected_station_id: expected_station_id.clone(),
            }),
            KitchenCommandPayload::ServeItem { order_id, item_id } => {
                CommandAction::ServeItem(ServeItemAction {
                    order_id: order_id.clone(),
                    item_id: item_id.clone(),
                })
            }
            KitchenCommandPayload::CancelItem {
                order_id,
                item_id,
                reason,
            } => CommandAction::CancelItem(CancelItemAction {
                order_id: order_id.clone(),
                item_id: item_id.clone(),
                reason: reason.clone(),
            }),
            KitchenCommandPayload::FinalizeTicket { order_id } => {
                CommandAction::FinalizeTicket(FinalizeTicketAction {
                    order_id: order_id.clone(),
                })
            }
            KitchenCommandPayload::CancelTicket { order_id, reason } => {
                CommandAction::CancelTicket(CancelTicketAction {
                    order_id: order_id.clone(),
                    reason: reason.clone(),
                })
            }
        }
    }
}

// ========== Routing helpers ==========

/// First active station of the pipeline (entry point for new items)
pub(crate) fn first_active(stations: &[Station]) -> Option<&Station> {
    stations
        .iter()
        .filter(|s| s.is_active)
        .min_by_key(|s| s.sort_order)
}

/// Next active station strictly after the given position
///
/// Deactivated stations are invisible to routing, so items route around
/// them without any item-side bookkeeping.
pub(crate) fn next_active(stations: &[Station], after_sort: i32) -> Option<&Station> {
    stations
        .iter()
        .filter(|s| s.is_active && s.sort_order > after_sort)
        .min_by_key(|s| s.sort_order)
}

pub(crate) fn station_by_id<'a>(stations: &'a [Station], id: &str) -> Option<&'a Station> {
    stations.iter().find(|s| s.id == id)
}

// ========== Validation helpers ==========

/// Reject commands against closed orders
pub(crate) fn ensure_open(snapshot: &TicketSnapshot) -> Result<(), PipelineError> {
    match snapshot.status {
        TicketStatus::Delivered => Err(PipelineError::OrderAlreadyFinalized(
            snapshot.order_id.clone(),
        )),
        TicketStatus::Cancelled => Err(PipelineError::OrderCancelled(snapshot.order_id.clone())),
        _ => Ok(()),
    }
}

/// Build ticket items from order-entry input, queued at the given station
/// (or unassigned for drafts)
pub(crate) fn build_items(
    inputs: &[ItemInput],
    station: Option<&Station>,
    now: i64,
) -> Vec<TicketItem> {
    inputs
        .iter()
        .map(|input| {
            let mut item = TicketItem {
                item_id: uuid::Uuid::new_v4().to_string(),
                product_id: input.product_id.clone(),
                product_name: input.product_name.clone(),
                variation: input.variation.clone(),
                quantity: input.quantity,
                note: input.note.clone(),
                extras: input.extras.clone(),
                status: ItemStatus::Pending,
                station_id: station.map(|s| s.id.clone()),
                station_is_dispatch: station.map(|s| s.is_dispatch()).unwrap_or(false),
                progress: ItemProgress::Queued,
                station_entered_at: station.map(|_| now),
                served_at: None,
                created_at: now,
            };
            item.refresh_status();
            item
        })
        .collect()
}
