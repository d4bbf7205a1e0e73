//! ServeItem command handler
//!
//! Hands a dispatch-station item to the customer. Serving is allowed at
//! any progress once the item sits at a dispatch station, so an expediter
//! can hand food over even if nobody pressed the bump button.

use async_trait::async_trait;

use crate::pipeline::actions::ensure_open;
use crate::pipeline::traits::{ActionOutcome, CommandContext, CommandHandler, CommandMetadata, PipelineError};
use shared::kitchen::{EventPayload, KitchenEvent, KitchenEventType};

/// ServeItem action
#[derive(Debug, Clone)]
pub struct ServeItemAction {
    pub order_id: String,
    pub item_id: String,
}

#[async_trait]
impl CommandHandler for ServeItemAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<ActionOutcome, PipelineError> {
        let snapshot = ctx.load_snapshot(&self.order_id)?;
        ensure_open(&snapshot)?;

        let item = snapshot
            .item(&self.item_id)
            .ok_or_else(|| PipelineError::ItemNotFound(self.item_id.clone()))?;

        // Double-serve and serve-after-cancel are both stale no-ops
        if item.is_terminal() || item.is_served() {
            return Err(PipelineError::Stale {
                order_id: self.order_id.clone(),
            });
        }

        let station_id = match &item.station_id {
            Some(id) if item.station_is_dispatch => id.clone(),
            _ => {
                return Err(PipelineError::InvalidOperation(format!(
                    "Item {} is not at a dispatch station",
                    self.item_id
                )));
            }
        };

        let event = KitchenEvent::new(
            ctx.next_sequence(),
            self.order_id.clone(),
            metadata.tenant_id.clone(),
            metadata.operator_id.clone(),
            metadata.operator_name.clone(),
            metadata.command_id.clone(),
            Some(metadata.timestamp),
            KitchenEventType::ItemServed,
            EventPayload::ItemServed {
                item_id: self.item_id.clone(),
                station_id,
            },
        );

        Ok(vec![event].into())
    }
}
