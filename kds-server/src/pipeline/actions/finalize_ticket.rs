//! FinalizeTicket command handler
//!
//! Closes the order once every non-cancelled item is served. Refused with
//! the offending item list while anything is still in flight, so the front
//! of house can see exactly what is holding the table up.

use async_trait::async_trait;

use crate::pipeline::actions::ensure_open;
use crate::pipeline::traits::{ActionOutcome, CommandContext, CommandHandler, CommandMetadata, PipelineError};
use shared::kitchen::{EventPayload, KitchenEvent, KitchenEventType};

/// FinalizeTicket action
#[derive(Debug, Clone)]
pub struct FinalizeTicketAction {
    pub order_id: String,
}

#[async_trait]
impl CommandHandler for FinalizeTicketAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<ActionOutcome, PipelineError> {
        let snapshot = ctx.load_snapshot(&self.order_id)?;
        ensure_open(&snapshot)?;

        let unserved: Vec<String> = snapshot
            .unserved_items()
            .map(|i| i.item_id.clone())
            .collect();
        if !unserved.is_empty() {
            return Err(PipelineError::NotReady {
                order_id: self.order_id.clone(),
                items: unserved,
            });
        }

        let event = KitchenEvent::new(
            ctx.next_sequence(),
            self.order_id.clone(),
            metadata.tenant_id.clone(),
            metadata.operator_id.clone(),
            metadata.operator_name.clone(),
            metadata.command_id.clone(),
            Some(metadata.timestamp),
            KitchenEventType::TicketFinalized,
            EventPayload::TicketFinalized {},
        );

        Ok(vec![event].into())
    }
}
