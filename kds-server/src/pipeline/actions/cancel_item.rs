//! CancelItem command handler
//!
//! Cancels a single item. Terminal: a cancelled item never re-enters the
//! pipeline. A served item can no longer be cancelled here; that is a
//! refund concern for the billing collaborator.

use async_trait::async_trait;

use crate::pipeline::actions::ensure_open;
use crate::pipeline::traits::{ActionOutcome, CommandContext, CommandHandler, CommandMetadata, PipelineError};
use shared::kitchen::{EventPayload, KitchenEvent, KitchenEventType};

/// CancelItem action
#[derive(Debug, Clone)]
pub struct CancelItemAction {
    pub order_id: String,
    pub item_id: String,
    pub reason: Option<String>,
}

#[async_trait]
impl CommandHandler for CancelItemAction {
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

        // Served items report Delivered, so this check must come before
        // the terminal-status one or a served item would read as stale
        if item.is_served() {
            return Err(PipelineError::InvalidOperation(format!(
                "Item {} has already been served",
                self.item_id
            )));
        }
        if item.is_cancelled() {
            return Err(PipelineError::Stale {
                order_id: self.order_id.clone(),
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
            KitchenEventType::ItemCancelled,
            EventPayload::ItemCancelled {
                item_id: self.item_id.clone(),
                reason: self.reason.clone(),
            },
        );

        Ok(vec![event].into())
    }
}
