//! AddItems command handler
//!
//! Appends items to an existing ticket. On a live ticket the new items
//! enter the first active station immediately; on a draft they stay
//! unassigned until SubmitDraft.

use async_trait::async_trait;

use crate::pipeline::actions::{build_items, ensure_open, first_active};
use crate::pipeline::traits::{ActionOutcome, CommandContext, CommandHandler, CommandMetadata, PipelineError};
use shared::kitchen::{
    CommandError, CommandErrorCode, EventPayload, ItemInput, KitchenEvent, KitchenEventType,
};
use shared::models::Station;

/// AddItems action
#[derive(Debug, Clone)]
pub struct AddItemsAction {
    pub order_id: String,
    pub items: Vec<ItemInput>,
    /// Tenant's station set, injected by the manager
    pub stations: Vec<Station>,
}

#[async_trait]
impl CommandHandler for AddItemsAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<ActionOutcome, PipelineError> {
        let snapshot = ctx.load_snapshot(&self.order_id)?;
        ensure_open(&snapshot)?;

        if self.items.is_empty() {
            return Err(PipelineError::InvalidOperation(
                "AddItems requires at least one item".to_string(),
            ));
        }

        let now = chrono::Utc::now().timestamp_millis();
        let entry = if snapshot.is_draft {
            None
        } else {
            first_active(&self.stations)
        };

        let warning = if !snapshot.is_draft && entry.is_none() {
            Some(CommandError::new(
                CommandErrorCode::InvalidConfiguration,
                "No active station configured; items queued unassigned",
            ))
        } else {
            None
        };

        let items = build_items(&self.items, entry, now);
        let event = KitchenEvent::new(
            ctx.next_sequence(),
            self.order_id.clone(),
            metadata.tenant_id.clone(),
            metadata.operator_id.clone(),
            metadata.operator_name.clone(),
            metadata.command_id.clone(),
            Some(metadata.timestamp),
            KitchenEventType::ItemsQueued,
            EventPayload::ItemsQueued { items },
        );

        Ok(ActionOutcome {
            events: vec![event],
            warning,
        })
    }
}
