//! StartItem command handler
//!
//! Cosmetic queued -> in_progress signal from a station terminal. Any
//! precondition miss is reported as a stale transition rather than an
//! error: the terminal just redraws from the authoritative ticket.

use async_trait::async_trait;

use crate::pipeline::actions::ensure_open;
use crate::pipeline::traits::{ActionOutcome, CommandContext, CommandHandler, CommandMetadata, PipelineError};
use shared::kitchen::{EventPayload, ItemProgress, KitchenEvent, KitchenEventType};

/// StartItem action
#[derive(Debug, Clone)]
pub struct StartItemAction {
    pub order_id: String,
    pub item_id: String,
    pub expected_station_id: Option<String>,
}

#[async_trait]
impl CommandHandler for StartItemAction {
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

        if item.is_terminal() || item.is_served() {
            return Err(PipelineError::Stale {
                order_id: self.order_id.clone(),
            });
        }

        let station_id = item.station_id.clone().ok_or_else(|| {
            PipelineError::InvalidOperation(format!(
                "Item {} is not routed to a station yet",
                self.item_id
            ))
        })?;

        let expected_matches = self
            .expected_station_id
            .as_ref()
            .is_none_or(|expected| *expected == station_id);
        if !expected_matches || item.progress != ItemProgress::Queued {
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
            KitchenEventType::ItemStarted,
            EventPayload::ItemStarted {
                item_id: self.item_id.clone(),
                station_id,
            },
        );

        Ok(vec![event].into())
    }
}
