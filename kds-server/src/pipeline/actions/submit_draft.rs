//! SubmitDraft command handler
//!
//! Commits a draft ticket: every unassigned item enters the first active
//! station and the ticket becomes live.

use async_trait::async_trait;

use crate::pipeline::actions::{ensure_open, first_active};
use crate::pipeline::traits::{ActionOutcome, CommandContext, CommandHandler, CommandMetadata, PipelineError};
use shared::kitchen::{EventPayload, KitchenEvent, KitchenEventType};
use shared::models::Station;

/// SubmitDraft action
#[derive(Debug, Clone)]
pub struct SubmitDraftAction {
    pub order_id: String,
    /// Tenant's station set, injected by the manager
    pub stations: Vec<Station>,
}

#[async_trait]
impl CommandHandler for SubmitDraftAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<ActionOutcome, PipelineError> {
        let snapshot = ctx.load_snapshot(&self.order_id)?;
        ensure_open(&snapshot)?;

        if !snapshot.is_draft {
            return Err(PipelineError::InvalidOperation(format!(
                "Order {} is not a draft",
                self.order_id
            )));
        }

        // Unlike OpenTicket, a draft submit with no station to route to is
        // rejected outright: the draft stays a draft until the pipeline is
        // configured
        let entry = first_active(&self.stations).ok_or_else(|| {
            PipelineError::InvalidConfiguration(
                "No active station configured; draft cannot be submitted".to_string(),
            )
        })?;

        let item_ids: Vec<String> = snapshot
            .items
            .iter()
            .filter(|i| !i.is_cancelled() && i.station_id.is_none())
            .map(|i| i.item_id.clone())
            .collect();

        let event = KitchenEvent::new(
            ctx.next_sequence(),
            self.order_id.clone(),
            metadata.tenant_id.clone(),
            metadata.operator_id.clone(),
            metadata.operator_name.clone(),
            metadata.command_id.clone(),
            Some(metadata.timestamp),
            KitchenEventType::DraftSubmitted,
            EventPayload::DraftSubmitted {
                station_id: entry.id.clone(),
                station_is_dispatch: entry.is_dispatch(),
                item_ids,
            },
        );

        Ok(vec![event].into())
    }
}
