//! AdvanceItem command handler
//!
//! The core workflow mutation: complete the item at its current production
//! station and re-queue it at the next active station, as one atomic step.
//! At a dispatch station the same gesture marks the item ready to serve.
//!
//! The `expected_station_id` precondition is what makes concurrent bumps
//! from two terminals safe: the second one observes a mismatch and gets a
//! stale no-op instead of double-advancing the item.

use async_trait::async_trait;

use crate::pipeline::actions::{ensure_open, next_active, station_by_id};
use crate::pipeline::traits::{ActionOutcome, CommandContext, CommandHandler, CommandMetadata, PipelineError};
use shared::kitchen::{
    CommandError, CommandErrorCode, EventPayload, ItemProgress, KitchenEvent, KitchenEventType,
};
use shared::models::Station;

/// AdvanceItem action
#[derive(Debug, Clone)]
pub struct AdvanceItemAction {
    pub order_id: String,
    pub item_id: String,
    /// Station the terminal believes the item is at
    pub expected_station_id: String,
    /// Tenant's station set, injected by the manager
    pub stations: Vec<Station>,
}

#[async_trait]
impl CommandHandler for AdvanceItemAction {
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

        // A cancelled item was bumped from a screen that had not refreshed
        // yet: stale, not an error
        if item.is_terminal() {
            return Err(PipelineError::Stale {
                order_id: self.order_id.clone(),
            });
        }
        if item.is_served() {
            return Err(PipelineError::InvalidOperation(format!(
                "Item {} has already been served",
                self.item_id
            )));
        }

        let current_id = item.station_id.clone().ok_or_else(|| {
            PipelineError::InvalidOperation(format!(
                "Item {} is not routed to a station yet",
                self.item_id
            ))
        })?;

        if current_id != self.expected_station_id {
            return Err(PipelineError::Stale {
                order_id: self.order_id.clone(),
            });
        }

        if item.station_is_dispatch {
            // Bump at the dispatch station: mark ready, nothing to route
            if item.progress == ItemProgress::Done {
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
                KitchenEventType::ItemReady,
                EventPayload::ItemReady {
                    item_id: self.item_id.clone(),
                    station_id: current_id,
                },
            );
            return Ok(vec![event].into());
        }

        let current = station_by_id(&self.stations, &current_id).ok_or_else(|| {
            PipelineError::InvalidConfiguration(format!(
                "Station {} is not part of this tenant's pipeline",
                current_id
            ))
        })?;
        let next = next_active(&self.stations, current.sort_order);

        // No next active station means the pipeline ends on a production
        // station. The item is held done where it is and the caller is
        // warned; advancing it again after the configuration is fixed
        // routes it forward.
        let warning = if next.is_none() {
            Some(CommandError::new(
                CommandErrorCode::InvalidConfiguration,
                format!(
                    "No active station after {}; item held done in place",
                    current_id
                ),
            ))
        } else {
            None
        };

        let event = KitchenEvent::new(
            ctx.next_sequence(),
            self.order_id.clone(),
            metadata.tenant_id.clone(),
            metadata.operator_id.clone(),
            metadata.operator_name.clone(),
            metadata.command_id.clone(),
            Some(metadata.timestamp),
            KitchenEventType::ItemAdvanced,
            EventPayload::ItemAdvanced {
                item_id: self.item_id.clone(),
                from_station_id: current_id,
                to_station_id: next.map(|s| s.id.clone()),
                to_is_dispatch: next.map(|s| s.is_dispatch()).unwrap_or(false),
            },
        );

        Ok(ActionOutcome {
            events: vec![event],
            warning,
        })
    }
}
