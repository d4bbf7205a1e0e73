//! SkipStation command handler
//!
//! Routes an item past its current production station without completing
//! it. Dispatch stations cannot be skipped, and a skip with nowhere to go
//! is rejected outright (unlike AdvanceItem's held-in-place fallback).

use async_trait::async_trait;

use crate::pipeline::actions::{ensure_open, next_active, station_by_id};
use crate::pipeline::traits::{ActionOutcome, CommandContext, CommandHandler, CommandMetadata, PipelineError};
use shared::kitchen::{EventPayload, KitchenEvent, KitchenEventType};
use shared::models::Station;

/// SkipStation action
#[derive(Debug, Clone)]
pub struct SkipStationAction {
    pub order_id: String,
    pub item_id: String,
    /// Station the terminal believes the item is at
    pub expected_station_id: String,
    /// Tenant's station set, injected by the manager
    pub stations: Vec<Station>,
}

#[async_trait]
impl CommandHandler for SkipStationAction {
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
            return Err(PipelineError::InvalidOperation(
                "Dispatch station cannot be skipped".to_string(),
            ));
        }

        let current = station_by_id(&self.stations, &current_id).ok_or_else(|| {
            PipelineError::InvalidConfiguration(format!(
                "Station {} is not part of this tenant's pipeline",
                current_id
            ))
        })?;
        let next = next_active(&self.stations, current.sort_order).ok_or_else(|| {
            PipelineError::InvalidConfiguration(format!(
                "No active station after {} to skip to",
                current_id
            ))
        })?;

        let event = KitchenEvent::new(
            ctx.next_sequence(),
            self.order_id.clone(),
            metadata.tenant_id.clone(),
            metadata.operator_id.clone(),
            metadata.operator_name.clone(),
            metadata.command_id.clone(),
            Some(metadata.timestamp),
            KitchenEventType::StationSkipped,
            EventPayload::StationSkipped {
                item_id: self.item_id.clone(),
                from_station_id: current_id,
                to_station_id: next.id.clone(),
                to_is_dispatch: next.is_dispatch(),
            },
        );

        Ok(vec![event].into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::actions::testing::{item_at, metadata, three_stage_pipeline, ticket_with_items};
    use crate::pipeline::storage::PipelineStorage;
    use shared::kitchen::ItemProgress;

    fn action(expected: &str, stations: Vec<Station>) -> SkipStationAction {
        SkipStationAction {
            order_id: "order-1".to_string(),
            item_id: "i1".to_string(),
            expected_station_id: expected.to_string(),
            stations,
        }
    }

    #[tokio::test]
    async fn test_skip_routes_to_next_station() {
        let storage = PipelineStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);
        let stations = three_stage_pipeline();
        ctx.save_snapshot(ticket_with_items(
            "order-1",
            vec![item_at("i1", &stations[0], ItemProgress::Queued)],
        ));

        let outcome = action("grill", stations)
            .execute(&mut ctx, &metadata())
            .await
            .unwrap();

        match &outcome.events[0].payload {
            EventPayload::StationSkipped {
                from_station_id,
                to_station_id,
                ..
            } => {
                assert_eq!(from_station_id, "grill");
                assert_eq!(to_station_id, "plating");
            }
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_skip_at_dispatch_rejected() {
        let storage = PipelineStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);
        let stations = three_stage_pipeline();
        ctx.save_snapshot(ticket_with_items(
            "order-1",
            vec![item_at("i1", &stations[2], ItemProgress::Queued)],
        ));

        let result = action("pass", stations).execute(&mut ctx, &metadata()).await;

        assert!(matches!(result, Err(PipelineError::InvalidOperation(_))));
    }

    #[tokio::test]
    async fn test_skip_with_no_destination_rejected() {
        let storage = PipelineStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);
        let mut stations = three_stage_pipeline();
        stations[1].is_active = false;
        stations[2].is_active = false;
        ctx.save_snapshot(ticket_with_items(
            "order-1",
            vec![item_at("i1", &stations[0], ItemProgress::Queued)],
        ));

        let result = action("grill", stations).execute(&mut ctx, &metadata()).await;

        assert!(matches!(result, Err(PipelineError::InvalidConfiguration(_))));
    }

    #[tokio::test]
    async fn test_station_mismatch_is_stale() {
        let storage = PipelineStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);
        let stations = three_stage_pipeline();
        ctx.save_snapshot(ticket_with_items(
            "order-1",
            vec![item_at("i1", &stations[1], ItemProgress::Queued)],
        ));

        let result = action("grill", stations).execute(&mut ctx, &metadata()).await;

        assert!(matches!(result, Err(PipelineError::Stale { .. })));
    }
}
