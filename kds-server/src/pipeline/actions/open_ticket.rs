//! OpenTicket command handler
//!
//! Creates a ticket for an order handed over by order entry. Items are
//! queued at the tenant's first active station unless the ticket is opened
//! as a draft.

use async_trait::async_trait;

use crate::pipeline::actions::{build_items, first_active};
use crate::pipeline::traits::{ActionOutcome, CommandContext, CommandHandler, CommandMetadata, PipelineError};
use shared::kitchen::{
    CommandError, CommandErrorCode, EventPayload, ItemInput, KitchenEvent, KitchenEventType,
};
use shared::models::Station;

/// OpenTicket action
#[derive(Debug, Clone)]
pub struct OpenTicketAction {
    /// Caller-supplied order id; generated when absent
    pub order_id: Option<String>,
    pub order_kind: Option<String>,
    pub seating: Option<String>,
    pub customer: Option<String>,
    pub note: Option<String>,
    pub is_draft: bool,
    pub items: Vec<ItemInput>,
    /// Tenant's station set, injected by the manager
    pub stations: Vec<Station>,
}

#[async_trait]
impl CommandHandler for OpenTicketAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<ActionOutcome, PipelineError> {
        let order_id = self
            .order_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        if ctx.order_exists(&order_id)? {
            return Err(PipelineError::InvalidOperation(format!(
                "Order already exists: {}",
                order_id
            )));
        }

        let now = chrono::Utc::now().timestamp_millis();
        let entry = if self.is_draft {
            None
        } else {
            first_active(&self.stations)
        };

        // A non-draft open with no active station still succeeds: items are
        // queued unassigned and the caller gets a configuration warning
        let warning = if !self.is_draft && entry.is_none() && !self.items.is_empty() {
            Some(CommandError::new(
                CommandErrorCode::InvalidConfiguration,
                "No active station configured; items queued unassigned",
            ))
        } else {
            None
        };

        let mut events = vec![KitchenEvent::new(
            ctx.next_sequence(),
            order_id.clone(),
            metadata.tenant_id.clone(),
            metadata.operator_id.clone(),
            metadata.operator_name.clone(),
            metadata.command_id.clone(),
            Some(metadata.timestamp),
            KitchenEventType::TicketOpened,
            EventPayload::TicketOpened {
                order_kind: self.order_kind.clone(),
                seating: self.seating.clone(),
                customer: self.customer.clone(),
                note: self.note.clone(),
                is_draft: self.is_draft,
            },
        )];

        if !self.items.is_empty() {
            let items = build_items(&self.items, entry, now);
            events.push(KitchenEvent::new(
                ctx.next_sequence(),
                order_id,
                metadata.tenant_id.clone(),
                metadata.operator_id.clone(),
                metadata.operator_name.clone(),
                metadata.command_id.clone(),
                Some(metadata.timestamp),
                KitchenEventType::ItemsQueued,
                EventPayload::ItemsQueued { items },
            ));
        }

        Ok(ActionOutcome { events, warning })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::actions::testing::{metadata, three_stage_pipeline};
    use crate::pipeline::storage::PipelineStorage;

    fn item_input(product: &str) -> ItemInput {
        ItemInput {
            product_id: product.to_string(),
            product_name: product.to_uppercase(),
            variation: None,
            quantity: 1,
            note: None,
            extras: vec![],
        }
    }

    fn action(items: Vec<ItemInput>, is_draft: bool, stations: Vec<Station>) -> OpenTicketAction {
        OpenTicketAction {
            order_id: Some("order-1".to_string()),
            order_kind: Some("dine_in".to_string()),
            seating: Some("T1".to_string()),
            customer: None,
            note: None,
            is_draft,
            items,
            stations,
        }
    }

    #[tokio::test]
    async fn test_open_queues_items_at_first_active_station() {
        let storage = PipelineStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let outcome = action(vec![item_input("p1")], false, three_stage_pipeline())
            .execute(&mut ctx, &metadata())
            .await
            .unwrap();

        assert_eq!(outcome.events.len(), 2);
        assert!(outcome.warning.is_none());
        assert_eq!(outcome.events[0].sequence, 1);
        assert_eq!(outcome.events[1].sequence, 2);
        match &outcome.events[1].payload {
            EventPayload::ItemsQueued { items } => {
                assert_eq!(items.len(), 1);
                assert_eq!(items[0].station_id.as_deref(), Some("grill"));
                assert!(!items[0].station_is_dispatch);
            }
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_draft_items_stay_unassigned() {
        let storage = PipelineStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let outcome = action(vec![item_input("p1")], true, three_stage_pipeline())
            .execute(&mut ctx, &metadata())
            .await
            .unwrap();

        assert!(outcome.warning.is_none());
        match &outcome.events[1].payload {
            EventPayload::ItemsQueued { items } => assert!(items[0].station_id.is_none()),
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_active_station_warns_and_queues_unassigned() {
        let storage = PipelineStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let outcome = action(vec![item_input("p1")], false, vec![])
            .execute(&mut ctx, &metadata())
            .await
            .unwrap();

        let warning = outcome.warning.expect("expected configuration warning");
        assert_eq!(warning.code, CommandErrorCode::InvalidConfiguration);
        match &outcome.events[1].payload {
            EventPayload::ItemsQueued { items } => assert!(items[0].station_id.is_none()),
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_duplicate_order_id_rejected() {
        let storage = PipelineStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);
        ctx.save_snapshot(shared::kitchen::TicketSnapshot::new(
            "order-1".to_string(),
            "t1".to_string(),
        ));

        let result = action(vec![], false, three_stage_pipeline())
            .execute(&mut ctx, &metadata())
            .await;

        assert!(matches!(result, Err(PipelineError::InvalidOperation(_))));
    }
}
