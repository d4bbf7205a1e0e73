//! CancelTicket command handler
//!
//! Cancels the whole ticket. Items keep their last recorded state; the
//! cancelled ticket rejects every further command, which is what stops
//! them from moving again.

use async_trait::async_trait;

use crate::pipeline::actions::ensure_open;
use crate::pipeline::traits::{ActionOutcome, CommandContext, CommandHandler, CommandMetadata, PipelineError};
use shared::kitchen::{EventPayload, KitchenEvent, KitchenEventType};

/// CancelTicket action
#[derive(Debug, Clone)]
pub struct CancelTicketAction {
    pub order_id: String,
    pub reason: Option<String>,
}

#[async_trait]
impl CommandHandler for CancelTicketAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<ActionOutcome, PipelineError> {
        let snapshot = ctx.load_snapshot(&self.order_id)?;
        ensure_open(&snapshot)?;

        let event = KitchenEvent::new(
            ctx.next_sequence(),
            self.order_id.clone(),
            metadata.tenant_id.clone(),
            metadata.operator_id.clone(),
            metadata.operator_name.clone(),
            metadata.command_id.clone(),
            Some(metadata.timestamp),
            KitchenEventType::TicketCancelled,
            EventPayload::TicketCancelled {
                reason: self.reason.clone(),
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
    use shared::kitchen::{ItemProgress, TicketStatus};

    fn action() -> CancelTicketAction {
        CancelTicketAction {
            order_id: "order-1".to_string(),
            reason: Some("customer left".to_string()),
        }
    }

    #[tokio::test]
    async fn test_cancel_open_ticket() {
        let storage = PipelineStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);
        let stations = three_stage_pipeline();
        ctx.save_snapshot(ticket_with_items(
            "order-1",
            vec![item_at("i1", &stations[0], ItemProgress::InProgress)],
        ));

        let outcome = action().execute(&mut ctx, &metadata()).await.unwrap();

        match &outcome.events[0].payload {
            EventPayload::TicketCancelled { reason } => {
                assert_eq!(reason.as_deref(), Some("customer left"));
            }
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_cancel_finalized_ticket_rejected() {
        let storage = PipelineStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);
        let mut ticket = ticket_with_items("order-1", vec![]);
        ticket.status = TicketStatus::Delivered;
        ctx.save_snapshot(ticket);

        let result = action().execute(&mut ctx, &metadata()).await;

        assert!(matches!(result, Err(PipelineError::OrderAlreadyFinalized(_))));
    }

    #[tokio::test]
    async fn test_double_cancel_rejected() {
        let storage = PipelineStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);
        let mut ticket = ticket_with_items("order-1", vec![]);
        ticket.status = TicketStatus::Cancelled;
        ctx.save_snapshot(ticket);

        let result = action().execute(&mut ctx, &metadata()).await;

        assert!(matches!(result, Err(PipelineError::OrderCancelled(_))));
    }
}
