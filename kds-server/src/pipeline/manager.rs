//! Pipeline manager - command processing entry point
//!
//! Processing flow for every command:
//! 1. Idempotency pre-check (fast path, no write transaction)
//! 2. Begin write transaction, re-check idempotency inside it
//! 3. Build the action (routing commands get the tenant's station set)
//! 4. Execute the action: validate, emit events
//! 5. Apply events to snapshots, derive station log entries
//! 6. Persist events, snapshots, open-ticket index, counters
//! 7. Commit, then broadcast the events to feed subscribers
//!
//! A stale precondition is not a failure: the transaction is dropped and
//! the caller gets the authoritative ticket with `stale: true`.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::pipeline::actions::{
    AddItemsAction, AdvanceItemAction, CommandAction, OpenTicketAction, SkipStationAction,
    SubmitDraftAction,
};
use crate::pipeline::appliers::EventAction;
use crate::pipeline::storage::{PipelineStorage, StorageError, StorageStats};
use crate::pipeline::traits::{
    CommandContext, CommandHandler, CommandMetadata, EventApplier, PipelineError,
};
use crate::stations::StationRegistry;
use shared::kitchen::{
    CommandError, CommandErrorCode, CommandResponse, EventPayload, KitchenCommand,
    KitchenCommandPayload, KitchenEvent, LogAction, StationLogEntry, TicketSnapshot,
};

const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// What a committed command produced
struct CommitOutcome {
    ticket: TicketSnapshot,
    warning: Option<CommandError>,
    events: Vec<KitchenEvent>,
}

enum ExecError {
    /// Command id was already processed (caught inside the transaction)
    Duplicate,
    Pipeline(PipelineError),
}

impl From<PipelineError> for ExecError {
    fn from(e: PipelineError) -> Self {
        ExecError::Pipeline(e)
    }
}

impl From<StorageError> for ExecError {
    fn from(e: StorageError) -> Self {
        ExecError::Pipeline(PipelineError::from(e))
    }
}

/// Pipeline manager
pub struct PipelineManager {
    storage: PipelineStorage,
    registry: Arc<StationRegistry>,
    event_tx: broadcast::Sender<Arc<KitchenEvent>>,
    /// Fresh per process start; clients holding another epoch must resync
    epoch: String,
}

impl PipelineManager {
    pub fn new(storage: PipelineStorage, registry: Arc<StationRegistry>) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            storage,
            registry,
            event_tx,
            epoch: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Subscribe to committed events (feed fan-out)
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<KitchenEvent>> {
        self.event_tx.subscribe()
    }

    pub fn epoch(&self) -> &str {
        &self.epoch
    }

    pub fn registry(&self) -> &StationRegistry {
        &self.registry
    }

    /// Process a command and return the response sent back to the terminal
    pub async fn process_command(&self, command: KitchenCommand) -> CommandResponse {
        let command_id = command.command_id.clone();

        // 1. Fast idempotency check, no write lock held
        match self.storage.is_command_processed(&command_id) {
            Ok(true) => return self.duplicate_response(&command),
            Ok(false) => {}
            Err(e) => {
                tracing::error!("Idempotency check failed: {}", e);
                return CommandResponse::error(command_id, classify_storage_message(&e.to_string()));
            }
        }

        match self.execute(&command).await {
            Ok(outcome) => {
                tracing::info!(
                    "Command {} committed: {} event(s) on order {}",
                    command_id,
                    outcome.events.len(),
                    outcome.ticket.order_id
                );
                for event in outcome.events {
                    let _ = self.event_tx.send(Arc::new(event));
                }
                let mut response = CommandResponse::success(command_id, outcome.ticket);
                if let Some(warning) = outcome.warning {
                    tracing::warn!(
                        "Command {} committed with warning: {}",
                        response.command_id,
                        warning.message
                    );
                    response = response.with_warning(warning);
                }
                response
            }
            Err(ExecError::Duplicate) => self.duplicate_response(&command),
            Err(ExecError::Pipeline(PipelineError::Stale { order_id })) => {
                tracing::info!("Command {} was stale on order {}", command_id, order_id);
                match self.storage.get_ticket(&order_id) {
                    Ok(Some(ticket)) => CommandResponse::stale(command_id, ticket),
                    Ok(None) => CommandResponse::error(
                        command_id,
                        CommandError::new(
                            CommandErrorCode::OrderNotFound,
                            format!("Order not found: {}", order_id),
                        ),
                    ),
                    Err(e) => {
                        CommandResponse::error(command_id, classify_storage_message(&e.to_string()))
                    }
                }
            }
            Err(ExecError::Pipeline(err)) => {
                tracing::warn!("Command {} rejected: {}", command_id, err);
                let error = pipeline_error_detail(&err);
                match self.rejected_ticket(&command) {
                    Some(ticket) => CommandResponse::error_with_ticket(command_id, error, ticket),
                    None => CommandResponse::error(command_id, error),
                }
            }
        }
    }

    /// Execute a command inside one write transaction
    async fn execute(&self, command: &KitchenCommand) -> Result<CommitOutcome, ExecError> {
        let txn = self.storage.begin_write()?;

        // 2. Re-check under the write lock: two in-flight retries of the
        // same command must produce exactly one application
        if self
            .storage
            .is_command_processed_txn(&txn, &command.command_id)?
        {
            return Err(ExecError::Duplicate);
        }

        let current_sequence = self.storage.get_current_sequence()?;
        let mut ctx = CommandContext::new(&txn, &self.storage, current_sequence);
        let metadata = CommandMetadata {
            command_id: command.command_id.clone(),
            tenant_id: command.tenant_id.clone(),
            operator_id: command.operator_id.clone(),
            operator_name: command.operator_name.clone(),
            timestamp: command.timestamp,
        };

        // 3-4. Build and run the action
        let action = self.build_action(command);
        let outcome = action.execute(&mut ctx, &metadata).await?;
        drop(ctx);

        // 5. Fold events into snapshots and derive the station log
        let mut snapshots: HashMap<String, TicketSnapshot> = HashMap::new();
        let mut max_sequence = current_sequence;
        for event in &outcome.events {
            let snapshot = match snapshots.entry(event.order_id.clone()) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    let loaded = self
                        .storage
                        .get_ticket_txn(&txn, &event.order_id)?
                        .unwrap_or_else(|| {
                            TicketSnapshot::new(event.order_id.clone(), event.tenant_id.clone())
                        });
                    entry.insert(loaded)
                }
            };
            let applier: EventAction = event.into();
            applier.apply(snapshot, event);

            self.storage.store_event(&txn, event)?;
            self.append_station_log(&txn, event)?;
            max_sequence = max_sequence.max(event.sequence);
        }

        // 6. Persist snapshots, maintain the open-ticket index
        for snapshot in snapshots.values() {
            self.storage.store_ticket(&txn, snapshot)?;
            if snapshot.is_open() {
                self.storage
                    .mark_ticket_active(&txn, &snapshot.order_id, &snapshot.tenant_id)?;
            } else {
                self.storage.mark_ticket_inactive(&txn, &snapshot.order_id)?;
            }
        }
        self.storage.set_sequence(&txn, max_sequence)?;
        self.storage
            .mark_command_processed(&txn, &command.command_id)?;

        let ticket = outcome
            .events
            .first()
            .and_then(|e| snapshots.get(&e.order_id))
            .cloned()
            .ok_or_else(|| {
                ExecError::Pipeline(PipelineError::Storage(
                    "command produced no events".to_string(),
                ))
            })?;

        // 7. Commit
        txn.commit().map_err(StorageError::from)?;

        Ok(CommitOutcome {
            ticket,
            warning: outcome.warning,
            events: outcome.events,
        })
    }

    /// Build the action for a command. Routing commands get the tenant's
    /// station set so routing resolves against the configuration that is
    /// live right now.
    fn build_action(&self, command: &KitchenCommand) -> CommandAction {
        match &command.payload {
            KitchenCommandPayload::OpenTicket {
                order_id,
                order_kind,
                seating,
                customer,
                note,
                is_draft,
                items,
            } => CommandAction::OpenTicket(OpenTicketAction {
                order_id: order_id.clone(),
                order_kind: order_kind.clone(),
                seating: seating.clone(),
                customer: customer.clone(),
                note: note.clone(),
                is_draft: *is_draft,
                items: items.clone(),
                stations: self.registry.all_for_tenant(&command.tenant_id),
            }),
            KitchenCommandPayload::AddItems { order_id, items } => {
                CommandAction::AddItems(AddItemsAction {
                    order_id: order_id.clone(),
                    items: items.clone(),
                    stations: self.registry.all_for_tenant(&command.tenant_id),
                })
            }
            KitchenCommandPayload::SubmitDraft { order_id } => {
                CommandAction::SubmitDraft(SubmitDraftAction {
                    order_id: order_id.clone(),
                    stations: self.registry.all_for_tenant(&command.tenant_id),
                })
            }
            KitchenCommandPayload::AdvanceItem {
                order_id,
                item_id,
                expected_station_id,
            } => CommandAction::AdvanceItem(AdvanceItemAction {
                order_id: order_id.clone(),
                item_id: item_id.clone(),
                expected_station_id: expected_station_id.clone(),
                stations: self.registry.all_for_tenant(&command.tenant_id),
            }),
            KitchenCommandPayload::SkipStation {
                order_id,
                item_id,
                expected_station_id,
            } => CommandAction::SkipStation(SkipStationAction {
                order_id: order_id.clone(),
                item_id: item_id.clone(),
                expected_station_id: expected_station_id.clone(),
                stations: self.registry.all_for_tenant(&command.tenant_id),
            }),
            _ => command.into(),
        }
    }

    /// Derive station log entries from an event
    fn append_station_log(
        &self,
        txn: &redb::WriteTransaction,
        event: &KitchenEvent,
    ) -> Result<(), StorageError> {
        let mut entries: Vec<(String, String, LogAction)> = Vec::new();
        match &event.payload {
            EventPayload::ItemsQueued { items } => {
                for item in items {
                    if let Some(station_id) = &item.station_id {
                        entries.push((item.item_id.clone(), station_id.clone(), LogAction::Entered));
                    }
                }
            }
            EventPayload::DraftSubmitted {
                station_id,
                item_ids,
                ..
            } => {
                for item_id in item_ids {
                    entries.push((item_id.clone(), station_id.clone(), LogAction::Entered));
                }
            }
            EventPayload::ItemAdvanced {
                item_id,
                from_station_id,
                to_station_id,
                ..
            } => {
                entries.push((item_id.clone(), from_station_id.clone(), LogAction::Completed));
                if let Some(to) = to_station_id {
                    entries.push((item_id.clone(), to.clone(), LogAction::Entered));
                }
            }
            EventPayload::StationSkipped {
                item_id,
                from_station_id,
                to_station_id,
                ..
            } => {
                entries.push((item_id.clone(), from_station_id.clone(), LogAction::Skipped));
                entries.push((item_id.clone(), to_station_id.clone(), LogAction::Entered));
            }
            EventPayload::ItemReady {
                item_id,
                station_id,
            } => {
                entries.push((item_id.clone(), station_id.clone(), LogAction::Completed));
            }
            _ => {}
        }

        for (item_id, station_id, action) in entries {
            let id = self.storage.next_log_id(txn)?;
            self.storage.append_log(
                txn,
                &StationLogEntry {
                    id,
                    item_id,
                    order_id: event.order_id.clone(),
                    station_id,
                    action,
                    operator_id: event.operator_id.clone(),
                    operator_name: event.operator_name.clone(),
                    created_at: event.timestamp,
                },
            )?;
        }
        Ok(())
    }

    fn duplicate_response(&self, command: &KitchenCommand) -> CommandResponse {
        tracing::info!("Command {} already processed", command.command_id);
        let ticket = command
            .payload
            .order_id()
            .and_then(|order_id| self.storage.get_ticket(order_id).ok().flatten());
        CommandResponse::duplicate(command.command_id.clone(), ticket)
    }

    /// Current ticket for a rejected command, when its order exists
    fn rejected_ticket(&self, command: &KitchenCommand) -> Option<TicketSnapshot> {
        command
            .payload
            .order_id()
            .and_then(|order_id| self.storage.get_ticket(order_id).ok().flatten())
    }

    // ========== Queries ==========

    pub fn get_ticket(&self, order_id: &str) -> Result<Option<TicketSnapshot>, StorageError> {
        self.storage.get_ticket(order_id)
    }

    pub fn get_active_tickets(
        &self,
        tenant_id: Option<&str>,
    ) -> Result<Vec<TicketSnapshot>, StorageError> {
        self.storage.get_active_tickets(tenant_id)
    }

    pub fn get_events_for_order(&self, order_id: &str) -> Result<Vec<KitchenEvent>, StorageError> {
        self.storage.get_events_for_order(order_id)
    }

    pub fn get_events_since(&self, since_sequence: u64) -> Result<Vec<KitchenEvent>, StorageError> {
        self.storage.get_events_since(since_sequence)
    }

    pub fn get_current_sequence(&self) -> Result<u64, StorageError> {
        self.storage.get_current_sequence()
    }

    pub fn get_item_log(&self, item_id: &str) -> Result<Vec<StationLogEntry>, StorageError> {
        self.storage.get_log_for_item(item_id)
    }

    pub fn get_stats(&self) -> Result<StorageStats, StorageError> {
        self.storage.get_stats()
    }

    /// Rebuild a ticket by replaying its event stream (bypasses the stored
    /// snapshot; used for consistency checks and recovery)
    pub fn rebuild_ticket(&self, order_id: &str) -> Result<Option<TicketSnapshot>, StorageError> {
        let events = self.storage.get_events_for_order(order_id)?;
        let Some(first) = events.first() else {
            return Ok(None);
        };
        let mut snapshot = TicketSnapshot::new(order_id.to_string(), first.tenant_id.clone());
        for event in &events {
            let applier: EventAction = event.into();
            applier.apply(&mut snapshot, event);
        }
        Ok(Some(snapshot))
    }
}

/// Map a pipeline error to the wire-level error detail
fn pipeline_error_detail(err: &PipelineError) -> CommandError {
    match err {
        PipelineError::OrderNotFound(id) => CommandError::new(
            CommandErrorCode::OrderNotFound,
            format!("Order not found: {}", id),
        ),
        PipelineError::ItemNotFound(id) => CommandError::new(
            CommandErrorCode::ItemNotFound,
            format!("Item not found: {}", id),
        ),
        PipelineError::OrderAlreadyFinalized(id) => CommandError::new(
            CommandErrorCode::OrderAlreadyFinalized,
            format!("Order already finalized: {}", id),
        ),
        PipelineError::OrderCancelled(id) => CommandError::new(
            CommandErrorCode::OrderCancelled,
            format!("Order cancelled: {}", id),
        ),
        PipelineError::NotReady { order_id, items } => CommandError::new(
            CommandErrorCode::NotReady,
            format!("Order {} has {} unserved item(s)", order_id, items.len()),
        )
        .with_items(items.clone()),
        PipelineError::Stale { .. } => CommandError::new(
            CommandErrorCode::StaleTransition,
            "State changed since the terminal last synced",
        ),
        PipelineError::InvalidConfiguration(msg) => {
            CommandError::new(CommandErrorCode::InvalidConfiguration, msg.clone())
        }
        PipelineError::InvalidOperation(msg) => {
            CommandError::new(CommandErrorCode::InvalidOperation, msg.clone())
        }
        PipelineError::Storage(msg) => classify_storage_message(msg),
    }
}

/// Classify a storage failure into a retriability hint for terminals
fn classify_storage_message(message: &str) -> CommandError {
    let lower = message.to_lowercase();
    if lower.contains("no space") || lower.contains("disk full") {
        CommandError::new(CommandErrorCode::StorageFull, "Storage is full")
    } else if lower.contains("corrupt") {
        CommandError::new(CommandErrorCode::StorageCorrupted, "Storage is corrupted")
    } else {
        CommandError::new(
            CommandErrorCode::SystemBusy,
            "Storage temporarily unavailable, retry the command",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::kitchen::{ItemInput, ItemStatus, TicketStatus};
    use shared::models::{Station, StationCreate, StationKind};

    fn create_station(registry: &StationRegistry, name: &str, sort: i32, kind: StationKind) -> Station {
        registry
            .create(StationCreate {
                tenant_id: "t1".to_string(),
                name: name.to_string(),
                kind,
                subtype: None,
                color: None,
                sort_order: sort,
            })
            .unwrap()
    }

    /// Manager over an in-memory store with grill -> plating -> pass
    fn setup() -> (PipelineManager, Vec<Station>) {
        let storage = PipelineStorage::open_in_memory().unwrap();
        let registry = Arc::new(StationRegistry::load(storage.clone()).unwrap());
        let stations = vec![
            create_station(&registry, "Grill", 10, StationKind::Production),
            create_station(&registry, "Plating", 20, StationKind::Production),
            create_station(&registry, "Pass", 30, StationKind::Dispatch),
        ];
        (PipelineManager::new(storage, registry), stations)
    }

    fn cmd(payload: KitchenCommandPayload) -> KitchenCommand {
        KitchenCommand::new(
            "t1".to_string(),
            "op-1".to_string(),
            "Test Operator".to_string(),
            payload,
        )
    }

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

    fn open_payload(order_id: &str, items: Vec<ItemInput>, is_draft: bool) -> KitchenCommandPayload {
        KitchenCommandPayload::OpenTicket {
            order_id: Some(order_id.to_string()),
            order_kind: Some("dine_in".to_string()),
            seating: Some("T1".to_string()),
            customer: None,
            note: None,
            is_draft,
            items,
        }
    }

    async fn open_with_one_item(manager: &PipelineManager, order_id: &str) -> String {
        let response = manager
            .process_command(cmd(open_payload(order_id, vec![item_input("p1")], false)))
            .await;
        assert!(response.success, "open failed: {:?}", response.error);
        response.ticket.unwrap().items[0].item_id.clone()
    }

    async fn advance(
        manager: &PipelineManager,
        order_id: &str,
        item_id: &str,
        expected: &str,
    ) -> CommandResponse {
        manager
            .process_command(cmd(KitchenCommandPayload::AdvanceItem {
                order_id: order_id.to_string(),
                item_id: item_id.to_string(),
                expected_station_id: expected.to_string(),
            }))
            .await
    }

    #[tokio::test]
    async fn test_full_walk_through_the_pipeline() {
        let (manager, stations) = setup();
        let (grill, plating, pass) = (&stations[0].id, &stations[1].id, &stations[2].id);
        let item_id = open_with_one_item(&manager, "order-1").await;

        let ticket = manager.get_ticket("order-1").unwrap().unwrap();
        assert_eq!(ticket.status, TicketStatus::Preparing);
        assert_eq!(ticket.items[0].station_id.as_deref(), Some(grill.as_str()));

        let response = advance(&manager, "order-1", &item_id, grill).await;
        assert!(response.success && !response.stale);
        assert_eq!(
            response.ticket.unwrap().items[0].station_id.as_deref(),
            Some(plating.as_str())
        );

        advance(&manager, "order-1", &item_id, plating).await;
        let response = advance(&manager, "order-1", &item_id, pass).await;
        let ticket = response.ticket.unwrap();
        assert_eq!(ticket.status, TicketStatus::Ready);
        assert!(ticket.ready_at.is_some());
        assert!(ticket.items[0].is_ready_to_serve());

        let response = manager
            .process_command(cmd(KitchenCommandPayload::ServeItem {
                order_id: "order-1".to_string(),
                item_id: item_id.clone(),
            }))
            .await;
        let ticket = response.ticket.unwrap();
        assert_eq!(ticket.items[0].status, ItemStatus::Delivered);
        // Ticket closure is explicit, never inferred from served items
        assert_eq!(ticket.status, TicketStatus::Ready);

        let response = manager
            .process_command(cmd(KitchenCommandPayload::FinalizeTicket {
                order_id: "order-1".to_string(),
            }))
            .await;
        let ticket = response.ticket.unwrap();
        assert_eq!(ticket.status, TicketStatus::Delivered);
        assert!(ticket.delivered_at.is_some());
        assert!(manager.get_active_tickets(Some("t1")).unwrap().is_empty());

        // Station log traces the full journey
        let log = manager.get_item_log(&item_id).unwrap();
        let trace: Vec<(String, LogAction)> = log
            .iter()
            .map(|e| (e.station_id.clone(), e.action))
            .collect();
        assert_eq!(
            trace,
            vec![
                (grill.clone(), LogAction::Entered),
                (grill.clone(), LogAction::Completed),
                (plating.clone(), LogAction::Entered),
                (plating.clone(), LogAction::Completed),
                (pass.clone(), LogAction::Entered),
                (pass.clone(), LogAction::Completed),
            ]
        );
    }

    #[tokio::test]
    async fn test_concurrent_double_advance_applies_once() {
        let (manager, stations) = setup();
        let (grill, plating) = (&stations[0].id, &stations[1].id);
        let item_id = open_with_one_item(&manager, "order-1").await;

        // Two terminals bump the same item; the second sees a precondition
        // mismatch and gets a stale no-op with the authoritative ticket
        let first = advance(&manager, "order-1", &item_id, grill).await;
        let second = advance(&manager, "order-1", &item_id, grill).await;

        assert!(first.success && !first.stale);
        assert!(second.success && second.stale);
        assert_eq!(
            second.warning.as_ref().unwrap().code,
            CommandErrorCode::StaleTransition
        );

        let ticket = manager.get_ticket("order-1").unwrap().unwrap();
        assert_eq!(ticket.items[0].station_id.as_deref(), Some(plating.as_str()));
    }

    #[tokio::test]
    async fn test_duplicate_command_id_is_applied_once() {
        let (manager, stations) = setup();
        let grill = &stations[0].id;
        let item_id = open_with_one_item(&manager, "order-1").await;

        let command = cmd(KitchenCommandPayload::AdvanceItem {
            order_id: "order-1".to_string(),
            item_id: item_id.clone(),
            expected_station_id: grill.clone(),
        });
        let first = manager.process_command(command.clone()).await;
        let retry = manager.process_command(command).await;

        assert!(first.success && !first.duplicate);
        assert!(retry.success && retry.duplicate);
        // Retry carries the current ticket so the terminal can reconcile
        let ticket = retry.ticket.unwrap();
        assert_eq!(
            ticket.items[0].station_id.as_deref(),
            Some(stations[1].id.as_str())
        );
    }

    #[tokio::test]
    async fn test_finalize_refused_until_all_items_served() {
        let (manager, stations) = setup();
        let grill = &stations[0].id;
        let item_id = open_with_one_item(&manager, "order-1").await;

        let response = manager
            .process_command(cmd(KitchenCommandPayload::FinalizeTicket {
                order_id: "order-1".to_string(),
            }))
            .await;
        assert!(!response.success);
        let error = response.error.unwrap();
        assert_eq!(error.code, CommandErrorCode::NotReady);
        assert_eq!(error.items, vec![item_id.clone()]);
        // The rejected response still carries the authoritative ticket
        assert!(response.ticket.is_some());

        advance(&manager, "order-1", &item_id, grill).await;
        advance(&manager, "order-1", &item_id, &stations[1].id).await;
        advance(&manager, "order-1", &item_id, &stations[2].id).await;
        manager
            .process_command(cmd(KitchenCommandPayload::ServeItem {
                order_id: "order-1".to_string(),
                item_id,
            }))
            .await;

        let response = manager
            .process_command(cmd(KitchenCommandPayload::FinalizeTicket {
                order_id: "order-1".to_string(),
            }))
            .await;
        assert!(response.success);
    }

    #[tokio::test]
    async fn test_skip_station_logs_skip_not_completion() {
        let (manager, stations) = setup();
        let (grill, plating) = (&stations[0].id, &stations[1].id);
        let item_id = open_with_one_item(&manager, "order-1").await;

        let response = manager
            .process_command(cmd(KitchenCommandPayload::SkipStation {
                order_id: "order-1".to_string(),
                item_id: item_id.clone(),
                expected_station_id: grill.clone(),
            }))
            .await;
        assert!(response.success);
        assert_eq!(
            response.ticket.unwrap().items[0].station_id.as_deref(),
            Some(plating.as_str())
        );

        let log = manager.get_item_log(&item_id).unwrap();
        assert_eq!(log[1].action, LogAction::Skipped);
        assert_eq!(log[1].station_id, *grill);
        assert_eq!(log[2].action, LogAction::Entered);
    }

    #[tokio::test]
    async fn test_skip_at_dispatch_rejected() {
        let (manager, stations) = setup();
        let item_id = open_with_one_item(&manager, "order-1").await;
        advance(&manager, "order-1", &item_id, &stations[0].id).await;
        advance(&manager, "order-1", &item_id, &stations[1].id).await;

        let response = manager
            .process_command(cmd(KitchenCommandPayload::SkipStation {
                order_id: "order-1".to_string(),
                item_id,
                expected_station_id: stations[2].id.clone(),
            }))
            .await;
        assert!(!response.success);
        assert_eq!(
            response.error.unwrap().code,
            CommandErrorCode::InvalidOperation
        );
    }

    #[tokio::test]
    async fn test_deactivated_station_is_routed_around() {
        let (manager, stations) = setup();
        let item_id = open_with_one_item(&manager, "order-1").await;

        manager
            .registry()
            .update(
                &stations[1].id,
                shared::models::StationUpdate {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();

        let response = advance(&manager, "order-1", &item_id, &stations[0].id).await;
        assert_eq!(
            response.ticket.unwrap().items[0].station_id.as_deref(),
            Some(stations[2].id.as_str())
        );
    }

    #[tokio::test]
    async fn test_dead_end_pipeline_holds_item_until_fixed() {
        let (manager, stations) = setup();
        let item_id = open_with_one_item(&manager, "order-1").await;

        for station in &stations[1..] {
            manager
                .registry()
                .update(
                    &station.id,
                    shared::models::StationUpdate {
                        is_active: Some(false),
                        ..Default::default()
                    },
                )
                .unwrap();
        }

        let response = advance(&manager, "order-1", &item_id, &stations[0].id).await;
        assert!(response.success);
        assert_eq!(
            response.warning.unwrap().code,
            CommandErrorCode::InvalidConfiguration
        );
        let ticket = response.ticket.unwrap();
        assert_eq!(
            ticket.items[0].station_id.as_deref(),
            Some(stations[0].id.as_str())
        );
        assert!(!ticket.items[0].is_ready_to_serve());

        // Fix the configuration: the held item can be advanced onward
        manager
            .registry()
            .update(
                &stations[2].id,
                shared::models::StationUpdate {
                    is_active: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();
        let response = advance(&manager, "order-1", &item_id, &stations[0].id).await;
        assert!(response.success && response.warning.is_none());
        assert_eq!(
            response.ticket.unwrap().items[0].station_id.as_deref(),
            Some(stations[2].id.as_str())
        );
    }

    #[tokio::test]
    async fn test_draft_open_and_submit() {
        let (manager, stations) = setup();
        let response = manager
            .process_command(cmd(open_payload("order-1", vec![item_input("p1")], true)))
            .await;
        let ticket = response.ticket.unwrap();
        assert!(ticket.is_draft);
        assert_eq!(ticket.status, TicketStatus::Pending);
        assert!(ticket.items[0].station_id.is_none());

        let response = manager
            .process_command(cmd(KitchenCommandPayload::SubmitDraft {
                order_id: "order-1".to_string(),
            }))
            .await;
        let ticket = response.ticket.unwrap();
        assert!(!ticket.is_draft);
        assert_eq!(ticket.status, TicketStatus::Preparing);
        assert_eq!(
            ticket.items[0].station_id.as_deref(),
            Some(stations[0].id.as_str())
        );
    }

    #[tokio::test]
    async fn test_cancel_item_and_ticket() {
        let (manager, _stations) = setup();
        let item_id = open_with_one_item(&manager, "order-1").await;

        let response = manager
            .process_command(cmd(KitchenCommandPayload::CancelItem {
                order_id: "order-1".to_string(),
                item_id: item_id.clone(),
                reason: Some("86".to_string()),
            }))
            .await;
        assert_eq!(
            response.ticket.unwrap().item(&item_id).unwrap().status,
            ItemStatus::Cancelled
        );

        let response = manager
            .process_command(cmd(KitchenCommandPayload::CancelTicket {
                order_id: "order-1".to_string(),
                reason: None,
            }))
            .await;
        assert_eq!(response.ticket.unwrap().status, TicketStatus::Cancelled);
        assert!(manager.get_active_tickets(Some("t1")).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_advance_unknown_order() {
        let (manager, stations) = setup();
        let response = advance(&manager, "missing", "i1", &stations[0].id).await;
        assert!(!response.success);
        assert_eq!(
            response.error.unwrap().code,
            CommandErrorCode::OrderNotFound
        );
    }

    #[tokio::test]
    async fn test_event_stream_is_globally_ordered() {
        let (manager, stations) = setup();
        let a = open_with_one_item(&manager, "order-1").await;
        open_with_one_item(&manager, "order-2").await;
        advance(&manager, "order-1", &a, &stations[0].id).await;

        let events = manager.get_events_since(0).unwrap();
        let sequences: Vec<u64> = events.iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, (1..=sequences.len() as u64).collect::<Vec<_>>());
        assert_eq!(manager.get_current_sequence().unwrap(), *sequences.last().unwrap());
    }

    #[tokio::test]
    async fn test_rebuild_matches_stored_snapshot() {
        let (manager, stations) = setup();
        let item_id = open_with_one_item(&manager, "order-1").await;
        advance(&manager, "order-1", &item_id, &stations[0].id).await;
        advance(&manager, "order-1", &item_id, &stations[1].id).await;

        let stored = manager.get_ticket("order-1").unwrap().unwrap();
        let rebuilt = manager.rebuild_ticket("order-1").unwrap().unwrap();
        assert_eq!(stored, rebuilt);
    }

    #[tokio::test]
    async fn test_committed_events_are_broadcast() {
        let (manager, _stations) = setup();
        let mut rx = manager.subscribe();
        open_with_one_item(&manager, "order-1").await;

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.sequence, 1);
        assert_eq!(second.sequence, 2);
        assert_eq!(first.order_id, "order-1");
    }
}
