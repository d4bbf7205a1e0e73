//! End-to-end ticket flow against a fully initialized server state
//!
//! Uses ServerState::initialize with a real on-disk database, the same
//! path production takes.

use kds_server::{Config, ServerState};
use shared::kitchen::{
    ItemInput, KitchenCommand, KitchenCommandPayload, TicketStatus,
};
use shared::models::{StationCreate, StationKind};

fn command(tenant_id: &str, payload: KitchenCommandPayload) -> KitchenCommand {
    KitchenCommand::new(
        tenant_id.to_string(),
        "op-1".to_string(),
        "Test Operator".to_string(),
        payload,
    )
}

fn item(name: &str) -> ItemInput {
    ItemInput {
        product_id: format!("prod-{name}"),
        product_name: name.to_string(),
        variation: None,
        quantity: 1,
        note: None,
        extras: vec![],
    }
}

fn station(tenant_id: &str, name: &str, kind: StationKind, sort_order: i32) -> StationCreate {
    StationCreate {
        tenant_id: tenant_id.to_string(),
        name: name.to_string(),
        kind,
        subtype: None,
        color: None,
        sort_order,
    }
}

async fn state_in(dir: &std::path::Path) -> ServerState {
    let config = Config::with_overrides(dir.to_string_lossy().to_string(), 0);
    ServerState::initialize(&config).await.unwrap()
}

#[tokio::test]
async fn test_full_ticket_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let state = state_in(dir.path()).await;
    let tenant = "t1";

    let registry = state.manager.registry();
    let grill = registry
        .create(station(tenant, "Grill", StationKind::Production, 10))
        .unwrap();
    let plating = registry
        .create(station(tenant, "Plating", StationKind::Production, 20))
        .unwrap();
    let pass = registry
        .create(station(tenant, "Pass", StationKind::Dispatch, 30))
        .unwrap();

    // Open a ticket with two items; both queue at the grill
    let response = state
        .manager
        .process_command(command(
            tenant,
            KitchenCommandPayload::OpenTicket {
                order_id: None,
                order_kind: Some("dine_in".to_string()),
                seating: Some("T5".to_string()),
                customer: None,
                note: None,
                is_draft: false,
                items: vec![item("Burger"), item("Fries")],
            },
        ))
        .await;
    assert!(response.success, "{:?}", response.error);
    let order_id = response.order_id.unwrap();
    let ticket = response.ticket.unwrap();
    let burger = ticket.items[0].item_id.clone();
    let fries = ticket.items[1].item_id.clone();
    assert!(ticket.items.iter().all(|i| i.station_id.as_deref() == Some(grill.id.as_str())));

    // Walk the burger through the pipeline and serve it
    for (item_id, expected) in [(&burger, &grill), (&burger, &plating), (&burger, &pass)] {
        let response = state
            .manager
            .process_command(command(
                tenant,
                KitchenCommandPayload::AdvanceItem {
                    order_id: order_id.clone(),
                    item_id: item_id.clone(),
                    expected_station_id: expected.id.clone(),
                },
            ))
            .await;
        assert!(response.success, "{:?}", response.error);
        assert!(!response.stale);
    }
    let response = state
        .manager
        .process_command(command(
            tenant,
            KitchenCommandPayload::ServeItem {
                order_id: order_id.clone(),
                item_id: burger.clone(),
            },
        ))
        .await;
    assert!(response.success);

    // The fries get cancelled, which unblocks finalization
    let response = state
        .manager
        .process_command(command(
            tenant,
            KitchenCommandPayload::CancelItem {
                order_id: order_id.clone(),
                item_id: fries.clone(),
                reason: Some("Out of stock".to_string()),
            },
        ))
        .await;
    assert!(response.success);

    let response = state
        .manager
        .process_command(command(
            tenant,
            KitchenCommandPayload::FinalizeTicket {
                order_id: order_id.clone(),
            },
        ))
        .await;
    assert!(response.success, "{:?}", response.error);
    assert_eq!(response.ticket.unwrap().status, TicketStatus::Delivered);

    // Finalized tickets leave the active set but remain queryable
    assert!(state.manager.get_active_tickets(Some(tenant)).unwrap().is_empty());
    assert!(state.manager.get_ticket(&order_id).unwrap().is_some());

    // The burger visited all three stations
    let log = state.manager.get_item_log(&burger).unwrap();
    let visited: Vec<&str> = log.iter().map(|e| e.station_id.as_str()).collect();
    assert!(visited.contains(&grill.id.as_str()));
    assert!(visited.contains(&plating.id.as_str()));
    assert!(visited.contains(&pass.id.as_str()));
}

#[tokio::test]
async fn test_state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let tenant = "t1";

    let (order_id, first_epoch) = {
        let state = state_in(dir.path()).await;
        state
            .manager
            .registry()
            .create(station(tenant, "Grill", StationKind::Production, 10))
            .unwrap();
        let response = state
            .manager
            .process_command(command(
                tenant,
                KitchenCommandPayload::OpenTicket {
                    order_id: None,
                    order_kind: None,
                    seating: None,
                    customer: None,
                    note: None,
                    is_draft: false,
                    items: vec![item("Burger")],
                },
            ))
            .await;
        assert!(response.success);
        (response.order_id.unwrap(), state.manager.epoch().to_string())
    };

    // Reopen the same database
    let state = state_in(dir.path()).await;

    let ticket = state.manager.get_ticket(&order_id).unwrap().unwrap();
    assert_eq!(ticket.status, TicketStatus::Preparing);
    assert_eq!(state.manager.registry().all_for_tenant(tenant).len(), 1);

    // A fresh process is a fresh epoch; clients resync from zero
    assert_ne!(state.manager.epoch(), first_epoch);

    let sync = state.manager.sync_since(tenant, 0).unwrap();
    assert_eq!(sync.active_tickets.len(), 1);
    assert_eq!(sync.server_sequence, sync.events.last().unwrap().sequence);
}
