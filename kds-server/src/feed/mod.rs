//! Event feed fan-out
//!
//! One broadcast channel per tenant, fed by a router task that drains the
//! manager's committed-event stream. Station terminals subscribe to their
//! tenant channel and filter by station on the SSE edge.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use shared::kitchen::KitchenEvent;

const TENANT_CHANNEL_CAPACITY: usize = 256;

/// Per-tenant feed channels
#[derive(Default)]
pub struct FeedHub {
    channels: DashMap<String, broadcast::Sender<Arc<KitchenEvent>>>,
}

impl FeedHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to a tenant's event feed
    pub fn subscribe(&self, tenant_id: &str) -> broadcast::Receiver<Arc<KitchenEvent>> {
        self.channels
            .entry(tenant_id.to_string())
            .or_insert_with(|| broadcast::channel(TENANT_CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Route one event to its tenant's channel. Events for tenants with no
    /// subscribers are dropped.
    pub fn publish(&self, event: Arc<KitchenEvent>) {
        if let Some(tx) = self.channels.get(&event.tenant_id) {
            let _ = tx.send(event);
        }
    }

    /// Router task: drain the manager's committed-event stream until
    /// shutdown
    pub async fn run(
        self: Arc<Self>,
        mut events: broadcast::Receiver<Arc<KitchenEvent>>,
        cancel: CancellationToken,
    ) {
        tracing::info!("Feed router started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Feed router stopping");
                    break;
                }
                result = events.recv() => match result {
                    Ok(event) => self.publish(event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // Subscribers recover through /sync; just record it
                        tracing::warn!("Feed router lagged, {} event(s) skipped", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("Event stream closed, feed router exiting");
                        break;
                    }
                },
            }
        }
    }
}
