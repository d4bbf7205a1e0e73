//! Incremental terminal sync
//!
//! A reconnecting terminal sends the last sequence it applied and gets the
//! events it missed plus full snapshots of the open tickets. If its
//! sequence is from another store epoch (server reinstalled, database
//! replaced) it is told to drop local state and take the snapshots.

use crate::pipeline::manager::PipelineManager;
use crate::pipeline::storage::StorageError;
use shared::kitchen::SyncResponse;

impl PipelineManager {
    /// Build the catch-up payload for a terminal of the given tenant
    pub fn sync_since(
        &self,
        tenant_id: &str,
        since_sequence: u64,
    ) -> Result<SyncResponse, StorageError> {
        let server_sequence = self.get_current_sequence()?;

        // A client ahead of the server is holding state from a different
        // epoch; incremental replay would be meaningless
        let requires_full_sync = since_sequence > server_sequence;

        let events = if requires_full_sync {
            Vec::new()
        } else {
            self.get_events_since(since_sequence)?
                .into_iter()
                .filter(|e| e.tenant_id == tenant_id)
                .collect()
        };

        let active_tickets = self.get_active_tickets(Some(tenant_id))?;

        Ok(SyncResponse {
            events,
            active_tickets,
            server_sequence,
            epoch: self.epoch().to_string(),
            requires_full_sync,
        })
    }
}
