//! Server state - shared handles for all HTTP handlers

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::core::Config;
use crate::feed::FeedHub;
use crate::pipeline::{PipelineManager, PipelineStorage};
use crate::stations::StationRegistry;

/// Shared server state
///
/// Cheap to clone: everything behind it is an `Arc`.
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub manager: Arc<PipelineManager>,
    pub feed: Arc<FeedHub>,
}

impl ServerState {
    /// Initialize storage, warm the station registry, and wire the manager
    pub async fn initialize(config: &Config) -> anyhow::Result<Self> {
        config.ensure_work_dir_structure()?;

        let storage = PipelineStorage::open(config.db_path())?;
        let registry = Arc::new(StationRegistry::load(storage.clone())?);
        let manager = Arc::new(PipelineManager::new(storage, registry));
        tracing::info!(
            "Pipeline initialized, epoch {}, sequence {}",
            manager.epoch(),
            manager.get_current_sequence()?
        );

        Ok(Self {
            config: config.clone(),
            manager,
            feed: Arc::new(FeedHub::new()),
        })
    }

    /// Spawn the feed router task
    pub fn start_background_tasks(
        &self,
        cancel: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        let hub = self.feed.clone();
        let events = self.manager.subscribe();
        tokio::spawn(hub.run(events, cancel))
    }
}
