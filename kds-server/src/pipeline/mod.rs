//! Kitchen order fulfillment pipeline
//!
//! Event-sourced engine: commands from terminals are validated against
//! current snapshots, committed as events under a global sequence, and
//! folded back into snapshots inside the same transaction.
//!
//! - [`manager`] - command processing and queries
//! - [`actions`] - one command handler per command type
//! - [`appliers`] - one pure applier per event type
//! - [`storage`] - redb persistence
//! - [`sync`] - terminal catch-up protocol
//! - [`traits`] - the handler/applier contracts

pub mod actions;
pub mod appliers;
pub mod manager;
pub mod storage;
pub mod sync;
pub mod traits;

pub use manager::PipelineManager;
pub use storage::{PipelineStorage, StorageError, StorageStats};
pub use traits::{
    ActionOutcome, CommandContext, CommandHandler, CommandMetadata, EventApplier, PipelineError,
};
