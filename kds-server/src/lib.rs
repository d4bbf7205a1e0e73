//! KDS Server - kitchen order fulfillment pipeline
//!
//! # Architecture
//!
//! Terminals submit commands; the pipeline manager validates them against
//! current snapshots, records immutable events under a global sequence, and
//! broadcasts the committed events to subscribed kitchen screens.
//!
//! # Module structure
//!
//! ```text
//! kds-server/src/
//! ├── core/      # configuration, state, HTTP server lifecycle
//! ├── api/       # HTTP routes and handlers
//! ├── pipeline/  # commands, events, snapshots, persistence
//! ├── stations/  # station registry
//! ├── board/     # read-side projections for kitchen screens
//! ├── feed/      # per-tenant live event fan-out
//! └── utils/     # errors, logging
//! ```

pub mod api;
pub mod board;
pub mod core;
pub mod feed;
pub mod pipeline;
pub mod stations;
pub mod utils;

// Re-export public types
pub use crate::core::{Config, Server, ServerState};
pub use feed::FeedHub;
pub use pipeline::{PipelineManager, PipelineStorage};
pub use stations::StationRegistry;
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// Load .env and initialize logging from the resulting environment
pub fn setup_environment() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_dir = std::env::var("LOG_DIR").ok();
    init_logger_with_file(log_level.as_deref(), log_dir.as_deref());

    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
    __ __ ____  _____
   / //_// __ \/ ___/
  / ,<  / / / /\__ \
 / /| |/ /_/ /___/ /
/_/ |_/_____//____/
    "#
    );
}
