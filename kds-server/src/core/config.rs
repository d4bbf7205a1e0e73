//! Server configuration
//!
//! # Environment variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | WORK_DIR | /var/lib/kds | Working directory (database, logs) |
//! | HTTP_PORT | 3000 | HTTP API port |
//! | ENVIRONMENT | development | Runtime environment |
//! | LOG_LEVEL | info | Log verbosity |
//! | SLA_WARN_MINUTES | 10 | Minutes before an item turns yellow |
//! | SLA_LATE_MINUTES | 20 | Minutes before an item turns red |
//!
//! # Example
//!
//! ```ignore
//! WORK_DIR=/data/kds HTTP_PORT=8080 cargo run
//! ```

use shared::kitchen::SlaThresholds;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory holding the database and log files
    pub work_dir: String,
    /// HTTP API port
    pub http_port: u16,
    /// Runtime environment: development | staging | production
    pub environment: String,
    /// Log verbosity (trace | debug | info | warn | error)
    pub log_level: String,
    /// Minutes before board items classify yellow
    pub sla_warn_minutes: i64,
    /// Minutes before board items classify red
    pub sla_late_minutes: i64,
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults where unset
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/kds".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            sla_warn_minutes: std::env::var("SLA_WARN_MINUTES")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(10),
            sla_late_minutes: std::env::var("SLA_LATE_MINUTES")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(20),
        }
    }

    /// Override work_dir and port, mainly for tests
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Database file path under the working directory
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("kitchen.redb")
    }

    /// Log directory under the working directory
    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    /// Create the working directory layout if missing
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.work_dir)?;
        std::fs::create_dir_all(self.log_dir())?;
        Ok(())
    }

    /// SLA thresholds configured for this deployment
    pub fn sla_thresholds(&self) -> SlaThresholds {
        SlaThresholds {
            warn_minutes: self.sla_warn_minutes,
            late_minutes: self.sla_late_minutes,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
