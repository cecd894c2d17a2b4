//! Configuration for the permission store.
//!
//! Resolution order (lowest to highest priority):
//! 1. Built-in defaults
//! 2. Optional JSON config file
//! 3. Environment variables / CLI arguments (applied by the binary)

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::connection::LifecycleConfig;
use crate::error::{Error, Result};

/// Connection descriptor and lifecycle timings for the permission store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// `SQLite` connection descriptor.
    pub connection_url: String,
    /// Maximum time `close` waits for in-flight operations (milliseconds).
    pub close_grace_period_ms: u64,
    /// How often `close` re-checks the in-flight counter (milliseconds).
    pub close_poll_interval_ms: u64,
    /// Delay between reconnect attempts after a failed start (milliseconds).
    pub retry_interval_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            connection_url: "sqlite:gatekeeper.db?mode=rwc".to_string(),
            close_grace_period_ms: 60 * 1000,
            close_poll_interval_ms: 5000,
            retry_interval_ms: 35 * 1000,
        }
    }
}

impl StoreConfig {
    /// Load from a JSON file; missing keys fall back to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.connection_url.trim().is_empty() {
            return Err(Error::Config("connection_url must not be empty".to_string()));
        }
        if self.close_poll_interval_ms == 0 {
            return Err(Error::Config("close_poll_interval_ms must be positive".to_string()));
        }
        if self.retry_interval_ms == 0 {
            return Err(Error::Config("retry_interval_ms must be positive".to_string()));
        }
        Ok(())
    }

    pub const fn lifecycle(&self) -> LifecycleConfig {
        LifecycleConfig {
            close_grace_period: Duration::from_millis(self.close_grace_period_ms),
            close_poll_interval: Duration::from_millis(self.close_poll_interval_ms),
            retry_interval: Duration::from_millis(self.retry_interval_ms),
        }
    }
}
