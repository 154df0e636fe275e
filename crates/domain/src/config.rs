//! Configuration management

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_FLUSH_INTERVAL_SECS, DEFAULT_FLUSH_TIMEOUT_SECS, DEFAULT_POOL_SIZE,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_STORE_PATH, MAX_REPLAY_ATTEMPTS,
};
use crate::errors::{FieldSyncError, Result};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub replay: ReplayConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

impl Config {
    /// Reject settings no component can run with.
    pub fn validate(&self) -> Result<()> {
        if self.store.path.trim().is_empty() {
            return Err(FieldSyncError::Config("store.path must not be empty".into()));
        }
        if self.store.pool_size == 0 {
            return Err(FieldSyncError::Config("store.pool_size must be at least 1".into()));
        }
        if self.replay.max_attempts == 0 {
            return Err(FieldSyncError::Config("replay.max_attempts must be at least 1".into()));
        }
        if self.replay.flush_interval_seconds == 0 {
            return Err(FieldSyncError::Config(
                "replay.flush_interval_seconds must be at least 1".into(),
            ));
        }
        if self.replay.flush_timeout_seconds == 0 {
            return Err(FieldSyncError::Config(
                "replay.flush_timeout_seconds must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Which durable backend holds the queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Sqlite,
    File,
}

crate::impl_domain_status_conversions!(StoreBackend {
    Sqlite => "sqlite",
    File => "file",
});

/// Durable queue store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub path: String,
    pub pool_size: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Sqlite,
            path: DEFAULT_STORE_PATH.to_string(),
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

/// Replay configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Failed attempts after which a queued item is abandoned.
    pub max_attempts: u32,
    pub flush_interval_seconds: u64,
    /// Upper bound for a single replayed send.
    pub flush_timeout_seconds: u64,
    /// Whether the background replay worker runs.
    pub enabled: bool,
}

impl ReplayConfig {
    pub const fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_seconds)
    }

    pub const fn flush_timeout(&self) -> Duration {
        Duration::from_secs(self.flush_timeout_seconds)
    }
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            max_attempts: MAX_REPLAY_ATTEMPTS,
            flush_interval_seconds: DEFAULT_FLUSH_INTERVAL_SECS,
            flush_timeout_seconds: DEFAULT_FLUSH_TIMEOUT_SECS,
            enabled: true,
        }
    }
}

/// Remote API configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL that relative mutation targets are resolved against.
    pub base_url: Option<String>,
    pub request_timeout_seconds: u64,
    pub user_agent: Option<String>,
}

impl ApiConfig {
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            request_timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECS,
            user_agent: None,
        }
    }
}
