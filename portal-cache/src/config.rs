//! Cache configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use portal_core::constants::DEFAULT_CACHE_TTL_SECS;

/// Cache configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CacheConfig {
    /// How long a loaded value stays fresh
    pub ttl: Duration,
    /// Upper bound on a single loader call (None = wait indefinitely)
    #[serde(default)]
    pub load_timeout: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            load_timeout: None,
        }
    }
}

impl CacheConfig {
    /// Creates a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Bounds every loader call with a timeout.
    pub fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = Some(timeout);
        self
    }
}
