//! Cache configuration.
//!
//! Controls the gallery snapshot cache via the `[cache]` section of
//! `galleria.toml`.

use std::time::Duration;

const DEFAULT_STALE_AFTER_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Serve snapshots from memory at all.
    pub enabled: bool,
    /// Maximum age at which a snapshot is served without re-querying tiers.
    pub stale_after: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            stale_after: Duration::from_secs(DEFAULT_STALE_AFTER_SECS),
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            stale_after: settings.stale_after,
        }
    }
}
