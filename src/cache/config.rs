//! Cache configuration.
//!
//! Controlled by the `[cache]` section of `cafe.toml`.

use std::time::Duration;

const DEFAULT_TTL_SECONDS: u64 = 7 * 24 * 60 * 60;
const DEFAULT_SWEEP_INTERVAL_SECONDS: u64 = 10 * 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// When false every read goes straight to the database.
    pub enabled: bool,
    /// Lifetime of a populated slot.
    pub ttl: Duration,
    /// Period of the background purge of expired slots.
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: Duration::from_secs(DEFAULT_TTL_SECONDS),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECONDS),
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            ttl: Duration::from_secs(settings.ttl_seconds),
            sweep_interval: Duration::from_secs(settings.sweep_interval_seconds),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = CacheConfig::default();
        assert!(config.enabled);
        assert_eq!(config.ttl, Duration::from_secs(604_800));
        assert_eq!(config.sweep_interval, Duration::from_secs(600));
    }
}
