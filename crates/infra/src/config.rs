//! Environment-driven configuration.
//!
//! Every knob has a default; an unparsable value falls back to the default
//! with a warning rather than failing startup.

use std::time::Duration;

use tracing::warn;

use mercora_cache::CacheConfig;
use mercora_events::EventDeduplicator;
use mercora_events::dispatch::DEFAULT_HANDLER_TIMEOUT;

pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
pub const DEFAULT_CHANNEL_PREFIX: &str = "mercora.events.";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub redis_url: String,
    /// Prepended to topic names to form Redis channel names.
    pub channel_prefix: String,
    /// TTL for cached products, product listings, and orders.
    pub cache_ttl: Duration,
    /// TTL for local-tier entries repopulated from a shared-tier hit.
    pub local_populate_ttl: Duration,
    /// Interval for the local-tier background sweep.
    pub sweep_interval: Duration,
    /// Per-delivery handler timeout.
    pub handler_timeout: Duration,
    /// Size of the recently-seen event id window.
    pub dedup_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            redis_url: DEFAULT_REDIS_URL.to_string(),
            channel_prefix: DEFAULT_CHANNEL_PREFIX.to_string(),
            cache_ttl: Duration::from_secs(300),
            local_populate_ttl: Duration::from_secs(60),
            sweep_interval: Duration::from_secs(300),
            handler_timeout: DEFAULT_HANDLER_TIMEOUT,
            dedup_capacity: EventDeduplicator::DEFAULT_CAPACITY,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            redis_url: std::env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            channel_prefix: std::env::var("EVENT_CHANNEL_PREFIX")
                .unwrap_or(defaults.channel_prefix),
            cache_ttl: env_duration_secs("CACHE_TTL_SECS", defaults.cache_ttl),
            local_populate_ttl: env_duration_secs(
                "CACHE_LOCAL_POPULATE_TTL_SECS",
                defaults.local_populate_ttl,
            ),
            sweep_interval: env_duration_secs("CACHE_SWEEP_INTERVAL_SECS", defaults.sweep_interval),
            handler_timeout: env_duration_secs("HANDLER_TIMEOUT_SECS", defaults.handler_timeout),
            dedup_capacity: env_usize("EVENT_DEDUP_CAPACITY", defaults.dedup_capacity),
        }
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            local_populate_ttl: self.local_populate_ttl,
            sweep_interval: self.sweep_interval,
        }
    }

    /// `topic -> Redis channel` mapping.
    pub fn channel_for(&self, topic: &str) -> String {
        format!("{}{}", self.channel_prefix, topic)
    }
}

fn env_duration_secs(name: &str, default: Duration) -> Duration {
    match std::env::var(name) {
        Ok(raw) => match raw.parse::<u64>() {
            Ok(secs) => Duration::from_secs(secs),
            Err(_) => {
                warn!(name, value = %raw, "unparsable duration; using default");
                default
            }
        },
        Err(_) => default,
    }
}

fn env_usize(name: &str, default: usize) -> usize {
    match std::env::var(name) {
        Ok(raw) => match raw.parse::<usize>() {
            Ok(v) => v,
            Err(_) => {
                warn!(name, value = %raw, "unparsable integer; using default");
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = AppConfig::default();
        assert_eq!(config.redis_url, DEFAULT_REDIS_URL);
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert_eq!(config.sweep_interval, Duration::from_secs(300));
        assert_eq!(config.dedup_capacity, 1024);
    }

    #[test]
    fn channel_mapping_prefixes_the_topic() {
        let config = AppConfig::default();
        assert_eq!(
            config.channel_for("order.created"),
            "mercora.events.order.created"
        );
    }
}
