//! Infrastructure layer: Redis adapters, configuration, event handler wiring.

pub mod cache_store;
pub mod config;
pub mod event_bus;
pub mod handlers;

#[cfg(test)]
mod integration_tests;

pub use config::AppConfig;
pub use handlers::register_event_handlers;

#[cfg(feature = "redis")]
pub use cache_store::redis::RedisSharedStore;
#[cfg(feature = "redis")]
pub use event_bus::redis_pubsub::RedisEventBus;
