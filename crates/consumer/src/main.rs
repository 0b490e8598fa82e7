//! Consumer service: subscribes to lifecycle events and maintains the cache.
//!
//! Startup connections are fatal (nothing useful runs without the transport);
//! everything after startup degrades with a log line instead.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use mercora_cache::TieredCache;
use mercora_catalog::{InMemoryProductRepository, ProductRepository};
use mercora_events::EventConsumer;
use mercora_infra::{AppConfig, RedisEventBus, RedisSharedStore, register_event_handlers};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    mercora_observability::init();

    let config = AppConfig::from_env();
    info!(redis_url = %config.redis_url, channel_prefix = %config.channel_prefix, "starting consumer");

    let bus = Arc::new(
        RedisEventBus::connect(
            &config.redis_url,
            config.channel_prefix.clone(),
            config.dedup_capacity,
            config.handler_timeout,
        )
        .context("failed to connect event bus")?,
    );

    let store = RedisSharedStore::connect(&config.redis_url)
        .context("failed to connect shared cache store")?;
    let cache = Arc::new(TieredCache::with_config(
        Arc::new(store),
        config.cache_config(),
    ));
    let sweeper = cache.start_sweeper();

    // Catalog persistence is an external collaborator. With the in-memory
    // repository the updated-product handler sees only products written by
    // this process and otherwise degrades to eviction, which is safe: the
    // next read repopulates from the system of record.
    let products: Arc<dyn ProductRepository> = Arc::new(InMemoryProductRepository::new());

    register_event_handlers(bus.as_ref(), products, cache.clone(), config.cache_ttl)
        .context("failed to register event handlers")?;
    info!("event handlers registered; consumer running");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutdown signal received");

    bus.close();
    sweeper.shutdown();
    info!("consumer stopped");
    Ok(())
}
