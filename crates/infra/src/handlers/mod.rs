//! Event handler wiring for the consumer service.
//!
//! All handlers are idempotent: the dedup window is bounded, so a duplicate
//! delivery that falls outside it reaches the handler again.

pub mod order;
pub mod product;

use std::sync::Arc;
use std::time::Duration;

use mercora_cache::TieredCache;
use mercora_catalog::ProductRepository;
use mercora_events::bus::{EventConsumer, EventHandler, TransportError};
use mercora_events::topic;

/// Subscribe the standard lifecycle handlers on `consumer`.
pub fn register_event_handlers(
    consumer: &dyn EventConsumer,
    products: Arc<dyn ProductRepository>,
    cache: Arc<TieredCache>,
    cache_ttl: Duration,
) -> Result<(), TransportError> {
    let updated: EventHandler = {
        let products = products.clone();
        let cache = cache.clone();
        Arc::new(move |envelope| {
            product::on_product_updated(envelope, products.as_ref(), &cache, cache_ttl)
        })
    };
    consumer.subscribe(topic::PRODUCT_UPDATED, updated)?;

    let deleted: EventHandler = {
        let cache = cache.clone();
        Arc::new(move |envelope| product::on_product_deleted(envelope, &cache))
    };
    consumer.subscribe(topic::PRODUCT_DELETED, deleted)?;

    let created: EventHandler =
        Arc::new(move |envelope| order::on_order_created(envelope, products.as_ref()));
    consumer.subscribe(topic::ORDER_CREATED, created)?;

    Ok(())
}
