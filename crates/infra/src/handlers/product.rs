//! Cache maintenance driven by product lifecycle events.

use std::time::Duration;

use tracing::info;

use mercora_cache::{TieredCache, keys};
use mercora_catalog::ProductRepository;
use mercora_catalog::events::{ProductDeletedEvent, ProductUpdatedEvent};
use mercora_core::DomainError;
use mercora_events::Envelope;
use mercora_events::bus::HandlerError;

/// `product.updated`: refresh the cache from the system of record.
///
/// The event payload carries a snapshot, but a peer may have written again
/// since it was published; re-reading the repository makes the handler safe
/// against out-of-order delivery and trivially idempotent.
pub fn on_product_updated(
    envelope: &Envelope,
    products: &dyn ProductRepository,
    cache: &TieredCache,
    cache_ttl: Duration,
) -> Result<(), HandlerError> {
    let event: ProductUpdatedEvent = envelope.decode()?;

    match products.get(event.product_id) {
        Ok(product) => {
            cache.set(&keys::product(product.id), &product, cache_ttl);
            info!(product_id = %product.id, "cache refreshed for updated product");
        }
        Err(DomainError::NotFound) => {
            // Deleted since the event was published; drop the stale entry.
            cache.delete(&keys::product(event.product_id));
            info!(product_id = %event.product_id, "updated product no longer exists; cache evicted");
        }
        Err(e) => return Err(HandlerError::failed(e.to_string())),
    }

    cache.delete(&keys::products_list());
    Ok(())
}

/// `product.deleted`: evict the product and the listing.
pub fn on_product_deleted(envelope: &Envelope, cache: &TieredCache) -> Result<(), HandlerError> {
    let event: ProductDeletedEvent = envelope.decode()?;

    cache.delete(&keys::product(event.product_id));
    cache.delete(&keys::products_list());

    info!(product_id = %event.product_id, "cache evicted for deleted product");
    Ok(())
}
