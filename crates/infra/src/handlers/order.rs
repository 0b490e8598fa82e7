//! Order event observation.

use tracing::{info, warn};

use mercora_catalog::ProductRepository;
use mercora_events::Envelope;
use mercora_events::bus::HandlerError;
use mercora_orders::OrderCreatedEvent;

/// `order.created`: audit the fulfilled order against the catalog.
///
/// Stock was already decremented transactionally by the order write path; the
/// consumer only observes and logs. Mutating stock here would double-count on
/// redelivery.
pub fn on_order_created(
    envelope: &Envelope,
    products: &dyn ProductRepository,
) -> Result<(), HandlerError> {
    let event: OrderCreatedEvent = envelope.decode()?;

    info!(
        order_id = %event.order_id,
        user_id = %event.user_id,
        total_price = event.total_price,
        item_count = event.items.len(),
        "order created"
    );

    for item in &event.items {
        match products.get(item.product_id) {
            Ok(product) => info!(
                order_id = %event.order_id,
                product_id = %product.id,
                name = %product.name,
                quantity = item.quantity,
                remaining_stock = product.stock,
                "order line"
            ),
            Err(e) => warn!(
                order_id = %event.order_id,
                product_id = %item.product_id,
                error = %e,
                "order references unknown product"
            ),
        }
    }

    Ok(())
}
