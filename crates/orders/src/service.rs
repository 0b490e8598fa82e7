//! Order creation/cancellation with stock reservation and compensation.
//!
//! Stock is decremented item by item during creation. If any later step fails
//! (insufficient stock, missing product, persistence), every decrement already
//! applied is restored before the error is returned. Cancellation restores the
//! full order's stock before committing the status change.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use mercora_cache::{TieredCache, keys};
use mercora_catalog::ProductRepository;
use mercora_core::{DomainError, DomainResult, OrderId, OrderItemId, ProductId, UserId};
use mercora_events::bus::{self, EventProducer};
use mercora_events::topic;

use crate::events::OrderCreatedEvent;
use crate::order::{Order, OrderItem, OrderStatus};
use crate::repository::OrderRepository;

/// One requested line of a new order. Price is looked up at creation time, not
/// supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

pub struct OrderService {
    orders: Arc<dyn OrderRepository>,
    products: Arc<dyn ProductRepository>,
    cache: Arc<TieredCache>,
    producer: Arc<dyn EventProducer>,
    cache_ttl: Duration,
}

impl OrderService {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        products: Arc<dyn ProductRepository>,
        cache: Arc<TieredCache>,
        producer: Arc<dyn EventProducer>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            orders,
            products,
            cache,
            producer,
            cache_ttl,
        }
    }

    /// Create an order: reserve stock per item (in request order), persist the
    /// pending order, then update caches and publish `order.created`.
    ///
    /// Failure anywhere after the first reservation restores all prior
    /// reservations before returning.
    pub fn create_order(&self, user_id: UserId, items: &[NewOrderItem]) -> DomainResult<Order> {
        if items.is_empty() {
            return Err(DomainError::validation("order must contain at least one item"));
        }

        let order_id = OrderId::new();
        // (product, quantity) pairs whose stock decrement has been committed.
        let mut applied: Vec<(ProductId, u32)> = Vec::with_capacity(items.len());
        let mut lines: Vec<OrderItem> = Vec::with_capacity(items.len());

        for item in items {
            match self.reserve_item(order_id, item) {
                Ok(line) => {
                    applied.push((item.product_id, item.quantity));
                    lines.push(line);
                }
                Err(e) => {
                    self.restore_stock(&applied);
                    return Err(e);
                }
            }
        }

        let order = Order::pending(order_id, user_id, lines);
        if let Err(e) = self.orders.create(&order) {
            self.restore_stock(&applied);
            return Err(e);
        }

        self.cache.set(&keys::order(order.id), &order, self.cache_ttl);
        self.cache.delete(&keys::user_orders(order.user_id));

        bus::publish_best_effort(
            self.producer.as_ref(),
            topic::ORDER_CREATED,
            &OrderCreatedEvent::from_order(&order),
        );

        info!(
            order_id = %order.id,
            user_id = %order.user_id,
            total_price = order.total_price,
            "order created"
        );
        Ok(order)
    }

    /// Read-through: cache first, repository on miss (repopulating the cache).
    pub fn get_order(&self, id: OrderId) -> DomainResult<Order> {
        let key = keys::order(id);
        if let Some(order) = self.cache.get::<Order>(&key) {
            return Ok(order);
        }

        let order = self.orders.get(id)?;
        self.cache.set(&key, &order, self.cache_ttl);
        Ok(order)
    }

    pub fn orders_for_user(&self, user_id: UserId) -> DomainResult<Vec<Order>> {
        let key = keys::user_orders(user_id);
        if let Some(orders) = self.cache.get::<Vec<Order>>(&key) {
            return Ok(orders);
        }

        let orders = self.orders.list_for_user(user_id)?;
        self.cache.set(&key, &orders, self.cache_ttl);
        Ok(orders)
    }

    /// Transition an order's status. Terminal orders reject any change.
    /// Cancelling restores the order's stock before the status is committed.
    pub fn update_order_status(&self, id: OrderId, status: OrderStatus) -> DomainResult<Order> {
        let mut order = self.orders.get(id)?;
        order.status.ensure_not_terminal()?;

        if status == OrderStatus::Cancelled {
            let reserved: Vec<(ProductId, u32)> = order
                .items
                .iter()
                .map(|item| (item.product_id, item.quantity))
                .collect();
            self.restore_stock(&reserved);
        }

        self.orders.update_status(id, status)?;
        order.status = status;

        self.cache.set(&keys::order(order.id), &order, self.cache_ttl);
        self.cache.delete(&keys::user_orders(order.user_id));

        info!(order_id = %order.id, status = %status, "order status updated");
        Ok(order)
    }

    pub fn cancel_order(&self, id: OrderId) -> DomainResult<Order> {
        self.update_order_status(id, OrderStatus::Cancelled)
    }

    /// Validate one line and commit its stock decrement.
    fn reserve_item(&self, order_id: OrderId, item: &NewOrderItem) -> DomainResult<OrderItem> {
        if item.quantity == 0 {
            return Err(DomainError::validation("item quantity must be positive"));
        }

        let mut product = self.products.get(item.product_id)?;
        if product.stock < item.quantity {
            return Err(DomainError::InsufficientStock {
                product: product.name.clone(),
                requested: item.quantity,
                available: product.stock,
            });
        }

        product.stock -= item.quantity;
        self.products.update(&product)?;
        self.cache
            .set(&keys::product(product.id), &product, self.cache_ttl);

        Ok(OrderItem {
            id: OrderItemId::new(),
            order_id,
            product_id: product.id,
            quantity: item.quantity,
            price: product.price,
        })
    }

    /// Undo previously committed decrements. Restore failures are logged and
    /// skipped so the remaining items still get their stock back.
    fn restore_stock(&self, applied: &[(ProductId, u32)]) {
        for &(product_id, quantity) in applied {
            match self.products.get(product_id) {
                Ok(mut product) => {
                    product.stock = product.stock.saturating_add(quantity);
                    if let Err(e) = self.products.update(&product) {
                        error!(product_id = %product_id, quantity, error = %e, "failed to restore stock");
                        continue;
                    }
                    self.cache
                        .set(&keys::product(product.id), &product, self.cache_ttl);
                    warn!(product_id = %product_id, quantity, "stock restored");
                }
                Err(e) => {
                    error!(product_id = %product_id, quantity, error = %e, "failed to restore stock");
                }
            }
        }
    }
}
