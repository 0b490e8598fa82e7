//! Order lifecycle event payloads (wire JSON shapes).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mercora_core::{OrderId, ProductId, UserId};

use crate::order::Order;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItemEvent {
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: u64,
}

/// Payload for `order.created`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreatedEvent {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub total_price: u64,
    pub items: Vec<OrderItemEvent>,
    pub created_at: DateTime<Utc>,
}

impl OrderCreatedEvent {
    pub fn from_order(order: &Order) -> Self {
        Self {
            order_id: order.id,
            user_id: order.user_id,
            total_price: order.total_price,
            items: order
                .items
                .iter()
                .map(|item| OrderItemEvent {
                    product_id: item.product_id,
                    quantity: item.quantity,
                    price: item.price,
                })
                .collect(),
            created_at: order.created_at,
        }
    }
}
