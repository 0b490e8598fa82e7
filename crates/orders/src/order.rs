use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mercora_core::{DomainError, DomainResult, OrderId, OrderItemId, ProductId, UserId};

/// Order status lifecycle: `pending -> {completed, cancelled}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Once terminal, no further transition is allowed.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Guard for status writes: terminal orders accept no further changes.
    pub fn ensure_not_terminal(self) -> DomainResult<()> {
        if self.is_terminal() {
            return Err(DomainError::invariant(format!(
                "cannot change status of a {self} order"
            )));
        }
        Ok(())
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Order line: product, quantity, and the price snapshot taken at order time
/// (never re-read later).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    /// Price in smallest currency unit (e.g., cents).
    pub price: u64,
}

impl OrderItem {
    pub fn line_total(&self) -> u64 {
        self.price * u64::from(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub total_price: u64,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Build a fresh `pending` order. `total_price == Σ line totals` holds by
    /// construction.
    pub(crate) fn pending(id: OrderId, user_id: UserId, items: Vec<OrderItem>) -> Self {
        let total_price = items.iter().map(OrderItem::line_total).sum();
        Self {
            id,
            user_id,
            status: OrderStatus::Pending,
            total_price,
            items,
            created_at: Utc::now(),
        }
    }
}
