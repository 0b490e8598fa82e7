//! Product lifecycle event payloads (wire JSON shapes).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mercora_core::ProductId;

use crate::product::Product;

/// Payload for `product.created`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCreatedEvent {
    pub product_id: ProductId,
    pub name: String,
    pub price: u64,
    pub stock: u32,
    pub created_at: DateTime<Utc>,
}

impl ProductCreatedEvent {
    pub fn from_product(product: &Product) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            price: product.price,
            stock: product.stock,
            created_at: Utc::now(),
        }
    }
}

/// Payload for `product.updated`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductUpdatedEvent {
    pub product_id: ProductId,
    pub name: String,
    pub price: u64,
    pub stock: u32,
    pub updated_at: DateTime<Utc>,
}

impl ProductUpdatedEvent {
    pub fn from_product(product: &Product) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            price: product.price,
            stock: product.stock,
            updated_at: Utc::now(),
        }
    }
}

/// Payload for `product.deleted`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDeletedEvent {
    pub product_id: ProductId,
    pub deleted_at: DateTime<Utc>,
}

impl ProductDeletedEvent {
    pub fn new(product_id: ProductId) -> Self {
        Self {
            product_id,
            deleted_at: Utc::now(),
        }
    }
}
