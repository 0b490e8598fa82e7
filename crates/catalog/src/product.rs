use serde::{Deserialize, Serialize};

use mercora_core::{DomainError, DomainResult, ProductId};

/// A sellable product.
///
/// Owned by the inventory system of record; `stock` is mutated only by the
/// order transaction and product CRUD, never by event handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Price in smallest currency unit (e.g., cents).
    pub price: u64,
    pub stock: u32,
}

impl Product {
    pub fn new(name: impl Into<String>, price: u64, stock: u32) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }

        Ok(Self {
            id: ProductId::new(),
            name,
            price,
            stock,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_product_gets_a_fresh_id() {
        let a = Product::new("Widget", 10, 5).unwrap();
        let b = Product::new("Widget", 10, 5).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn empty_name_is_rejected() {
        let err = Product::new("   ", 10, 5).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
