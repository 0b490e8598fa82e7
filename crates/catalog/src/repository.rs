//! Product persistence seam.

use std::collections::HashMap;
use std::sync::RwLock;

use mercora_core::{DomainError, DomainResult, ProductId};

use crate::product::Product;

/// System-of-record access for products.
///
/// Implementations are assumed thread-safe (connection pooling is their
/// concern, not this crate's).
pub trait ProductRepository: Send + Sync {
    fn create(&self, product: &Product) -> DomainResult<()>;
    fn get(&self, id: ProductId) -> DomainResult<Product>;
    fn update(&self, product: &Product) -> DomainResult<()>;
    fn delete(&self, id: ProductId) -> DomainResult<()>;
    fn list(&self) -> DomainResult<Vec<Product>>;
}

/// In-memory product repository.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryProductRepository {
    products: RwLock<HashMap<ProductId, Product>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProductRepository for InMemoryProductRepository {
    fn create(&self, product: &Product) -> DomainResult<()> {
        let mut products = self
            .products
            .write()
            .map_err(|_| DomainError::conflict("lock poisoned"))?;

        if products.contains_key(&product.id) {
            return Err(DomainError::conflict(format!(
                "product {} already exists",
                product.id
            )));
        }
        products.insert(product.id, product.clone());
        Ok(())
    }

    fn get(&self, id: ProductId) -> DomainResult<Product> {
        let products = self
            .products
            .read()
            .map_err(|_| DomainError::conflict("lock poisoned"))?;
        products.get(&id).cloned().ok_or(DomainError::NotFound)
    }

    fn update(&self, product: &Product) -> DomainResult<()> {
        let mut products = self
            .products
            .write()
            .map_err(|_| DomainError::conflict("lock poisoned"))?;

        match products.get_mut(&product.id) {
            Some(existing) => {
                *existing = product.clone();
                Ok(())
            }
            None => Err(DomainError::NotFound),
        }
    }

    fn delete(&self, id: ProductId) -> DomainResult<()> {
        let mut products = self
            .products
            .write()
            .map_err(|_| DomainError::conflict("lock poisoned"))?;
        products.remove(&id).map(|_| ()).ok_or(DomainError::NotFound)
    }

    fn list(&self) -> DomainResult<Vec<Product>> {
        let products = self
            .products
            .read()
            .map_err(|_| DomainError::conflict("lock poisoned"))?;
        let mut all: Vec<Product> = products.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_get_returns_the_product() {
        let repo = InMemoryProductRepository::new();
        let product = Product::new("Widget", 10, 5).unwrap();

        repo.create(&product).unwrap();
        assert_eq!(repo.get(product.id).unwrap(), product);
    }

    #[test]
    fn duplicate_create_conflicts() {
        let repo = InMemoryProductRepository::new();
        let product = Product::new("Widget", 10, 5).unwrap();

        repo.create(&product).unwrap();
        let err = repo.create(&product).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn update_of_missing_product_is_not_found() {
        let repo = InMemoryProductRepository::new();
        let product = Product::new("Widget", 10, 5).unwrap();
        assert_eq!(repo.update(&product).unwrap_err(), DomainError::NotFound);
    }

    #[test]
    fn delete_removes_the_product() {
        let repo = InMemoryProductRepository::new();
        let product = Product::new("Widget", 10, 5).unwrap();
        repo.create(&product).unwrap();

        repo.delete(product.id).unwrap();
        assert_eq!(repo.get(product.id).unwrap_err(), DomainError::NotFound);
    }
}
