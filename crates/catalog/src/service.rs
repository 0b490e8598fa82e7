//! Product write/read paths with cache write-through and event publication.
//!
//! The repository is the system of record. Cache and bus are best-effort side
//! channels: their failures are logged and the CRUD path proceeds.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use mercora_cache::{TieredCache, keys};
use mercora_core::{DomainError, DomainResult, ProductId};
use mercora_events::bus::{self, EventProducer};
use mercora_events::topic;

use crate::events::{ProductCreatedEvent, ProductDeletedEvent, ProductUpdatedEvent};
use crate::product::Product;
use crate::repository::ProductRepository;

pub struct ProductService {
    repo: Arc<dyn ProductRepository>,
    cache: Arc<TieredCache>,
    producer: Arc<dyn EventProducer>,
    cache_ttl: Duration,
}

impl ProductService {
    pub fn new(
        repo: Arc<dyn ProductRepository>,
        cache: Arc<TieredCache>,
        producer: Arc<dyn EventProducer>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            repo,
            cache,
            producer,
            cache_ttl,
        }
    }

    pub fn create_product(
        &self,
        name: impl Into<String>,
        price: u64,
        stock: u32,
    ) -> DomainResult<Product> {
        let product = Product::new(name, price, stock)?;
        self.repo.create(&product)?;

        self.cache
            .set(&keys::product(product.id), &product, self.cache_ttl);
        self.cache.delete(&keys::products_list());

        bus::publish_best_effort(
            self.producer.as_ref(),
            topic::PRODUCT_CREATED,
            &ProductCreatedEvent::from_product(&product),
        );

        info!(product_id = %product.id, name = %product.name, "product created");
        Ok(product)
    }

    /// Read-through: cache first, repository on miss (repopulating the cache).
    pub fn get_product(&self, id: ProductId) -> DomainResult<Product> {
        let key = keys::product(id);
        if let Some(product) = self.cache.get::<Product>(&key) {
            return Ok(product);
        }

        let product = self.repo.get(id)?;
        self.cache.set(&key, &product, self.cache_ttl);
        Ok(product)
    }

    pub fn list_products(&self) -> DomainResult<Vec<Product>> {
        let key = keys::products_list();
        if let Some(products) = self.cache.get::<Vec<Product>>(&key) {
            return Ok(products);
        }

        let products = self.repo.list()?;
        self.cache.set(&key, &products, self.cache_ttl);
        Ok(products)
    }

    /// Partial update; `None` fields keep their current value.
    pub fn update_product(
        &self,
        id: ProductId,
        name: Option<String>,
        price: Option<u64>,
        stock: Option<u32>,
    ) -> DomainResult<Product> {
        let mut product = self.repo.get(id)?;

        if let Some(name) = name {
            if name.trim().is_empty() {
                return Err(DomainError::validation("product name cannot be empty"));
            }
            product.name = name;
        }
        if let Some(price) = price {
            product.price = price;
        }
        if let Some(stock) = stock {
            product.stock = stock;
        }

        self.repo.update(&product)?;

        self.cache
            .set(&keys::product(product.id), &product, self.cache_ttl);
        self.cache.delete(&keys::products_list());

        bus::publish_best_effort(
            self.producer.as_ref(),
            topic::PRODUCT_UPDATED,
            &ProductUpdatedEvent::from_product(&product),
        );

        info!(product_id = %product.id, "product updated");
        Ok(product)
    }

    pub fn delete_product(&self, id: ProductId) -> DomainResult<()> {
        // Surface NotFound before touching cache or bus.
        self.repo.get(id)?;
        self.repo.delete(id)?;

        self.cache.delete(&keys::product(id));
        self.cache.delete(&keys::products_list());

        bus::publish_best_effort(
            self.producer.as_ref(),
            topic::PRODUCT_DELETED,
            &ProductDeletedEvent::new(id),
        );

        info!(product_id = %id, "product deleted");
        Ok(())
    }
}
