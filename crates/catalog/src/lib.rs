//! Product catalog: the inventory system of record's product side.
//!
//! Cached copies of products are advisory; the repository is authoritative.

pub mod events;
pub mod product;
pub mod repository;
pub mod service;

pub use events::{ProductCreatedEvent, ProductDeletedEvent, ProductUpdatedEvent};
pub use product::Product;
pub use repository::{InMemoryProductRepository, ProductRepository};
pub use service::ProductService;
