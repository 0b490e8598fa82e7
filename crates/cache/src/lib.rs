//! Two-tier key/value cache: a fast in-process tier backed by a shared tier.
//!
//! The shared tier is the authority for cross-instance visibility; the local
//! tier is a short-lived accelerator. Cache operations never fail the caller:
//! shared-tier and serialization errors are logged and degrade to a miss or
//! no-op, with the system of record as the fallback read path.

pub mod error;
pub mod keys;
pub mod local;
pub mod store;
pub mod sweeper;
pub mod tiered;

pub use error::CacheError;
pub use store::{InMemorySharedStore, SharedStore};
pub use sweeper::SweeperHandle;
pub use tiered::{CacheConfig, TieredCache};
