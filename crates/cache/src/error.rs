//! Cache error model.

use thiserror::Error;

/// Shared-tier or serialization failure.
///
/// Always non-fatal: `TieredCache` logs these and degrades to a miss/no-op.
/// They appear in a `Result` only on the [`crate::store::SharedStore`] seam.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("shared cache backend error: {0}")]
    Backend(String),
}
