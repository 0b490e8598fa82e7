//! Shared cache tier backends.

#[cfg(feature = "redis")]
pub mod redis;
