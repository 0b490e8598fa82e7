//! Event bus transports.

#[cfg(feature = "redis")]
pub mod redis_pubsub;
