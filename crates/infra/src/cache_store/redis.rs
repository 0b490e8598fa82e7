//! Redis-backed shared cache tier (optional).

use std::time::Duration;

use redis::Commands;

use mercora_cache::{CacheError, SharedStore};

/// Shared store over a single Redis instance.
///
/// Connections are opened per operation, matching the bus adapter. The tiered
/// cache already treats every error here as a miss/no-op, so no retry logic
/// lives at this layer.
pub struct RedisSharedStore {
    client: redis::Client,
}

impl RedisSharedStore {
    /// Open a client and verify the server is reachable.
    pub fn connect(redis_url: &str) -> Result<Self, CacheError> {
        let client =
            redis::Client::open(redis_url).map_err(|e| CacheError::Backend(e.to_string()))?;

        let mut conn = client
            .get_connection()
            .map_err(|e| CacheError::Backend(e.to_string()))?;
        redis::cmd("PING")
            .query::<String>(&mut conn)
            .map_err(|e| CacheError::Backend(e.to_string()))?;

        Ok(Self { client })
    }

    fn connection(&self) -> Result<redis::Connection, CacheError> {
        self.client
            .get_connection()
            .map_err(|e| CacheError::Backend(e.to_string()))
    }
}

impl SharedStore for RedisSharedStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut conn = self.connection()?;
        conn.get(key).map_err(|e| CacheError::Backend(e.to_string()))
    }

    fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<(), CacheError> {
        let mut conn = self.connection()?;
        match ttl {
            // SETEX rejects 0; a sub-second TTL rounds up to one second.
            Some(ttl) => conn
                .set_ex(key, value, ttl.as_secs().max(1))
                .map_err(|e| CacheError::Backend(e.to_string())),
            None => conn.set(key, value).map_err(|e| CacheError::Backend(e.to_string())),
        }
    }

    fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.connection()?;
        conn.del(key).map_err(|e| CacheError::Backend(e.to_string()))
    }
}

impl core::fmt::Debug for RedisSharedStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RedisSharedStore").finish_non_exhaustive()
    }
}
