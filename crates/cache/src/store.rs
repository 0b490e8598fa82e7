//! Shared cache tier abstraction.
//!
//! The shared tier is the cross-instance authority. A Redis-backed
//! implementation lives in `mercora-infra`; the in-memory store here serves
//! tests/dev.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::error::CacheError;

/// Serialized key/value store with per-entry TTL.
pub trait SharedStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// `ttl: None` means no expiry.
    fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<(), CacheError>;

    fn delete(&self, key: &str) -> Result<(), CacheError>;
}

/// In-memory shared store for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemorySharedStore {
    entries: RwLock<HashMap<String, StoredValue>>,
}

#[derive(Debug, Clone)]
struct StoredValue {
    data: Vec<u8>,
    expires_at: Option<Instant>,
}

impl InMemorySharedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SharedStore for InMemorySharedStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| CacheError::Backend("lock poisoned".to_string()))?;

        match entries.get(key) {
            Some(v) if v.expires_at.is_none_or(|at| at > Instant::now()) => {
                Ok(Some(v.data.clone()))
            }
            _ => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<(), CacheError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| CacheError::Backend("lock poisoned".to_string()))?;

        entries.insert(
            key.to_string(),
            StoredValue {
                data: value.to_vec(),
                expires_at: ttl.map(|ttl| Instant::now() + ttl),
            },
        );
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| CacheError::Backend("lock poisoned".to_string()))?;
        entries.remove(key);
        Ok(())
    }
}
