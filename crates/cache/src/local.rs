//! Local (in-process) cache tier.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub(crate) struct LocalEntry {
    pub data: Vec<u8>,
    /// `None` means no expiry.
    pub expires_at: Option<DateTime<Utc>>,
}

impl LocalEntry {
    fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Pure in-memory lookup table, shared between request threads and the
/// periodic sweeper. Lock poisoning degrades to a miss/no-op; the cache must
/// never fail its caller.
#[derive(Debug, Default)]
pub(crate) struct LocalTier {
    entries: RwLock<HashMap<String, LocalEntry>>,
}

impl LocalTier {
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        let now = Utc::now();
        {
            let entries = self.entries.read().ok()?;
            match entries.get(key) {
                None => return None,
                Some(entry) if !entry.is_expired_at(now) => return Some(entry.data.clone()),
                Some(_) => {}
            }
        }

        // Lazy expiry: re-check under the write lock before removing, the
        // entry may have been replaced since the read lock was released.
        if let Ok(mut entries) = self.entries.write() {
            if entries.get(key).is_some_and(|e| e.is_expired_at(now)) {
                entries.remove(key);
            }
        }
        None
    }

    pub fn set(&self, key: &str, data: Vec<u8>, expires_at: Option<DateTime<Utc>>) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key.to_string(), LocalEntry { data, expires_at });
        }
    }

    pub fn remove(&self, key: &str) -> bool {
        self.entries
            .write()
            .map(|mut entries| entries.remove(key).is_some())
            .unwrap_or(false)
    }

    /// Evict every expired entry; returns how many were removed.
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        let Ok(mut entries) = self.entries.write() else {
            return 0;
        };
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired_at(now));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }
}
