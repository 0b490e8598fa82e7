//! Duplicate-delivery suppression keyed by envelope id.

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

use uuid::Uuid;

/// Bounded recently-seen-id set.
///
/// At-least-once transports may redeliver a message; consumers check ids here
/// before invoking handlers so repeated deliveries of the same envelope are
/// no-ops. Retention is bounded: once `capacity` ids are tracked the oldest
/// is evicted, so an id redelivered after falling out of the window is
/// handled again (handlers stay idempotent for that reason).
#[derive(Debug)]
pub struct EventDeduplicator {
    inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
    seen: HashSet<Uuid>,
    order: VecDeque<Uuid>,
    capacity: usize,
}

impl EventDeduplicator {
    pub const DEFAULT_CAPACITY: usize = 1024;

    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Mutex::new(Inner {
                seen: HashSet::with_capacity(capacity),
                order: VecDeque::with_capacity(capacity),
                capacity,
            }),
        }
    }

    /// Record `id` and report whether this is its first sighting.
    ///
    /// Fails open on lock poisoning: a duplicate delivery then reaches the
    /// handler, which must already be idempotent.
    pub fn first_seen(&self, id: Uuid) -> bool {
        let Ok(mut inner) = self.inner.lock() else {
            return true;
        };

        if inner.seen.contains(&id) {
            return false;
        }

        if inner.order.len() == inner.capacity {
            if let Some(evicted) = inner.order.pop_front() {
                inner.seen.remove(&evicted);
            }
        }

        inner.order.push_back(id);
        inner.seen.insert(id);
        true
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|inner| inner.order.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EventDeduplicator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
