//! Background sweep of the local tier.
//!
//! Modeled as an explicit, cancellable task owned by the cache lifecycle —
//! start it after construction, shut it down before dropping the service.

use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::tiered::TieredCache;

/// Handle to a running sweeper thread.
#[derive(Debug)]
pub struct SweeperHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl SweeperHandle {
    /// Request shutdown and wait for the thread to exit.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

impl TieredCache {
    /// Start the periodic sweep at the configured interval.
    pub fn start_sweeper(self: &Arc<Self>) -> SweeperHandle {
        self.start_sweeper_with_interval(self.sweep_interval())
    }

    pub fn start_sweeper_with_interval(self: &Arc<Self>, interval: Duration) -> SweeperHandle {
        let cache = Arc::clone(self);
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let join = thread::spawn(move || {
            loop {
                match shutdown_rx.recv_timeout(interval) {
                    Err(mpsc::RecvTimeoutError::Timeout) => {
                        let evicted = cache.sweep_expired();
                        if evicted > 0 {
                            debug!(evicted, "cache sweep evicted expired entries");
                        }
                    }
                    // Shutdown requested, or the handle was dropped.
                    _ => break,
                }
            }
        });

        SweeperHandle {
            shutdown: shutdown_tx,
            join: Some(join),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemorySharedStore;

    #[test]
    fn sweeper_evicts_expired_entries_proactively() {
        let cache = Arc::new(TieredCache::new(Arc::new(InMemorySharedStore::new())));
        cache.set("stale", &1u32, Duration::from_millis(5));
        cache.set("fresh", &2u32, Duration::from_secs(60));

        let handle = cache.start_sweeper_with_interval(Duration::from_millis(20));
        std::thread::sleep(Duration::from_millis(80));
        handle.shutdown();

        assert_eq!(cache.local_len(), 1);
        assert_eq!(cache.get::<u32>("fresh"), Some(2));
    }

    #[test]
    fn shutdown_stops_the_thread() {
        let cache = Arc::new(TieredCache::new(Arc::new(InMemorySharedStore::new())));
        let handle = cache.start_sweeper_with_interval(Duration::from_millis(10));
        // Returns promptly instead of hanging on join.
        handle.shutdown();
    }
}
