//! In-memory event bus for tests/dev.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::debug;

use crate::bus::{EventConsumer, EventHandler, EventProducer, TransportError};
use crate::dedup::EventDeduplicator;
use crate::dispatch::{self, DEFAULT_HANDLER_TIMEOUT};
use crate::envelope::Envelope;

/// In-process topic bus.
///
/// - No IO / no async
/// - Fan-out to every handler registered for the topic
/// - Deliveries run through the same dedup + timeout dispatch path as the
///   Redis transport, but on the publisher's thread, so tests observe handler
///   side effects as soon as `publish` returns (unless a handler exceeds the
///   timeout and is abandoned).
pub struct InMemoryEventBus {
    handlers: Mutex<HashMap<String, Vec<EventHandler>>>,
    dedup: EventDeduplicator,
    handler_timeout: Duration,
    closed: AtomicBool,
}

// Handlers are trait objects, so Debug has to be written out by hand.
impl core::fmt::Debug for InMemoryEventBus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let subscribed: usize = self
            .handlers
            .lock()
            .map(|handlers| handlers.values().map(Vec::len).sum())
            .unwrap_or(0);
        f.debug_struct("InMemoryEventBus")
            .field("subscribed_handlers", &subscribed)
            .field("handler_timeout", &self.handler_timeout)
            .field("closed", &self.closed.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::with_handler_timeout(DEFAULT_HANDLER_TIMEOUT)
    }

    pub fn with_handler_timeout(handler_timeout: Duration) -> Self {
        Self {
            handlers: Mutex::new(HashMap::new()),
            dedup: EventDeduplicator::default(),
            handler_timeout,
            closed: AtomicBool::new(false),
        }
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventProducer for InMemoryEventBus {
    fn publish(&self, topic: &str, envelope: Envelope) -> Result<(), TransportError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Send {
                topic: topic.to_string(),
                reason: "bus is closed".to_string(),
            });
        }

        let subscribers = {
            let handlers = self.handlers.lock().map_err(|_| TransportError::Send {
                topic: topic.to_string(),
                reason: "handler registry lock poisoned".to_string(),
            })?;
            handlers.get(topic).cloned().unwrap_or_default()
        };

        if subscribers.is_empty() {
            debug!(topic, "no subscribers; dropping event");
            return Ok(());
        }

        if !self.dedup.first_seen(envelope.id()) {
            debug!(topic, event_id = %envelope.id(), "duplicate delivery suppressed");
            return Ok(());
        }

        for handler in &subscribers {
            dispatch::run_handler(topic, &envelope, handler, self.handler_timeout);
        }

        Ok(())
    }
}

impl EventConsumer for InMemoryEventBus {
    fn subscribe(&self, topic: &str, handler: EventHandler) -> Result<(), TransportError> {
        let mut handlers = self.handlers.lock().map_err(|_| TransportError::Subscribe {
            topic: topic.to_string(),
            reason: "handler registry lock poisoned".to_string(),
        })?;
        handlers.entry(topic.to_string()).or_default().push(handler);
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        if let Ok(mut handlers) = self.handlers.lock() {
            handlers.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    use serde::{Deserialize, Serialize};

    use crate::bus::HandlerError;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Tick {
        n: u64,
    }

    fn counting_handler(calls: Arc<AtomicUsize>) -> EventHandler {
        Arc::new(move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    #[test]
    fn published_envelope_reaches_registered_handler() {
        let bus = InMemoryEventBus::new();
        let calls = Arc::new(AtomicUsize::new(0));
        bus.subscribe("tick", counting_handler(calls.clone())).unwrap();

        let envelope = Envelope::encode("tick", &Tick { n: 1 }).unwrap();
        bus.publish("tick", envelope).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn fan_out_reaches_every_handler_for_the_topic() {
        let bus = InMemoryEventBus::new();
        let calls = Arc::new(AtomicUsize::new(0));
        bus.subscribe("tick", counting_handler(calls.clone())).unwrap();
        bus.subscribe("tick", counting_handler(calls.clone())).unwrap();

        bus.publish("tick", Envelope::encode("tick", &Tick { n: 1 }).unwrap())
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn other_topics_do_not_receive_the_event() {
        let bus = InMemoryEventBus::new();
        let calls = Arc::new(AtomicUsize::new(0));
        bus.subscribe("tick", counting_handler(calls.clone())).unwrap();

        bus.publish("tock", Envelope::encode("tock", &Tick { n: 1 }).unwrap())
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn duplicate_delivery_is_suppressed() {
        let bus = InMemoryEventBus::new();
        let calls = Arc::new(AtomicUsize::new(0));
        bus.subscribe("tick", counting_handler(calls.clone())).unwrap();

        let envelope = Envelope::encode("tick", &Tick { n: 1 }).unwrap();
        bus.publish("tick", envelope.clone()).unwrap();
        bus.publish("tick", envelope).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn handler_error_does_not_fail_publish() {
        let bus = InMemoryEventBus::new();
        bus.subscribe("tick", Arc::new(|_| Err(HandlerError::failed("boom"))))
            .unwrap();

        let result = bus.publish("tick", Envelope::encode("tick", &Tick { n: 1 }).unwrap());
        assert!(result.is_ok());
    }

    #[test]
    fn bus_is_debug_formattable() {
        let bus = InMemoryEventBus::new();
        bus.subscribe("tick", counting_handler(Arc::new(AtomicUsize::new(0))))
            .unwrap();

        let formatted = format!("{bus:?}");
        assert!(formatted.contains("InMemoryEventBus"));
        assert!(formatted.contains("subscribed_handlers: 1"));
    }

    #[test]
    fn close_is_safe_without_subscriptions_and_twice() {
        let bus = InMemoryEventBus::new();
        bus.close();
        bus.close();
    }

    #[test]
    fn publish_after_close_is_a_transport_error() {
        let bus = InMemoryEventBus::new();
        let calls = Arc::new(AtomicUsize::new(0));
        bus.subscribe("tick", counting_handler(calls.clone())).unwrap();
        bus.close();

        let result = bus.publish("tick", Envelope::encode("tick", &Tick { n: 1 }).unwrap());
        assert!(matches!(result, Err(TransportError::Send { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
