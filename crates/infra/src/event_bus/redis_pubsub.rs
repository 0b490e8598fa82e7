//! Redis pub/sub-backed event bus (optional).
//!
//! Note: Redis pub/sub is not durable (messages published while a subscriber
//! is offline are lost). The system of record covers anything a lost message
//! would have told us; durable delivery would need Streams or a broker.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use redis::Commands;
use tracing::{debug, error, info, warn};

use mercora_events::bus::{EventConsumer, EventHandler, EventProducer, TransportError};
use mercora_events::dedup::EventDeduplicator;
use mercora_events::dispatch;
use mercora_events::envelope::Envelope;

/// How often a subscriber thread wakes from a blocking read to check for
/// shutdown.
const SUBSCRIBER_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Redis pub/sub bus for JSON envelopes, one channel per topic.
///
/// Publishing opens a connection per call; each subscription runs a dedicated
/// background thread. Deliveries on all subscriptions share one dedup window,
/// and each runs through the timeout dispatch path.
pub struct RedisEventBus {
    client: redis::Client,
    channel_prefix: String,
    dedup: Arc<EventDeduplicator>,
    handler_timeout: Duration,
    closed: Arc<AtomicBool>,
}

impl RedisEventBus {
    /// Open a client and verify the server is reachable.
    ///
    /// Connection failure here is fatal to the caller; everything after
    /// startup degrades instead.
    pub fn connect(
        redis_url: &str,
        channel_prefix: impl Into<String>,
        dedup_capacity: usize,
        handler_timeout: Duration,
    ) -> Result<Self, TransportError> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        let mut conn = client
            .get_connection()
            .map_err(|e| TransportError::Connection(e.to_string()))?;
        redis::cmd("PING")
            .query::<String>(&mut conn)
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        Ok(Self {
            client,
            channel_prefix: channel_prefix.into(),
            dedup: Arc::new(EventDeduplicator::new(dedup_capacity)),
            handler_timeout,
            closed: Arc::new(AtomicBool::new(false)),
        })
    }

    fn channel_for(&self, topic: &str) -> String {
        format!("{}{}", self.channel_prefix, topic)
    }
}

impl EventProducer for RedisEventBus {
    fn publish(&self, topic: &str, envelope: Envelope) -> Result<(), TransportError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Send {
                topic: topic.to_string(),
                reason: "bus is closed".to_string(),
            });
        }

        let frame = envelope
            .to_bytes()
            .map_err(|e| TransportError::Serialize(e.to_string()))?;

        let mut conn = self.client.get_connection().map_err(|e| TransportError::Send {
            topic: topic.to_string(),
            reason: e.to_string(),
        })?;

        let receivers: i64 = conn
            .publish(self.channel_for(topic), frame)
            .map_err(|e| TransportError::Send {
                topic: topic.to_string(),
                reason: e.to_string(),
            })?;

        debug!(topic, event_id = %envelope.id(), receivers, "event published");
        Ok(())
    }
}

impl EventConsumer for RedisEventBus {
    fn subscribe(&self, topic: &str, handler: EventHandler) -> Result<(), TransportError> {
        let channel = self.channel_for(topic);

        // Fail fast on an unreachable server instead of inside the thread.
        let mut conn = self
            .client
            .get_connection()
            .map_err(|e| TransportError::Subscribe {
                topic: topic.to_string(),
                reason: e.to_string(),
            })?;
        conn.set_read_timeout(Some(SUBSCRIBER_POLL_INTERVAL))
            .map_err(|e| TransportError::Subscribe {
                topic: topic.to_string(),
                reason: e.to_string(),
            })?;

        let topic = topic.to_string();
        let dedup = Arc::clone(&self.dedup);
        let handler_timeout = self.handler_timeout;
        let closed = Arc::clone(&self.closed);

        thread::spawn(move || {
            let mut pubsub = conn.as_pubsub();
            if let Err(e) = pubsub.subscribe(&channel) {
                error!(topic, channel, error = %e, "failed to subscribe; consumer thread exiting");
                return;
            }
            info!(topic, channel, "subscribed");

            loop {
                if closed.load(Ordering::SeqCst) {
                    debug!(topic, "bus closed; consumer thread exiting");
                    return;
                }

                let msg = match pubsub.get_message() {
                    Ok(msg) => msg,
                    // Read timeout is the shutdown poll tick, not a failure.
                    Err(e) if e.is_timeout() => continue,
                    Err(e) => {
                        error!(topic, error = %e, "pub/sub read failed; consumer thread exiting");
                        return;
                    }
                };

                let frame: Vec<u8> = match msg.get_payload() {
                    Ok(frame) => frame,
                    Err(e) => {
                        warn!(topic, error = %e, "unreadable pub/sub payload; dropping");
                        continue;
                    }
                };

                let envelope = match Envelope::from_bytes(&frame) {
                    Ok(envelope) => envelope,
                    Err(e) => {
                        warn!(topic, error = %e, "dropping poison message");
                        continue;
                    }
                };

                if !dedup.first_seen(envelope.id()) {
                    debug!(topic, event_id = %envelope.id(), "duplicate delivery suppressed");
                    continue;
                }

                dispatch::run_handler(&topic, &envelope, &handler, handler_timeout);
            }
        });

        Ok(())
    }

    fn close(&self) {
        // Threads notice within one poll interval and exit.
        self.closed.store(true, Ordering::SeqCst);
    }
}

impl core::fmt::Debug for RedisEventBus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RedisEventBus")
            .field("channel_prefix", &self.channel_prefix)
            .field("closed", &self.closed.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}
