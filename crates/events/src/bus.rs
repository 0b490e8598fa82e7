//! Event publishing/subscription abstraction (mechanics only).
//!
//! The bus distributes envelopes to named topics. It is intentionally
//! lightweight and makes minimal assumptions:
//!
//! - **Transport-agnostic**: works with the in-memory bus or Redis pub/sub.
//! - **At-least-once acceptable**: transports may redeliver; consumers run
//!   every delivery through [`crate::dedup::EventDeduplicator`] so handlers
//!   observe each envelope id once.
//! - **No ordering across topics**, and only "as delivered" ordering within a
//!   single topic/subscriber pair. Handlers must not assume causal order
//!   across event types for the same entity.
//! - **No persistence**: the system of record is the fallback for anything
//!   a lost message would have told us.
//!
//! Publication is synchronous with respect to the caller (blocks until the
//! transport accepts the send) and asynchronous with respect to consumption.
//! Handler errors are logged by the dispatch layer, never redelivered.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::envelope::{DecodeError, Envelope};

/// Transport-level failure (bus unreachable, send refused).
///
/// Write paths log these and continue; the only place a transport error is
/// fatal is connection establishment at service startup.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to connect to event transport: {0}")]
    Connection(String),

    #[error("failed to send on topic '{topic}': {reason}")]
    Send { topic: String, reason: String },

    #[error("failed to subscribe to topic '{topic}': {reason}")]
    Subscribe { topic: String, reason: String },

    #[error("failed to serialize envelope for transport: {0}")]
    Serialize(String),
}

/// Failure reported by an event handler.
///
/// The bus does not interpret these beyond logging; a poison message is
/// dropped, any other failure is logged and the message is not redelivered.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The payload could not be decoded against its declared type.
    #[error(transparent)]
    Poison(#[from] DecodeError),

    #[error("handler failed: {0}")]
    Failed(String),
}

impl HandlerError {
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}

/// Callback registered for a topic.
///
/// Handlers may be invoked concurrently for distinct messages and must be
/// stateless or internally synchronized.
pub type EventHandler = Arc<dyn Fn(&Envelope) -> Result<(), HandlerError> + Send + Sync>;

/// Publishes envelopes to named topics.
pub trait EventProducer: Send + Sync {
    /// Fire-and-forget send. The caller decides whether a failure matters;
    /// no caller in the current design retries.
    fn publish(&self, topic: &str, envelope: Envelope) -> Result<(), TransportError>;
}

/// Registers handlers for named topics and dispatches deliveries to them.
pub trait EventConsumer: Send + Sync {
    fn subscribe(&self, topic: &str, handler: EventHandler) -> Result<(), TransportError>;

    /// Unsubscribe all topics and release the connection.
    ///
    /// Must be safe to call with zero subscriptions, and safe to call twice.
    fn close(&self);
}

impl<B> EventProducer for Arc<B>
where
    B: EventProducer + ?Sized,
{
    fn publish(&self, topic: &str, envelope: Envelope) -> Result<(), TransportError> {
        (**self).publish(topic, envelope)
    }
}

impl<B> EventConsumer for Arc<B>
where
    B: EventConsumer + ?Sized,
{
    fn subscribe(&self, topic: &str, handler: EventHandler) -> Result<(), TransportError> {
        (**self).subscribe(topic, handler)
    }

    fn close(&self) {
        (**self).close()
    }
}

/// Encode `payload` and publish it, swallowing failures with a log line.
///
/// This is the best-effort side channel used by write paths: the CRUD
/// operation must succeed even when eventing is degraded.
pub fn publish_best_effort<E>(producer: &dyn EventProducer, topic: &str, payload: &E)
where
    E: Serialize,
{
    let envelope = match Envelope::encode(topic, payload) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!(topic, error = %e, "failed to encode event; skipping publication");
            return;
        }
    };

    let event_id = envelope.id();
    if let Err(e) = producer.publish(topic, envelope) {
        warn!(topic, %event_id, error = %e, "failed to publish event; continuing without eventing");
    }
}
