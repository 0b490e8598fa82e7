//! Event envelope codec and bus abstractions (mechanics only).
//!
//! Transport implementations (Redis pub/sub) live in `mercora-infra`; this
//! crate defines the envelope wire format, the producer/consumer contracts,
//! duplicate suppression, and an in-memory bus for tests/dev.

pub mod bus;
pub mod dedup;
pub mod dispatch;
pub mod envelope;
pub mod in_memory_bus;
pub mod topic;

pub use bus::{EventConsumer, EventHandler, EventProducer, HandlerError, TransportError};
pub use dedup::EventDeduplicator;
pub use envelope::{DecodeError, EncodeError, Envelope};
pub use in_memory_bus::InMemoryEventBus;
