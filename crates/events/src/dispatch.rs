//! Handler invocation with an explicit per-delivery timeout.
//!
//! A handler that blocks forever would otherwise starve its dispatch slot.
//! Each delivery runs the handler on its own thread and waits on a completion
//! channel; expiry is treated as a handler failure (logged, not retried). The
//! timed-out invocation is abandoned rather than cancelled — there is no
//! cooperative cancellation point in a synchronous handler.

use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::bus::{EventHandler, HandlerError};
use crate::envelope::Envelope;

pub const DEFAULT_HANDLER_TIMEOUT: Duration = Duration::from_secs(30);

/// Run `handler` for one delivery, waiting at most `timeout`.
///
/// Returns `true` when the handler completed successfully within the window.
pub fn run_handler(
    topic: &str,
    envelope: &Envelope,
    handler: &EventHandler,
    timeout: Duration,
) -> bool {
    let event_id = envelope.id();
    let (done_tx, done_rx) = mpsc::channel();

    let handler = Arc::clone(handler);
    let delivery = envelope.clone();
    thread::spawn(move || {
        let result = handler(&delivery);
        // Receiver may have given up already; nothing left to do then.
        let _ = done_tx.send(result);
    });

    match done_rx.recv_timeout(timeout) {
        Ok(Ok(())) => {
            debug!(topic, %event_id, "event handled");
            true
        }
        Ok(Err(HandlerError::Poison(e))) => {
            warn!(topic, %event_id, error = %e, "dropping poison message");
            false
        }
        Ok(Err(e)) => {
            warn!(topic, %event_id, error = %e, "event handler failed");
            false
        }
        Err(_) => {
            warn!(
                topic,
                %event_id,
                timeout_ms = timeout.as_millis() as u64,
                "event handler timed out; abandoning invocation"
            );
            false
        }
    }
}
