//! In-memory transport implementation for testing and development.
//!
//! This module provides a fully functional in-process transport that:
//! - Keeps per-target FIFO message queues, created on first use
//! - Tracks in-flight deliveries with a visibility timeout
//! - Returns undeleted deliveries to the queue once the timeout lapses
//! - Provides thread-safe concurrent access
//!
//! Routing tags passed to `send` are accepted and ignored: subscription
//! filtering is owned by the hosted service, and the in-memory transport has
//! no subscription model.

use crate::error::TransportError;
use crate::message::{Delivery, MessageId, ReceiptToken, SendReceipt, TargetName};
use crate::transport::QueueTransport;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;

/// Default time an undeleted delivery stays invisible before redelivery
const DEFAULT_VISIBILITY_TIMEOUT: Duration = Duration::from_secs(30);

/// Interval between availability checks inside a long-poll receive
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A message stored in a target's queue
struct StoredMessage {
    message_id: MessageId,
    body: String,
    delivery_count: u32,
}

/// A delivery currently being processed by a consumer
struct InFlightMessage {
    message: StoredMessage,
    invisible_until: Instant,
}

/// Queue state for a single target
#[derive(Default)]
struct TargetState {
    ready: VecDeque<StoredMessage>,
    in_flight: HashMap<ReceiptToken, InFlightMessage>,
}

/// In-memory transport implementation
pub struct InMemoryTransport {
    targets: Mutex<HashMap<TargetName, TargetState>>,
    visibility_timeout: Duration,
}

impl InMemoryTransport {
    /// Create new in-memory transport with the default visibility timeout
    pub fn new() -> Self {
        Self {
            targets: Mutex::new(HashMap::new()),
            visibility_timeout: DEFAULT_VISIBILITY_TIMEOUT,
        }
    }

    /// Override the visibility timeout applied to received deliveries
    pub fn with_visibility_timeout(mut self, timeout: Duration) -> Self {
        self.visibility_timeout = timeout;
        self
    }

    /// Attempt to take one available message from the target's queue.
    ///
    /// Reclaims expired in-flight deliveries first so the transport's own
    /// redelivery policy applies before new receives are answered.
    fn try_receive(&self, target: &TargetName) -> Option<Delivery> {
        let mut targets = self.targets.lock().expect("transport state lock poisoned");
        let state = targets.entry(target.clone()).or_default();
        let now = Instant::now();

        let expired: Vec<ReceiptToken> = state
            .in_flight
            .iter()
            .filter(|(_, m)| now >= m.invisible_until)
            .map(|(receipt, _)| receipt.clone())
            .collect();
        for receipt in expired {
            if let Some(in_flight) = state.in_flight.remove(&receipt) {
                debug!(
                    target_name = %target,
                    message_id = %in_flight.message.message_id,
                    "visibility timeout elapsed, message returned to queue"
                );
                state.ready.push_back(in_flight.message);
            }
        }

        let mut message = state.ready.pop_front()?;
        message.delivery_count += 1;

        let receipt = ReceiptToken::new();
        let delivery = Delivery {
            message_id: message.message_id.clone(),
            body: message.body.clone(),
            receipt: receipt.clone(),
            delivery_count: message.delivery_count,
        };

        state.in_flight.insert(
            receipt,
            InFlightMessage {
                message,
                invisible_until: now + self.visibility_timeout,
            },
        );

        Some(delivery)
    }
}

impl Default for InMemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueueTransport for InMemoryTransport {
    async fn send(
        &self,
        target: &TargetName,
        body: &str,
        _tag: &str,
    ) -> Result<SendReceipt, TransportError> {
        let message_id = MessageId::new();

        let mut targets = self.targets.lock().expect("transport state lock poisoned");
        let state = targets.entry(target.clone()).or_default();
        state.ready.push_back(StoredMessage {
            message_id: message_id.clone(),
            body: body.to_string(),
            delivery_count: 0,
        });

        Ok(SendReceipt {
            message_id,
            status_code: 201,
        })
    }

    async fn receive(
        &self,
        target: &TargetName,
        wait: Duration,
    ) -> Result<Option<Delivery>, TransportError> {
        let deadline = Instant::now() + wait;

        loop {
            if let Some(delivery) = self.try_receive(target) {
                return Ok(Some(delivery));
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }

            tokio::time::sleep(POLL_INTERVAL.min(remaining)).await;
        }
    }

    async fn delete(
        &self,
        target: &TargetName,
        receipt: &ReceiptToken,
    ) -> Result<(), TransportError> {
        let mut targets = self.targets.lock().expect("transport state lock poisoned");
        let state = targets
            .get_mut(target)
            .ok_or_else(|| TransportError::QueueNotFound {
                queue_name: target.to_string(),
            })?;

        state
            .in_flight
            .remove(receipt)
            .map(|_| ())
            .ok_or_else(|| TransportError::MessageNotFound {
                receipt: receipt.to_string(),
            })
    }
}
