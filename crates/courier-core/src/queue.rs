//! Queue endpoint and the receive-dispatch-acknowledge loop.

use crate::envelope::Envelope;
use crate::wall_clock_stamp;
use async_trait::async_trait;
use courier_transport::{MessageId, QueueTransport, ReceiptToken, TargetName, TransportError};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{debug, info, warn};

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;

/// Wait time used for long-poll receives when none is configured
pub const DEFAULT_WAIT_TIME: Duration = Duration::from_secs(30);

/// Consumer callback invoked with each decoded envelope.
///
/// Returning an error leaves the message undeleted, so the transport's own
/// redelivery policy governs whether it is retried. No other side-effect
/// contract is imposed.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, envelope: Envelope) -> anyhow::Result<()>;
}

type BoxHandlerFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

struct FnHandler(Box<dyn Fn(Envelope) -> BoxHandlerFuture + Send + Sync>);

#[async_trait]
impl MessageHandler for FnHandler {
    async fn handle(&self, envelope: Envelope) -> anyhow::Result<()> {
        (self.0)(envelope).await
    }
}

/// Wrap an async closure as a [`MessageHandler`]
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn MessageHandler>
where
    F: Fn(Envelope) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(FnHandler(Box::new(move |envelope| -> BoxHandlerFuture {
        Box::pin(f(envelope))
    })))
}

/// Outcome of a single listen cycle.
///
/// Observability only: consume-path failures are logged and absorbed, never
/// propagated as errors, so a listen task cannot take its caller down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenOutcome {
    /// No handler is attached; the transport was not contacted
    Inert,
    /// The poll window elapsed with no message
    Empty,
    /// The transport receive call failed
    ReceiveFailed,
    /// The delivered body could not be decoded; message left for redelivery
    DecodeFailed,
    /// The handler rejected the message; message left for redelivery
    HandlerFailed,
    /// The message was dispatched and acknowledged
    Handled,
}

/// Named endpoint supporting both send and long-poll receive, with an
/// optional consumer handler.
///
/// Queues are created through [`crate::Client::get_queue`] or
/// [`crate::Client::register_queue`], memoized by name, and shared between
/// the registry and the listen tasks it spawns.
pub struct Queue {
    name: TargetName,
    transport: Arc<dyn QueueTransport>,
    handler: RwLock<Option<Arc<dyn MessageHandler>>>,
    wait_time: Duration,
}

impl Queue {
    pub(crate) fn new(
        name: TargetName,
        transport: Arc<dyn QueueTransport>,
        wait_time: Duration,
        handler: Option<Arc<dyn MessageHandler>>,
    ) -> Self {
        Self {
            name,
            transport,
            handler: RwLock::new(handler),
            wait_time,
        }
    }

    /// Queue name
    pub fn name(&self) -> &TargetName {
        &self.name
    }

    /// Attach the consumer handler.
    ///
    /// Attachment must happen before the queue's listen task is started;
    /// rebinding while a poll is in flight takes effect on the next cycle.
    pub fn set_handler(&self, handler: Arc<dyn MessageHandler>) {
        *self.handler.write().expect("handler lock poisoned") = Some(handler);
    }

    /// Whether a consumer handler is attached
    pub fn has_handler(&self) -> bool {
        self.handler.read().expect("handler lock poisoned").is_some()
    }

    fn current_handler(&self) -> Option<Arc<dyn MessageHandler>> {
        self.handler.read().expect("handler lock poisoned").clone()
    }

    /// Perform one receive-decode-dispatch-acknowledge cycle.
    ///
    /// Blocks for up to the queue's wait time (30s when unconfigured) for a
    /// message. A queue without a handler is inert: the call returns without
    /// contacting the transport. Sustaining continuous consumption is the
    /// caller's job; invoke this repeatedly, with backoff on
    /// [`ListenOutcome::ReceiveFailed`] if desired.
    ///
    /// The message is deleted only after the handler returns success.
    /// Decode failures and handler errors leave it undeleted for the
    /// transport's redelivery; a delete failure is logged and never
    /// surfaced.
    pub async fn listen(&self) -> ListenOutcome {
        let Some(handler) = self.current_handler() else {
            return ListenOutcome::Inert;
        };

        let wait = if self.wait_time.is_zero() {
            DEFAULT_WAIT_TIME
        } else {
            self.wait_time
        };

        let delivery = match self.transport.receive(&self.name, wait).await {
            Ok(Some(delivery)) => delivery,
            Ok(None) => return ListenOutcome::Empty,
            Err(error) => {
                warn!(queue_name = %self.name, error = %error, "receive failed");
                return ListenOutcome::ReceiveFailed;
            }
        };

        let envelope = match Envelope::decode(&delivery.body) {
            Ok(envelope) => envelope,
            Err(error) => {
                debug!(
                    queue_name = %self.name,
                    raw_body = %delivery.body,
                    error = %error,
                    "malformed message body, left for redelivery"
                );
                return ListenOutcome::DecodeFailed;
            }
        };

        info!(
            action = "receive_message",
            queue_name = %self.name,
            receive_time = %wall_clock_stamp(),
            content = %envelope.content,
            tag = %envelope.tag,
            trace_id = %envelope.trace_id,
            "message received"
        );

        let trace_id = envelope.trace_id.clone();
        match handler.handle(envelope).await {
            Ok(()) => {
                match self.transport.delete(&self.name, &delivery.receipt).await {
                    Ok(()) => {
                        debug!(queue_name = %self.name, trace_id = %trace_id, "message deleted");
                    }
                    Err(error) => {
                        debug!(
                            queue_name = %self.name,
                            trace_id = %trace_id,
                            error = %error,
                            "delete failed"
                        );
                    }
                }
                ListenOutcome::Handled
            }
            Err(error) => {
                debug!(
                    queue_name = %self.name,
                    trace_id = %trace_id,
                    error = %error,
                    "handler failed, message left for redelivery"
                );
                ListenOutcome::HandlerFailed
            }
        }
    }

    /// Produce a raw message body to this queue.
    ///
    /// Immediate delivery, no routing tag. Transport errors surface
    /// verbatim.
    pub async fn send(&self, body: &str) -> Result<MessageId, TransportError> {
        let receipt = self.transport.send(&self.name, body, "").await?;
        Ok(receipt.message_id)
    }

    /// Delete (acknowledge) one specific in-flight delivery.
    ///
    /// # Errors
    ///
    /// Transport errors surface verbatim, including an unknown or expired
    /// receipt.
    pub async fn delete(&self, receipt: &ReceiptToken) -> Result<(), TransportError> {
        self.transport.delete(&self.name, receipt).await
    }
}
