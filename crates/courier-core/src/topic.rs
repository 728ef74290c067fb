//! Publish-only topic endpoint.

use crate::envelope::{Envelope, EnvelopeError};
use crate::{epoch_stamp, process_trace_id, wall_clock_stamp, ServiceIdentity};
use courier_transport::{MessageId, QueueTransport, TargetName, TransportError};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[cfg(test)]
#[path = "topic_tests.rs"]
mod tests;

/// Errors surfaced by the publish path
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("encoding error: {0}")]
    Encoding(#[from] EnvelopeError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Publish-only named endpoint on the remote queue service.
///
/// Topics are created through [`crate::Client::get_topic`], memoized by
/// name, and live for the lifetime of their client. Besides the transport
/// handle they hold no mutable state.
pub struct Topic {
    name: TargetName,
    transport: Arc<dyn QueueTransport>,
    identity: ServiceIdentity,
}

impl Topic {
    pub(crate) fn new(
        name: TargetName,
        transport: Arc<dyn QueueTransport>,
        identity: ServiceIdentity,
    ) -> Self {
        Self {
            name,
            transport,
            identity,
        }
    }

    /// Topic name
    pub fn name(&self) -> &TargetName {
        &self.name
    }

    /// Publish an envelope with an optional server-side routing tag.
    ///
    /// Completes the envelope ([`Envelope::ensure_defaults`]) before
    /// serialization so the transmitted body carries trace id, origin, and
    /// signature, then sends the transport-safe encoding. One observability
    /// record is emitted per successful publish and none on failure.
    ///
    /// # Errors
    ///
    /// Encoding failures surface before the transport is contacted.
    /// Transport failures surface verbatim; retry policy, if any, belongs to
    /// the transport.
    pub async fn publish(
        &self,
        mut envelope: Envelope,
        filter_tag: &str,
    ) -> Result<MessageId, PublishError> {
        envelope.ensure_defaults(&self.identity.service_name, &self.identity.secret_key);
        let body = envelope.encode()?;

        let receipt = self.transport.send(&self.name, &body, filter_tag).await?;

        info!(
            action = "publish_message",
            publish_time = %wall_clock_stamp(),
            msectime = %epoch_stamp(),
            message_id = %receipt.message_id,
            status_code = receipt.status_code,
            topic_name = %self.name,
            message_tag = %envelope.tag,
            global_trace_id = process_trace_id(),
            trace_id = %envelope.trace_id,
            filter_tag,
            sign = %envelope.signature,
            "message published"
        );

        Ok(receipt.message_id)
    }
}
