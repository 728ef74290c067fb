//! The transport trait and connection factory.

use crate::error::TransportError;
use crate::memory::InMemoryTransport;
use crate::message::{Delivery, ReceiptToken, SendReceipt, TargetName};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;

/// Interface to the remote queue/topic service.
///
/// All retry and availability concerns live behind this trait; callers see
/// each operation succeed or fail exactly once.
#[async_trait]
pub trait QueueTransport: Send + Sync {
    /// Send a message body to the named queue or topic.
    ///
    /// `tag` is a server-side routing/filter tag and may be empty.
    async fn send(
        &self,
        target: &TargetName,
        body: &str,
        tag: &str,
    ) -> Result<SendReceipt, TransportError>;

    /// Long-poll receive a single message from the named queue.
    ///
    /// Blocks for up to `wait`; `Ok(None)` means the poll window elapsed
    /// with no message available.
    async fn receive(
        &self,
        target: &TargetName,
        wait: Duration,
    ) -> Result<Option<Delivery>, TransportError>;

    /// Delete (acknowledge) one specific in-flight delivery by its receipt.
    async fn delete(
        &self,
        target: &TargetName,
        receipt: &ReceiptToken,
    ) -> Result<(), TransportError>;
}

/// Connection parameters for the queue service.
#[derive(Clone)]
pub struct ConnectionSettings {
    /// Service endpoint URL; the scheme selects the transport driver
    pub endpoint: String,

    /// Access key ID for the service account
    pub access_key_id: String,

    /// Access key secret; also the message-signing key
    pub access_key_secret: String,
}

impl std::fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"<REDACTED>")
            .finish()
    }
}

/// Establish a transport connection from the given settings.
///
/// The endpoint scheme selects the driver. `memory://` yields the in-process
/// [`InMemoryTransport`] used for development and testing. Drivers for hosted
/// queue services are provided by separate crates and injected by the caller;
/// their schemes are rejected here with [`TransportError::UnsupportedEndpoint`].
pub async fn connect(
    settings: &ConnectionSettings,
) -> Result<Arc<dyn QueueTransport>, TransportError> {
    let endpoint =
        Url::parse(&settings.endpoint).map_err(|e| TransportError::ConnectionFailed {
            message: format!("invalid endpoint '{}': {}", settings.endpoint, e),
        })?;

    if settings.access_key_id.is_empty() || settings.access_key_secret.is_empty() {
        return Err(TransportError::AuthenticationFailed {
            message: "access key id and secret are required".to_string(),
        });
    }

    match endpoint.scheme() {
        "memory" => Ok(Arc::new(InMemoryTransport::new())),
        scheme => Err(TransportError::UnsupportedEndpoint {
            scheme: scheme.to_string(),
        }),
    }
}
