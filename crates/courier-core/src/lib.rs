//! # Courier Core
//!
//! Typed publish/subscribe client for managed cloud message-queue services.
//!
//! This crate wraps a [`QueueTransport`] connection with:
//! - [`Envelope`]: the signed, traced message wrapper exchanged between
//!   publisher and consumer
//! - [`Topic`]: publish-only endpoints
//! - [`Queue`]: endpoints that both produce and consume, with a
//!   receive-dispatch-acknowledge loop driven by caller-supplied handlers
//! - [`Client`]: a registry that memoizes endpoints by name and fans out
//!   one listen task per consuming queue
//!
//! ## Usage
//!
//! ```rust,no_run
//! use courier_core::{handler_fn, Client, CourierConfig, Envelope, QueueOptions};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CourierConfig::from_env()?;
//! let client = Client::connect(&config).await?;
//!
//! client.register_queue(
//!     "order-events",
//!     QueueOptions::new().with_handler(handler_fn(|envelope: Envelope| async move {
//!         println!("received {}", envelope.trace_id);
//!         Ok(())
//!     })),
//! )?;
//!
//! for task in client.start_all() {
//!     task.await?;
//! }
//! # Ok(())
//! # }
//! ```

use chrono::Utc;
use std::sync::OnceLock;

// Module declarations
pub mod client;
pub mod config;
pub mod envelope;
pub mod queue;
pub mod topic;

// Re-export commonly used types at crate root for convenience
pub use client::{Client, QueueOptions};
pub use config::{ConfigError, CourierConfig};
pub use envelope::{Envelope, EnvelopeError};
pub use queue::{handler_fn, ListenOutcome, MessageHandler, Queue, DEFAULT_WAIT_TIME};
pub use topic::{PublishError, Topic};

// Re-export the transport surface this crate's API is expressed in
pub use courier_transport::{
    connect, ConnectionSettings, Delivery, InMemoryTransport, MessageId, QueueTransport,
    ReceiptToken, SendReceipt, TargetName, TransportError, ValidationError,
};

// ============================================================================
// Service Identity
// ============================================================================

/// Identity a client publishes under: the service name stamped on outgoing
/// envelopes and the key used to sign them.
#[derive(Clone)]
pub struct ServiceIdentity {
    /// Name reported as the origin of published messages
    pub service_name: String,

    /// Envelope signing key (the account's access key secret)
    pub secret_key: String,
}

impl std::fmt::Debug for ServiceIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceIdentity")
            .field("service_name", &self.service_name)
            .field("secret_key", &"<REDACTED>")
            .finish()
    }
}

// ============================================================================
// Observability Helpers
// ============================================================================

static PROCESS_TRACE_ID: OnceLock<String> = OnceLock::new();

/// Process-wide trace correlator.
///
/// Generated on first use and stable for the process lifetime; stamped on
/// every publish record so all messages published by one process can be
/// correlated.
pub fn process_trace_id() -> &'static str {
    PROCESS_TRACE_ID.get_or_init(|| uuid::Uuid::new_v4().to_string())
}

/// Wall-clock timestamp for log records
pub(crate) fn wall_clock_stamp() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Fractional epoch-seconds timestamp for log records
pub(crate) fn epoch_stamp() -> String {
    format!("{:.6}", Utc::now().timestamp_micros() as f64 / 1_000_000.0)
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
