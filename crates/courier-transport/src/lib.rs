//! # Courier Transport
//!
//! Transport capability consumed by the Courier messaging client.
//!
//! This library provides:
//! - The [`QueueTransport`] trait: send, long-poll receive, and delete
//!   against named queues and topics
//! - Validated identifier types for targets, messages, and delivery receipts
//! - A [`connect`] factory that selects a driver from the endpoint scheme
//! - A fully functional in-memory transport with visibility-timeout
//!   redelivery, for development and testing
//!
//! Drivers for hosted queue services live in their own crates and are
//! injected by the application; this crate owns only the contract they
//! implement.
//!
//! ## Module Organization
//!
//! - [`error`] - Error types for all transport operations
//! - [`message`] - Identifier and delivery types
//! - [`transport`] - The transport trait, connection settings, and factory
//! - [`memory`] - In-memory transport implementation

// Module declarations
pub mod error;
pub mod memory;
pub mod message;
pub mod transport;

// Re-export commonly used types at crate root for convenience
pub use error::{TransportError, ValidationError};
pub use memory::InMemoryTransport;
pub use message::{Delivery, MessageId, ReceiptToken, SendReceipt, TargetName};
pub use transport::{connect, ConnectionSettings, QueueTransport};
