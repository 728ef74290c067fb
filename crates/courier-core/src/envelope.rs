//! Message envelope and signing.
//!
//! The envelope is the unit exchanged between publisher and consumer: an
//! opaque content payload plus the tracing, origin, and signature metadata
//! that travels with it. On the wire it is a JSON object with keys
//! `content`, `tag`, `trace_id`, `refer_service_name`, and `sign`,
//! transmitted as base64 of that JSON.

use base64::{engine::general_purpose, Engine as _};
use hmac::{Hmac, Mac};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;

type HmacSha256 = Hmac<Sha256>;

/// Errors during envelope encoding and decoding
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("envelope serialization failed: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("envelope deserialization failed: {0}")]
    Deserialize(#[source] serde_json::Error),

    #[error("message body is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("message body is not valid UTF-8")]
    InvalidUtf8,
}

/// The structured message wrapper exchanged between publisher and consumer.
///
/// Every field carries a serde default so partially populated wire objects
/// still decode; [`Envelope::ensure_defaults`] completes an envelope before
/// it is sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Opaque payload; shape is defined by the application
    #[serde(default)]
    pub content: serde_json::Value,

    /// Server-side filter tag; empty means "no filter"
    #[serde(default)]
    pub tag: String,

    /// Unique id of this logical message
    #[serde(default)]
    pub trace_id: String,

    /// Name of the service that published the message
    #[serde(rename = "refer_service_name", default)]
    pub origin_service: String,

    /// Keyed digest binding `trace_id` to the publisher's secret key
    #[serde(rename = "sign", default)]
    pub signature: String,
}

impl Envelope {
    /// Create an envelope around the given content, all metadata empty
    pub fn new(content: serde_json::Value) -> Self {
        Self {
            content,
            tag: String::new(),
            trace_id: String::new(),
            origin_service: String::new(),
            signature: String::new(),
        }
    }

    /// Create an envelope from any serializable content value
    pub fn from_content<T: Serialize>(content: &T) -> Result<Self, EnvelopeError> {
        let value = serde_json::to_value(content).map_err(EnvelopeError::Serialize)?;
        Ok(Self::new(value))
    }

    /// Set the filter tag
    pub fn with_tag(mut self, tag: String) -> Self {
        self.tag = tag;
        self
    }

    /// Set an explicit trace id instead of the generated one
    pub fn with_trace_id(mut self, trace_id: String) -> Self {
        self.trace_id = trace_id;
        self
    }

    /// Deserialize the content payload into a concrete type
    pub fn content_as<T: DeserializeOwned>(&self) -> Result<T, EnvelopeError> {
        serde_json::from_value(self.content.clone()).map_err(EnvelopeError::Deserialize)
    }

    /// Compute the keyed digest for this envelope's trace id.
    ///
    /// HMAC-SHA256 keyed by `secret` over the trace id, hex-encoded.
    /// Deterministic for a given (trace_id, secret) pair.
    pub fn compute_signature(&self, secret: &str) -> String {
        // HMAC accepts keys of any length, so construction cannot fail
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .expect("HMAC key of any length is valid");
        mac.update(self.trace_id.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Fill the derived fields a publisher must provide.
    ///
    /// Generates a trace id if absent, stamps the origin service, and signs
    /// the envelope. Idempotent: fields that are already populated are left
    /// untouched, so calling this twice is a no-op.
    pub fn ensure_defaults(&mut self, service_name: &str, secret: &str) {
        if self.trace_id.is_empty() {
            self.trace_id = uuid::Uuid::new_v4().to_string();
        }

        if self.origin_service.is_empty() {
            self.origin_service = service_name.to_string();
        }

        if self.signature.is_empty() {
            self.signature = self.compute_signature(secret);
        }
    }

    /// Whether the envelope carries a signature at all
    pub fn is_signed(&self) -> bool {
        !self.signature.is_empty()
    }

    /// Check the signature against the given secret.
    ///
    /// Receive-side verification is opt-in: the consume loop never calls
    /// this, handlers that require verified provenance do. The comparison is
    /// constant-time. A blank or non-hex signature fails the check; use
    /// [`Envelope::is_signed`] first to treat blank as "unsigned" instead.
    pub fn verify_signature(&self, secret: &str) -> bool {
        let Ok(sig_bytes) = hex::decode(&self.signature) else {
            return false;
        };

        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .expect("HMAC key of any length is valid");
        mac.update(self.trace_id.as_bytes());
        mac.verify_slice(&sig_bytes).is_ok()
    }

    /// Serialize to the transport-safe encoding: base64 of the JSON wire shape
    pub fn encode(&self) -> Result<String, EnvelopeError> {
        let json = serde_json::to_vec(self).map_err(EnvelopeError::Serialize)?;
        Ok(general_purpose::STANDARD.encode(json))
    }

    /// Reverse of [`Envelope::encode`]
    pub fn decode(raw: &str) -> Result<Self, EnvelopeError> {
        let bytes = general_purpose::STANDARD.decode(raw)?;
        let text = String::from_utf8(bytes).map_err(|_| EnvelopeError::InvalidUtf8)?;
        serde_json::from_str(&text).map_err(EnvelopeError::Deserialize)
    }
}
