//! Environment-driven client configuration.

use crate::ServiceIdentity;
use courier_transport::ConnectionSettings;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration loading failed: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

/// Client configuration loaded from `COURIER_*` environment variables.
///
/// | Variable | Meaning | Default |
/// |----------|---------|---------|
/// | `COURIER_SERVICE_NAME` | Name stamped on published envelopes | `app` |
/// | `COURIER_ENDPOINT` | Queue service endpoint URL | required |
/// | `COURIER_ACCESS_KEY_ID` | Service account key id | required |
/// | `COURIER_ACCESS_KEY_SECRET` | Account secret, also the signing key | required |
#[derive(Clone, Deserialize)]
pub struct CourierConfig {
    /// Service name reported as the origin of published messages
    pub service_name: String,

    /// Queue service endpoint URL; the scheme selects the transport driver
    pub endpoint: String,

    /// Access key ID for the service account
    pub access_key_id: String,

    /// Access key secret; doubles as the envelope signing key
    pub access_key_secret: String,
}

impl CourierConfig {
    /// Load configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error when a required variable is absent, or when the
    /// loaded values fail [`CourierConfig::validate`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let loaded = config::Config::builder()
            .set_default("service_name", "app")?
            .add_source(config::Environment::with_prefix("COURIER"))
            .build()?;

        let parsed: CourierConfig = loaded.try_deserialize()?;
        parsed.validate()?;

        Ok(parsed)
    }

    /// Validate field contents beyond presence
    pub fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.endpoint).map_err(|e| ConfigError::Invalid {
            message: format!("endpoint is not a valid URL: {}", e),
        })?;

        if self.access_key_id.is_empty() || self.access_key_secret.is_empty() {
            return Err(ConfigError::Invalid {
                message: "access key id and secret must be non-empty".to_string(),
            });
        }

        Ok(())
    }

    /// Connection parameters for the transport factory
    pub fn connection(&self) -> ConnectionSettings {
        ConnectionSettings {
            endpoint: self.endpoint.clone(),
            access_key_id: self.access_key_id.clone(),
            access_key_secret: self.access_key_secret.clone(),
        }
    }

    /// Signing identity for publish endpoints
    pub fn identity(&self) -> ServiceIdentity {
        ServiceIdentity {
            service_name: self.service_name.clone(),
            secret_key: self.access_key_secret.clone(),
        }
    }
}

impl std::fmt::Debug for CourierConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CourierConfig")
            .field("service_name", &self.service_name)
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"<REDACTED>")
            .finish()
    }
}
