//! Invocation configuration for the Bedrock transport.
//!
//! Three values come from the secret store (`aws/access_key_id`,
//! `aws/secret_access_key`, `aws/region`); everything else is fixed or has a
//! sane default. Timeouts follow the original operational settings: 30s to
//! connect, 120s for the full request.

use crate::error_handler::{ConfigError, Result, get_secret};

/// Fixed model identifier for the analysis calls.
pub const DEFAULT_MODEL_ID: &str = "anthropic.claude-3-5-sonnet-20240620-v1:0";

/// Connection timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Full-request (response read) timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Configuration for a Bedrock model invocation.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Model identifier (e.g. `anthropic.claude-3-5-sonnet-20240620-v1:0`).
    pub model_id: String,

    /// AWS region hosting the Bedrock runtime (e.g. `us-east-1`).
    pub region: String,

    /// Access key id used for request signing.
    pub access_key_id: String,

    /// Secret access key used for request signing.
    pub secret_access_key: String,

    /// Connection timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Full-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl ModelConfig {
    /// Loads credentials and region from the secret store and pairs them with
    /// the fixed model id and default timeouts.
    ///
    /// # Errors
    /// Returns [`ConfigError::MissingSecret`] if any of the three secrets is
    /// absent, or [`ConfigError::InvalidRegion`] if the region has an
    /// unexpected format.
    pub fn from_secrets() -> Result<Self> {
        let access_key_id = get_secret("aws", "access_key_id")?;
        let secret_access_key = get_secret("aws", "secret_access_key")?;
        let region = get_secret("aws", "region")?;
        let cfg = Self {
            model_id: DEFAULT_MODEL_ID.to_string(),
            region,
            access_key_id,
            secret_access_key,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates the region and model id formats.
    pub fn validate(&self) -> Result<()> {
        if self.model_id.trim().is_empty() {
            return Err(ConfigError::EmptyModel.into());
        }
        let region_ok = !self.region.is_empty()
            && self
                .region
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        if !region_ok {
            return Err(ConfigError::InvalidRegion(self.region.clone()).into());
        }
        Ok(())
    }

    /// Hostname of the regional Bedrock runtime endpoint.
    pub fn host(&self) -> String {
        format!("bedrock-runtime.{}.amazonaws.com", self.region)
    }
}
