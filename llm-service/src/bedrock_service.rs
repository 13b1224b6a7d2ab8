//! Bedrock runtime client for Anthropic messages invocations.
//!
//! Thin client around `POST https://bedrock-runtime.{region}.amazonaws.com/
//! model/{model_id}/invoke`, signed with SigV4. Uses the universal
//! [`ModelConfig`] for credentials, region, and timeouts.

use std::time::Duration;

use reqwest::header;
use tracing::{debug, info, instrument};

use crate::config::ModelConfig;
use crate::error_handler::{LlmServiceError, Result};
use crate::sigv4::{self, SigningKeys};
use crate::transport::{InvokeReply, InvokeRequest, ModelTransport};

/// Thin client for the Bedrock runtime.
///
/// Initialized with a full [`ModelConfig`]. Reuses an HTTP client with the
/// configured connect/request timeouts; a fresh instance per analysis request
/// is also fine, nothing here is shared mutable state.
pub struct BedrockService {
    client: reqwest::Client,
    cfg: ModelConfig,
    host: String,
    path: String,
    url: String,
}

impl BedrockService {
    /// Creates a new [`BedrockService`] from the given config.
    ///
    /// # Errors
    /// - [`crate::error_handler::ConfigError`] variants if the config fails validation
    /// - [`LlmServiceError::Transport`] if the HTTP client cannot be built
    pub fn new(cfg: ModelConfig) -> Result<Self> {
        cfg.validate()?;

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()?;

        let host = cfg.host();
        let path = format!("/model/{}/invoke", sigv4::uri_encode(&cfg.model_id));
        let url = format!("https://{host}{path}");

        info!(
            model = %cfg.model_id,
            region = %cfg.region,
            connect_timeout_secs = cfg.connect_timeout_secs,
            request_timeout_secs = cfg.request_timeout_secs,
            "BedrockService initialized"
        );

        Ok(Self {
            client,
            cfg,
            host,
            path,
            url,
        })
    }
}

impl ModelTransport for BedrockService {
    #[instrument(skip_all, fields(model = %self.cfg.model_id))]
    async fn send(&self, request: &InvokeRequest) -> Result<InvokeReply> {
        let body = serde_json::to_vec(request)
            .map_err(|e| LlmServiceError::Decode(format!("serialize request: {e}")))?;

        let keys = SigningKeys {
            access_key_id: &self.cfg.access_key_id,
            secret_access_key: &self.cfg.secret_access_key,
            region: &self.cfg.region,
            service: "bedrock",
        };
        let signed = sigv4::sign_request(&keys, "POST", &self.host, &self.path, &body, chrono::Utc::now());

        debug!("POST {}", self.url);
        let resp = self
            .client
            .post(&self.url)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json")
            .header("x-amz-date", &signed.amz_date)
            .header(header::AUTHORIZATION, &signed.authorization)
            .body(body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            let snippet = text.chars().take(240).collect::<String>();
            return Err(LlmServiceError::HttpStatus {
                status,
                url: self.url.clone(),
                snippet,
            });
        }

        resp.json::<InvokeReply>()
            .await
            .map_err(|e| LlmServiceError::Decode(format!("serde error: {e}")))
    }
}
