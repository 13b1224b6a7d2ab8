//! Bedrock model invocation for the stored-procedure analyzer.
//!
//! Layers, bottom up:
//! - [`sigv4`] — minimal request signing for the Bedrock runtime endpoint
//! - [`transport`] — wire payload types and the [`ModelTransport`] seam
//! - [`bedrock_service`] — the reqwest-backed production transport
//! - [`retry`] — pure bounded exponential-backoff combinator
//! - [`invoker`] — [`ModelInvoker`]: retry wrap + first-text-block extraction
//!
//! Configuration comes from a namespaced secret store backed by the
//! environment ([`get_secret`]); errors are unified under
//! [`LlmServiceError`]. No `async-trait`, no `Box<dyn ...>`: callers are
//! generic over the transport so tests can substitute stubs.

pub mod bedrock_service;
pub mod config;
pub mod error_handler;
pub mod invoker;
pub mod retry;
pub mod sigv4;
pub mod transport;

pub use bedrock_service::BedrockService;
pub use config::ModelConfig;
pub use error_handler::{ConfigError, LlmServiceError, Result, get_secret};
pub use invoker::ModelInvoker;
pub use retry::RetryPolicy;
pub use transport::{ContentBlock, InvokeReply, InvokeRequest, Message, ModelTransport};
