//! High-level model invocation: request assembly, bounded retries, reply
//! extraction.
//!
//! [`ModelInvoker`] is the boundary the analysis pipeline talks to. It never
//! lets transport errors escape raw: retry exhaustion becomes
//! [`LlmServiceError::ModelUnavailable`] carrying the last error's message,
//! and a reply whose first content block is not text becomes
//! [`LlmServiceError::MalformedReply`].

use tracing::debug;

use crate::error_handler::{LlmServiceError, Result};
use crate::retry::{RetryPolicy, retry_with_backoff};
use crate::transport::{InvokeRequest, ModelTransport};

/// Retry-wrapped invoker over any [`ModelTransport`].
pub struct ModelInvoker<T> {
    transport: T,
    retry: RetryPolicy,
}

impl<T: ModelTransport> ModelInvoker<T> {
    /// Wraps a transport with the default retry policy (3 retries, 5s base).
    pub fn new(transport: T) -> Self {
        Self::with_retry(transport, RetryPolicy::default())
    }

    /// Wraps a transport with an explicit retry policy.
    pub fn with_retry(transport: T, retry: RetryPolicy) -> Self {
        Self { transport, retry }
    }

    /// Invokes the model and returns the text of the reply's first content
    /// block.
    ///
    /// # Errors
    /// - [`LlmServiceError::ModelUnavailable`] once the retry bound is exhausted
    /// - [`LlmServiceError::MalformedReply`] if the reply has no leading text block
    pub async fn invoke(&self, system: &str, prompt: &str) -> Result<String> {
        let request = InvokeRequest::new(system, prompt);

        let reply = retry_with_backoff(self.retry, |attempt| {
            debug!(attempt, "invoking model");
            self.transport.send(&request)
        })
        .await
        .map_err(|exhausted| LlmServiceError::ModelUnavailable {
            attempts: exhausted.attempts,
            last_error: exhausted.last_error.to_string(),
        })?;

        match reply.first_text() {
            Some(text) => Ok(text.to_owned()),
            None => Err(LlmServiceError::MalformedReply(
                "reply has no leading text content block".to_string(),
            )),
        }
    }
}
