//! Unified error handling for `llm-service`.
//!
//! This module exposes a single top-level error type [`LlmServiceError`] for
//! the whole library and groups configuration errors in a nested enum
//! ([`ConfigError`]). A small helper for reading namespaced secrets from the
//! environment is provided and returns the unified [`Result<T>`] alias.
//!
//! All messages carry the `[LLM Service]` prefix to simplify attribution in
//! logs.

use thiserror::Error;

/* ------------------------------------------------------------------------- */
/* Public result alias                                                       */
/* ------------------------------------------------------------------------- */

/// Unified result alias for the entire crate.
pub type Result<T> = std::result::Result<T, LlmServiceError>;

/* ------------------------------------------------------------------------- */
/* Top-level error                                                           */
/* ------------------------------------------------------------------------- */

/// Top-level error for the `llm-service` crate.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum LlmServiceError {
    /// Configuration/secret-loading errors (startup, before any remote call).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Underlying HTTP transport error (e.g., `reqwest::Error`).
    #[error("[LLM Service] transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Upstream returned a non-successful HTTP status.
    #[error("[LLM Service] HTTP {status} from {url}: {snippet}")]
    HttpStatus {
        /// Numeric HTTP status code.
        status: reqwest::StatusCode,
        /// Request URL.
        url: String,
        /// Short snippet of the response body (trimmed).
        snippet: String,
    },

    /// Response payload could not be decoded as expected.
    #[error("[LLM Service] failed to decode model reply: {0}")]
    Decode(String),

    /// Transport succeeded but the reply shape is not usable.
    #[error("[LLM Service] malformed model reply: {0}")]
    MalformedReply(String),

    /// All retries of the remote call were exhausted.
    #[error("[LLM Service] can't invoke model after {attempts} attempts: {last_error}")]
    ModelUnavailable {
        /// Total attempts issued, including the first.
        attempts: u32,
        /// Message of the last underlying error.
        last_error: String,
    },
}

/* ------------------------------------------------------------------------- */
/* Config errors                                                             */
/* ------------------------------------------------------------------------- */

/// Error enum for secret/config-driven setup.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required secret is missing or empty.
    #[error("[LLM Service] missing required secret: {namespace}/{key}")]
    MissingSecret { namespace: String, key: String },

    /// Region string has the wrong format.
    #[error("[LLM Service] invalid region: {0:?}")]
    InvalidRegion(String),

    /// Model identifier was empty.
    #[error("[LLM Service] model id must not be empty")]
    EmptyModel,
}

/* ------------------------------------------------------------------------- */
/* Secret helpers (return unified `Result<T>`)                               */
/* ------------------------------------------------------------------------- */

/// Fetches a required, non-empty secret from the process environment.
///
/// The lookup key is `{NAMESPACE}_{KEY}` uppercased, so
/// `get_secret("aws", "region")` reads `AWS_REGION`. Values may come from a
/// real environment or a `.env` file loaded by the binary.
///
/// # Errors
/// Returns [`ConfigError::MissingSecret`] if the variable is absent or empty.
pub fn get_secret(namespace: &str, key: &str) -> Result<String> {
    let var = format!("{namespace}_{key}").to_uppercase();
    match std::env::var(&var) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::MissingSecret {
            namespace: namespace.to_string(),
            key: key.to_string(),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_secret_reads_uppercased_namespaced_var() {
        // Safety: test-only env mutation, unique variable name.
        unsafe { std::env::set_var("SPTEST_TOKEN", "abc") };
        assert_eq!(get_secret("sptest", "token").unwrap(), "abc");
    }

    #[test]
    fn get_secret_rejects_missing_and_empty() {
        assert!(matches!(
            get_secret("sptest", "nope"),
            Err(LlmServiceError::Config(ConfigError::MissingSecret { .. }))
        ));
        unsafe { std::env::set_var("SPTEST_BLANK", "   ") };
        assert!(get_secret("sptest", "blank").is_err());
    }
}
