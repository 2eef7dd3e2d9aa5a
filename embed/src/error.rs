//! Error types for embedding providers.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for embedding operations.
pub type Result<T> = std::result::Result<T, EmbedError>;

/// Error type for embedding operations.
///
/// Every provider failure is mapped onto one of these kinds so that callers
/// can tell retryable conditions (rate limits, transport, server errors)
/// apart from ones that will never succeed as-is.
#[derive(Error, Debug)]
pub enum EmbedError {
    /// Missing or invalid configuration, raised at construction.
    #[error("embed: invalid configuration: {0}")]
    Config(String),

    /// The provider rejected the credentials (HTTP 401/403).
    #[error("embed: {provider}: authentication failed: {message}")]
    Auth { provider: String, message: String },

    /// The provider is throttling requests (HTTP 429).
    #[error("embed: {provider}: rate limited: {message}")]
    RateLimit {
        provider: String,
        message: String,
        retry_after: Option<Duration>,
    },

    /// Any other non-success HTTP status.
    #[error("embed: {provider}: HTTP {status}: {message}")]
    Api {
        provider: String,
        status: u16,
        message: String,
    },

    /// Network-level failure: connect, timeout, or a broken body.
    #[error("embed: {provider}: transport error: {source}")]
    Transport {
        provider: String,
        #[source]
        source: reqwest::Error,
    },

    /// The response did not match the request (shape, count, index, dimension).
    #[error("embed: {provider}: protocol error: {message}")]
    Protocol { provider: String, message: String },

    /// The caller cancelled the operation.
    #[error("embed: cancelled")]
    Cancelled,
}

impl EmbedError {
    /// Creates a new configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        EmbedError::Config(message.into())
    }

    /// Creates a new protocol error.
    pub fn protocol(provider: &str, message: impl Into<String>) -> Self {
        EmbedError::Protocol {
            provider: provider.to_string(),
            message: message.into(),
        }
    }

    /// Returns true if this is an authentication error.
    pub fn is_auth(&self) -> bool {
        matches!(self, EmbedError::Auth { .. })
    }

    /// Returns true if this is a rate limit error.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, EmbedError::RateLimit { .. })
    }

    /// Returns true if the operation was cancelled by the caller.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, EmbedError::Cancelled)
    }

    /// Returns true if this is a server-side error.
    pub fn is_server_error(&self) -> bool {
        matches!(self, EmbedError::Api { status, .. } if *status >= 500)
    }

    /// Returns true if the request can be retried.
    pub fn is_retryable(&self) -> bool {
        self.is_rate_limit()
            || self.is_server_error()
            || matches!(self, EmbedError::Transport { .. })
    }

    /// Returns the delay the provider asked for before retrying, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            EmbedError::RateLimit { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}
