use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::{EmbedError, Result};

/// Retry policy for transient chunk failures.
///
/// The default policy never retries; errors reach the caller unchanged.
/// When enabled, only [`EmbedError::is_retryable`] errors are retried, with
/// exponential backoff: `initial_backoff`, 2x, 4x, ... capped at
/// `max_backoff`. A provider's `Retry-After` wins when it is longer, but one
/// beyond `max_backoff` ends retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }

    /// Delay before retry number `attempt + 1`, or `None` when the server
    /// asks for a longer wait than `max_backoff`.
    pub fn backoff(&self, attempt: u32, retry_after: Option<Duration>) -> Option<Duration> {
        let exp = self
            .initial_backoff
            .saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX))
            .min(self.max_backoff);
        match retry_after {
            Some(d) if d > self.max_backoff => None,
            Some(d) if d > exp => Some(d),
            _ => Some(exp),
        }
    }
}

/// Sleep for `delay` unless cancelled first.
pub(crate) async fn sleep(cancel: &CancellationToken, delay: Duration) -> Result<()> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(EmbedError::Cancelled),
        _ = tokio::time::sleep(delay) => Ok(()),
    }
}
