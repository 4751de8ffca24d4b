//! Retry policy for provider requests
//!
//! Retry/backoff lives here on the provider adapter, not in the
//! conversation loop. Only transport and rate-limit failures are retried;
//! auth and malformed-response failures surface immediately.

use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::base::{Completion, CompletionProvider, Message, ProviderError, ProviderResult};
use kyros_core::config::RetryConfig;

/// Explicit retry schedule: bounded attempts with exponential backoff
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum attempts per request (1 = no retries)
    pub max_attempts: u32,
    /// Initial backoff delay
    pub base_delay: Duration,
    /// Upper bound on a single backoff delay
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Delay before the retry following `attempt` (1-based).
    ///
    /// A server-provided retry-after hint wins over the computed backoff.
    pub fn delay_for(&self, attempt: u32, retry_after: Option<u64>) -> Duration {
        if let Some(seconds) = retry_after {
            return Duration::from_secs(seconds).min(self.max_delay);
        }
        let exp = attempt.saturating_sub(1).min(16);
        let backoff = self.base_delay.saturating_mul(1u32 << exp);
        backoff.min(self.max_delay)
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

/// Wraps any provider with the retry policy
pub struct RetryingProvider<P> {
    inner: P,
    policy: RetryPolicy,
}

impl<P> RetryingProvider<P> {
    /// Create a retrying wrapper around `inner`
    pub fn new(inner: P, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<P: CompletionProvider> CompletionProvider for RetryingProvider<P> {
    async fn generate(
        &self,
        messages: Vec<Message>,
        model: Option<String>,
        max_tokens: u32,
        temperature: f64,
    ) -> ProviderResult<Completion> {
        let mut attempt = 1;
        loop {
            match self
                .inner
                .generate(messages.clone(), model.clone(), max_tokens, temperature)
                .await
            {
                Ok(completion) => return Ok(completion),
                Err(err) if err.is_retryable() && attempt < self.policy.max_attempts => {
                    let retry_after = match &err {
                        ProviderError::RateLimit { retry_after } => *retry_after,
                        _ => None,
                    };
                    let delay = self.policy.delay_for(attempt, retry_after);
                    warn!(
                        "Provider request failed (attempt {}/{}), retrying in {:?}: {}",
                        attempt, self.policy.max_attempts, delay, err
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn default_model(&self) -> String {
        self.inner.default_model()
    }
}
