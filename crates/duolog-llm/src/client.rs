//! Retrying completion client with soft-fail semantics

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::mock::MockProvider;
use crate::provider::{ChatMessage, CompletionError, CompletionProvider};

/// Marker prefixing a turn whose completion call failed. Callers treat an
/// error-marked turn as content the strategy can accommodate, not a fault.
pub const ERROR_MARKER: &str = "API Error: ";

/// A provider call that kept failing after all retries
#[derive(Debug, Error)]
#[error("completion failed after {attempts} attempt(s): {source}")]
pub struct ProviderError {
    pub attempts: u32,
    #[source]
    pub source: CompletionError,
}

/// Retry policy for transient provider failures
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Backoff before attempt n+1 is `base_delay * 2^n`
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

/// Client wrapping any [`CompletionProvider`] with bounded retry/backoff.
///
/// One `&self` async method serves both call patterns the system needs:
/// awaited inline by a live debate task, or fanned out under `join!` by
/// the benchmark runner. Retry semantics are identical either way.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    provider: Arc<dyn CompletionProvider>,
    retry: RetryConfig,
}

impl CompletionClient {
    /// Wrap a provider with the default retry policy
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            provider,
            retry: RetryConfig::default(),
        }
    }

    /// Wrap a mock provider (test/dev convenience)
    pub fn mock(provider: MockProvider) -> Self {
        Self::new(Arc::new(provider))
    }

    /// Override the retry policy
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Provider name for logging
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Generate a completion, retrying transient failures with
    /// exponential backoff. Non-transient failures return immediately.
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_output_tokens: u32,
    ) -> Result<String, ProviderError> {
        let mut attempt: u32 = 0;
        loop {
            match self
                .provider
                .complete(messages, temperature, max_output_tokens)
                .await
            {
                Ok(text) => return Ok(text.trim().to_string()),
                Err(e) if e.is_transient() && attempt + 1 < self.retry.max_attempts => {
                    let delay = self.retry.base_delay * 2u32.pow(attempt);
                    tracing::warn!(
                        provider = %self.provider.name(),
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "transient completion failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(ProviderError {
                        attempts: attempt + 1,
                        source: e,
                    })
                }
            }
        }
    }

    /// Like [`complete`](Self::complete), but a final failure is returned
    /// as an error-marked string instead of an error, so one failed call
    /// degrades a single conversation turn rather than aborting the run.
    pub async fn complete_soft(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_output_tokens: u32,
    ) -> String {
        match self.complete(messages, temperature, max_output_tokens).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(provider = %self.provider.name(), error = %e, "completion soft-failed");
                format!("{}{}", ERROR_MARKER, e.source)
            }
        }
    }
}
