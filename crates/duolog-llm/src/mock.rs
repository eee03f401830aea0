//! Mock completion provider for testing

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::provider::{ChatMessage, CompletionError, CompletionProvider};

/// A mock provider that returns predefined responses, optionally failing
/// first. Used in tests and as the keyless startup fallback.
#[derive(Debug)]
pub struct MockProvider {
    name: String,
    /// Canned responses (cycles through them)
    responses: Vec<String>,
    index: AtomicUsize,
    /// Transient failures to emit before the first success
    transient_failures: AtomicU32,
    /// Fail every call with a non-transient error
    broken: bool,
    latency: Duration,
}

impl MockProvider {
    /// Mock cycling through the given responses
    pub fn scripted(responses: Vec<String>) -> Self {
        Self {
            name: "mock".to_string(),
            responses,
            index: AtomicUsize::new(0),
            transient_failures: AtomicU32::new(0),
            broken: false,
            latency: Duration::from_millis(5),
        }
    }

    /// Mock that always returns the same response
    pub fn constant(response: &str) -> Self {
        Self::scripted(vec![response.to_string()])
    }

    /// Mock that fails transiently `failures` times, then succeeds
    pub fn flaky(failures: u32, response: &str) -> Self {
        let mock = Self::constant(response);
        mock.transient_failures.store(failures, Ordering::Relaxed);
        mock
    }

    /// Mock that fails every call with a non-transient error
    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::scripted(vec![])
        }
    }

    /// Override the simulated latency
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        _temperature: f32,
        _max_output_tokens: u32,
    ) -> Result<String, CompletionError> {
        tokio::time::sleep(self.latency).await;

        if self.broken {
            return Err(CompletionError::RequestFailed(
                "mock provider is broken".to_string(),
            ));
        }

        if self
            .transient_failures
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
                (n > 0).then(|| n - 1)
            })
            .is_ok()
        {
            return Err(CompletionError::Connection(
                "simulated connection reset".to_string(),
            ));
        }

        if self.responses.is_empty() {
            // Echo a stub so the conversation stays plausible
            let tail = messages.last().map(|m| m.content.as_str()).unwrap_or("");
            let preview: String = tail.chars().take(40).collect();
            return Ok(format!("Considering \"{}\"...", preview));
        }

        let idx = self.index.fetch_add(1, Ordering::Relaxed);
        Ok(self.responses[idx % self.responses.len()].clone())
    }
}
