//! Completion provider trait and common types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from completion providers
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Request timed out")]
    Timeout,
    #[error("Connection failed: {0}")]
    Connection(String),
    #[error("Rate limited")]
    RateLimited,
    #[error("Request failed: {0}")]
    RequestFailed(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl CompletionError {
    /// Transient failures are worth retrying with backoff; the rest fail
    /// the attempt immediately.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CompletionError::Timeout | CompletionError::Connection(_) | CompletionError::RateLimited
        )
    }
}

/// Chat role on the provider wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One entry of the ordered message list sent to a provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Trait for chat-completion backends: message list in, text out
#[async_trait]
pub trait CompletionProvider: Send + Sync + std::fmt::Debug {
    /// Provider name for logging
    fn name(&self) -> &str;

    /// Generate one completion for the given history
    async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_output_tokens: u32,
    ) -> Result<String, CompletionError>;
}
