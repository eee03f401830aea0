//! Environment-based configuration for the completion transport

use serde::{Deserialize, Serialize};
use std::env;

/// Completion provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API key (env: DUOLOG_API_KEY); without one the mock provider is used
    pub api_key: Option<String>,
    /// Base URL of an OpenAI-compatible gateway (env: DUOLOG_API_BASE)
    pub base_url: String,
    /// Model name (env: DUOLOG_MODEL)
    pub model: String,
    /// Per-request timeout in seconds (env: DUOLOG_REQUEST_TIMEOUT_SECS)
    pub request_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-4o-mini".to_string(),
            request_timeout_secs: 60,
        }
    }
}

impl LlmConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: env::var("DUOLOG_API_KEY").ok().filter(|k| !k.is_empty()),
            base_url: env::var("DUOLOG_API_BASE").unwrap_or(defaults.base_url),
            model: env::var("DUOLOG_MODEL").unwrap_or(defaults.model),
            request_timeout_secs: env::var("DUOLOG_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.request_timeout_secs),
        }
    }

    /// Whether a real provider can be constructed
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LlmConfig::default();
        assert!(!config.is_configured());
        assert_eq!(config.request_timeout_secs, 60);
        assert!(config.base_url.starts_with("https://"));
    }
}
