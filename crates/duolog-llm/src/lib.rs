//! # Duolog LLM
//!
//! Chat-completion transport for duolog conversations.
//!
//! A [`CompletionProvider`] turns an ordered message list into text. The
//! [`CompletionClient`] wraps any provider with bounded retry/backoff and
//! a soft-fail mode that embeds transport failures into the conversation
//! instead of aborting it.
//!
//! ## Quick Start
//!
//! ```rust
//! use duolog_llm::{ChatMessage, CompletionClient, MockProvider};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = CompletionClient::mock(MockProvider::constant("Final Answer: 42"));
//!     let reply = client
//!         .complete_soft(&[ChatMessage::user("What is 6 x 7?")], 0.7, 100)
//!         .await;
//!     assert_eq!(reply, "Final Answer: 42");
//! }
//! ```

pub mod client;
pub mod config;
pub mod mock;
pub mod openai_compat;
pub mod provider;

pub use client::{CompletionClient, ProviderError, RetryConfig, ERROR_MARKER};
pub use config::LlmConfig;
pub use mock::MockProvider;
pub use openai_compat::OpenAiCompatProvider;
pub use provider::{ChatMessage, ChatRole, CompletionError, CompletionProvider};
