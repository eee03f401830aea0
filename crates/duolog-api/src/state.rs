//! Application state
//!
//! Centralizes the completion client, registries, live-session broker,
//! and evaluation manager behind one cloneable handle. Constructed once
//! at startup and passed to every handler; no module-level singletons.

use std::sync::Arc;

use duolog_core::StrategyRegistry;
use duolog_eval::EvaluationManager;
use duolog_llm::CompletionClient;
use duolog_stream::StreamBroker;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    client: CompletionClient,
    strategies: Arc<StrategyRegistry>,
    broker: Arc<StreamBroker>,
    evaluations: Arc<EvaluationManager>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        client: CompletionClient,
        strategies: Arc<StrategyRegistry>,
        broker: Arc<StreamBroker>,
        evaluations: Arc<EvaluationManager>,
    ) -> Self {
        Self {
            client,
            strategies,
            broker,
            evaluations,
        }
    }

    /// Get the completion client
    pub fn client(&self) -> &CompletionClient {
        &self.client
    }

    /// Get the strategy registry
    pub fn strategies(&self) -> &StrategyRegistry {
        &self.strategies
    }

    /// Get the live-session broker (cloned Arc for sharing)
    pub fn broker(&self) -> Arc<StreamBroker> {
        self.broker.clone()
    }

    /// Get the evaluation manager (cloned Arc for sharing)
    pub fn evaluations(&self) -> Arc<EvaluationManager> {
        self.evaluations.clone()
    }
}
