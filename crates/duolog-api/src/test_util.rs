//! Shared state construction for handler tests

use std::sync::Arc;
use std::time::Duration;

use duolog_core::StrategyRegistry;
use duolog_eval::{BenchmarkRegistry, EvaluationManager};
use duolog_llm::{CompletionClient, MockProvider};
use duolog_persist::{ComparisonStore, LogStore, MemoryBackend, RunStore, StorageBackend};
use duolog_stream::{StreamBroker, StreamConfig};

use crate::state::AppState;

pub fn test_state_with(provider: MockProvider, benchmarks: BenchmarkRegistry) -> AppState {
    let client = CompletionClient::mock(provider.with_latency(Duration::ZERO));
    let strategies = Arc::new(StrategyRegistry::builtin());
    let backend: Arc<dyn StorageBackend> = Arc::new(MemoryBackend::new());
    let evaluations = EvaluationManager::new(
        client.clone(),
        strategies.clone(),
        Arc::new(benchmarks),
        RunStore::new(backend.clone()),
        LogStore::new(backend.clone()),
        ComparisonStore::new(backend),
    );
    let broker = StreamBroker::new(StreamConfig {
        keepalive: Duration::from_millis(50),
        grace: Duration::from_secs(60),
        max_idle_pings: 40,
    });
    AppState::new(client, strategies, broker, evaluations)
}

pub fn test_state(provider: MockProvider) -> AppState {
    test_state_with(provider, BenchmarkRegistry::new())
}
