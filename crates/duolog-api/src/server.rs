//! Server assembly with graceful shutdown

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use duolog_core::StrategyRegistry;
use duolog_eval::{BenchmarkRegistry, EvaluationManager};
use duolog_llm::{CompletionClient, LlmConfig, MockProvider, OpenAiCompatProvider};
use duolog_persist::{
    ComparisonStore, FsBackend, LogStore, MemoryBackend, RunStore, StorageBackend,
};
use duolog_stream::{StreamBroker, StreamConfig};

use crate::error::ApiError;
use crate::routes::api_router;
use crate::state::AppState;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server address
    pub addr: SocketAddr,
    /// Directory for persisted records; in-memory when unset
    pub data_dir: Option<PathBuf>,
    /// Directory holding benchmark datasets
    pub benchmark_dir: PathBuf,
    /// Live-stream timings
    pub stream: StreamConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 5001)),
            data_dir: None,
            benchmark_dir: PathBuf::from("./data/benchmarks"),
            stream: StreamConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port: u16 = std::env::var("DUOLOG_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(5001);

        let secs = |var: &str, fallback: Duration| {
            std::env::var(var)
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(fallback)
        };

        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], port)),
            data_dir: std::env::var("DUOLOG_DATA_DIR").ok().map(PathBuf::from),
            benchmark_dir: std::env::var("DUOLOG_BENCHMARK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.benchmark_dir),
            stream: StreamConfig {
                keepalive: secs("DUOLOG_KEEPALIVE_SECS", defaults.stream.keepalive),
                grace: secs("DUOLOG_SESSION_GRACE_SECS", defaults.stream.grace),
                max_idle_pings: defaults.stream.max_idle_pings,
            },
        }
    }
}

/// Duolog API server
pub struct Server {
    config: ServerConfig,
    state: AppState,
}

impl Server {
    /// Wire up providers, stores, and registries from the configuration
    pub async fn new(config: ServerConfig) -> Result<Self, ApiError> {
        let llm_config = LlmConfig::from_env();
        let client = match OpenAiCompatProvider::from_config(&llm_config) {
            Some(provider) => {
                tracing::info!(
                    model = %llm_config.model,
                    base_url = %llm_config.base_url,
                    "using OpenAI-compatible completion provider"
                );
                CompletionClient::new(Arc::new(provider))
            }
            None => {
                tracing::warn!("DUOLOG_API_KEY not set. Using mock completion provider.");
                CompletionClient::mock(MockProvider::scripted(vec![
                    "Let me reason through this step by step.".to_string(),
                    "I see a gap in that reasoning; consider the edge cases.".to_string(),
                    "Taking that into account, the conclusion holds. Final Answer: undetermined"
                        .to_string(),
                ]))
            }
        };

        let backend: Arc<dyn StorageBackend> = match &config.data_dir {
            Some(dir) => {
                tracing::info!(dir = %dir.display(), "persisting records to disk");
                Arc::new(FsBackend::new(dir).map_err(|e| ApiError::Internal(e.to_string()))?)
            }
            None => {
                tracing::warn!("DUOLOG_DATA_DIR not set; records live in memory only");
                Arc::new(MemoryBackend::new())
            }
        };

        let strategies = Arc::new(StrategyRegistry::builtin());
        let benchmarks = Arc::new(BenchmarkRegistry::builtin(&config.benchmark_dir));

        let evaluations = EvaluationManager::new(
            client.clone(),
            strategies.clone(),
            benchmarks,
            RunStore::new(backend.clone()),
            LogStore::new(backend.clone()),
            ComparisonStore::new(backend),
        );
        let broker = StreamBroker::new(config.stream.clone());

        Ok(Self {
            config,
            state: AppState::new(client, strategies, broker, evaluations),
        })
    }

    /// Get the configured router.
    ///
    /// No request-timeout layer here: the SSE stream is long-lived by
    /// design, and the provider-level timeout bounds the slow calls.
    pub fn router(&self) -> Router {
        api_router(self.state.clone())
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
    }

    /// Application state (tests and embedding)
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server with graceful shutdown
    pub async fn run(self) -> Result<(), ApiError> {
        let app = self.router();
        let addr = self.config.addr;

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ApiError::Internal(format!("bind {}: {}", addr, e)))?;

        tracing::info!("duolog API listening on http://{}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Initialize tracing subscriber
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,duolog_api=debug,tower_http=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.addr.port(), 5001);
        assert!(config.data_dir.is_none());
        assert_eq!(config.stream.keepalive, Duration::from_secs(15));
    }

    #[tokio::test]
    async fn test_server_wires_up_without_env() {
        let server = Server::new(ServerConfig::default()).await.unwrap();
        // No API key in tests: the mock provider backs the client
        assert_eq!(server.state().client().provider_name(), "mock");
        assert_eq!(
            server.state().strategies().ids(),
            vec!["cooperative", "debate", "teacher-student"]
        );
    }
}
