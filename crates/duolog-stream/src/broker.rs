//! Per-debate message broker

use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use duolog_core::Message;

use crate::session::{SessionShared, SessionSnapshot, SessionStatus};
use crate::subscription::Subscription;

/// Broker errors
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("Debate not found: {0}")]
    SessionNotFound(Uuid),
    #[error("Debate already closed: {0}")]
    SessionClosed(Uuid),
    #[error("Debate already exists: {0}")]
    SessionExists(Uuid),
}

/// Broker timing configuration
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Idle interval after which subscribers receive a keepalive ping
    pub keepalive: Duration,
    /// How long a finished session lingers for late readers before sweep
    pub grace: Duration,
    /// Consecutive pings before an idle subscription is closed
    pub max_idle_pings: u32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            keepalive: Duration::from_secs(15),
            grace: Duration::from_secs(60),
            max_idle_pings: 40,
        }
    }
}

/// In-memory registry of live debate sessions.
///
/// Owns all mutable live-session state; persisted records never pass
/// through here. Single writer per session (the debate driver),
/// any number of read-only subscribers.
#[derive(Debug)]
pub struct StreamBroker {
    sessions: RwLock<HashMap<Uuid, Arc<SessionShared>>>,
    config: StreamConfig,
}

impl StreamBroker {
    /// Create a broker and start its background sweeper
    pub fn new(config: StreamConfig) -> Arc<Self> {
        let broker = Arc::new(Self {
            sessions: RwLock::new(HashMap::new()),
            config,
        });
        Self::spawn_sweeper(Arc::downgrade(&broker));
        broker
    }

    /// Broker with default timings
    pub fn with_defaults() -> Arc<Self> {
        Self::new(StreamConfig::default())
    }

    fn spawn_sweeper(broker: Weak<StreamBroker>) {
        tokio::spawn(async move {
            loop {
                let interval = match broker.upgrade() {
                    Some(broker) => {
                        broker.sweep().await;
                        broker.config.grace.max(Duration::from_secs(1))
                    }
                    None => break,
                };
                tokio::time::sleep(interval).await;
            }
        });
    }

    /// Register a new session in `pending` state
    pub async fn open_session(
        &self,
        debate_id: Uuid,
        problem: &str,
        strategy: &str,
    ) -> Result<(), BrokerError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&debate_id) {
            return Err(BrokerError::SessionExists(debate_id));
        }
        sessions.insert(
            debate_id,
            Arc::new(SessionShared::new(
                debate_id,
                problem.to_string(),
                strategy.to_string(),
            )),
        );
        tracing::info!(%debate_id, strategy, "debate session opened");
        Ok(())
    }

    async fn session(&self, debate_id: Uuid) -> Result<Arc<SessionShared>, BrokerError> {
        self.sessions
            .read()
            .await
            .get(&debate_id)
            .cloned()
            .ok_or(BrokerError::SessionNotFound(debate_id))
    }

    /// Append a message to a session's backlog and wake subscribers
    pub async fn publish(&self, debate_id: Uuid, message: Message) -> Result<(), BrokerError> {
        let session = self.session(debate_id).await?;
        {
            let mut state = session.state.lock().await;
            if state.status.is_terminal() {
                return Err(BrokerError::SessionClosed(debate_id));
            }
            if state.status == SessionStatus::Pending {
                state.status = SessionStatus::Running;
            }
            state.backlog.push(message);
        }
        session.notify.notify_waiters();
        Ok(())
    }

    /// Subscribe to a session. The subscription replays the full backlog
    /// from the beginning, then follows live publishes.
    pub async fn subscribe(&self, debate_id: Uuid) -> Result<Subscription, BrokerError> {
        let session = self.session(debate_id).await?;
        session.subscribers.fetch_add(1, Ordering::SeqCst);
        Ok(Subscription::new(
            session,
            self.config.keepalive,
            self.config.max_idle_pings,
        ))
    }

    /// Mark a session terminal and wake all blocked subscribers with the
    /// terminal signal. Idempotent for an already-terminal session.
    pub async fn close_session(
        &self,
        debate_id: Uuid,
        status: SessionStatus,
    ) -> Result<(), BrokerError> {
        debug_assert!(status.is_terminal());
        let session = self.session(debate_id).await?;
        {
            let mut state = session.state.lock().await;
            if !state.status.is_terminal() {
                state.status = status;
                state.closed_at = Some(Instant::now());
            }
        }
        session.notify.notify_waiters();
        tracing::info!(%debate_id, "debate session closed");
        Ok(())
    }

    /// Read-only snapshot for the detail endpoint
    pub async fn snapshot(&self, debate_id: Uuid) -> Option<SessionSnapshot> {
        let session = self.session(debate_id).await.ok()?;
        let state = session.state.lock().await;
        Some(SessionSnapshot::build(&session, &state))
    }

    /// Number of live sessions (diagnostics)
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop terminal sessions whose grace period elapsed with no
    /// remaining subscribers.
    pub async fn sweep(&self) {
        let mut removable = Vec::new();
        {
            let sessions = self.sessions.read().await;
            for (id, session) in sessions.iter() {
                if session.subscribers.load(Ordering::SeqCst) > 0 {
                    continue;
                }
                let state = session.state.lock().await;
                if let Some(closed_at) = state.closed_at {
                    if state.status.is_terminal() && closed_at.elapsed() >= self.config.grace {
                        removable.push(*id);
                    }
                }
            }
        }
        if !removable.is_empty() {
            let mut sessions = self.sessions.write().await;
            for id in removable {
                sessions.remove(&id);
                tracing::debug!(debate_id = %id, "debate session swept");
            }
        }
    }
}
