//! Live debate session state

use std::sync::atomic::AtomicUsize;
use std::time::Instant;

use serde::Serialize;
use tokio::sync::{Mutex, Notify};
use uuid::Uuid;

use duolog_core::{Message, Variant};

/// Lifecycle of a live debate session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    /// Created, no turn produced yet
    Pending,
    /// Turns are being published
    Running,
    /// Both variants finished
    Complete,
    /// The driver hit an unrecoverable fault
    Error(String),
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Complete | SessionStatus::Error(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Running => "running",
            SessionStatus::Complete => "complete",
            SessionStatus::Error(_) => "error",
        }
    }

    pub fn error_message(&self) -> Option<String> {
        match self {
            SessionStatus::Error(message) => Some(message.clone()),
            _ => None,
        }
    }
}

/// Mutable per-session state, guarded by the session mutex
#[derive(Debug)]
pub(crate) struct SessionState {
    pub backlog: Vec<Message>,
    pub status: SessionStatus,
    pub closed_at: Option<Instant>,
}

/// Shared handle between the broker, the publishing driver, and all
/// subscriptions of one session
#[derive(Debug)]
pub(crate) struct SessionShared {
    pub debate_id: Uuid,
    pub problem: String,
    pub strategy: String,
    pub state: Mutex<SessionState>,
    pub notify: Notify,
    pub subscribers: AtomicUsize,
}

impl SessionShared {
    pub fn new(debate_id: Uuid, problem: String, strategy: String) -> Self {
        Self {
            debate_id,
            problem,
            strategy,
            state: Mutex::new(SessionState {
                backlog: Vec::new(),
                status: SessionStatus::Pending,
                closed_at: None,
            }),
            notify: Notify::new(),
            subscribers: AtomicUsize::new(0),
        }
    }
}

/// Read-only view of a session for the detail endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub problem: String,
    pub strategy: String,
    pub status: String,
    pub in_progress: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub simulated_messages: Vec<Message>,
    pub dual_agent_messages: Vec<Message>,
}

impl SessionSnapshot {
    pub(crate) fn build(shared: &SessionShared, state: &SessionState) -> Self {
        let by_variant = |variant: Variant| {
            state
                .backlog
                .iter()
                .filter(|m| m.variant == variant)
                .cloned()
                .collect()
        };
        Self {
            id: shared.debate_id,
            problem: shared.problem.clone(),
            strategy: shared.strategy.clone(),
            status: state.status.label().to_string(),
            in_progress: !state.status.is_terminal(),
            error: state.status.error_message(),
            simulated_messages: by_variant(Variant::Simulated),
            dual_agent_messages: by_variant(Variant::Dual),
        }
    }
}
