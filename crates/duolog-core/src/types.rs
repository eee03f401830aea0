//! Message and role types shared across variants

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// The human problem statement
    User,
    /// First agent (proponent / proposer / teacher, depending on strategy)
    #[serde(rename = "Agent A")]
    AgentA,
    /// Second agent (critic / extender / student)
    #[serde(rename = "Agent B")]
    AgentB,
    /// Injected system prompt, shown for transparency
    System,
}

impl Role {
    /// Display label, also used when cross-posting a reply into the
    /// counterpart agent's history ("Agent A: ...").
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::AgentA => "Agent A",
            Role::AgentB => "Agent B",
            Role::System => "System",
        }
    }

    /// The agent acting on a given 1-based turn: A on odd turns, B on even.
    pub fn for_turn(turn: u32) -> Role {
        if turn % 2 == 1 {
            Role::AgentA
        } else {
            Role::AgentB
        }
    }

    /// The opposite agent role. Only meaningful for agent roles.
    pub fn counterpart(&self) -> Role {
        match self {
            Role::AgentA => Role::AgentB,
            Role::AgentB => Role::AgentA,
            other => *other,
        }
    }

    /// Whether this role is one of the two debating agents
    pub fn is_agent(&self) -> bool {
        matches!(self, Role::AgentA | Role::AgentB)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Which conversation a message belongs to.
///
/// Serialized as `type` on the wire for compatibility with stream clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Single model alternating both roles over a shared transcript
    Simulated,
    /// Two role-bound histories, one per agent
    Dual,
    /// Pre-split content shown once (the live problem statement)
    Initial,
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Variant::Simulated => f.write_str("simulated"),
            Variant::Dual => f.write_str("dual"),
            Variant::Initial => f.write_str("initial"),
        }
    }
}

/// One turn's worth of conversation output.
///
/// Ids are globally unique so stream clients can de-duplicate on a
/// re-delivered backlog; ordering is append-only per (session, variant).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique id
    pub id: Uuid,
    /// Producing role
    pub role: Role,
    /// Raw text, without any role label prefix
    pub content: String,
    /// Creation time
    pub timestamp: DateTime<Utc>,
    /// Owning conversation variant
    #[serde(rename = "type")]
    pub variant: Variant,
}

impl Message {
    /// Create a message stamped now with a fresh id
    pub fn new(role: Role, content: impl Into<String>, variant: Variant) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            variant,
        }
    }
}
