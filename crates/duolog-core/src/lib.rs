//! # Duolog Core
//!
//! Domain types shared by every duolog crate.
//!
//! A *strategy* pairs two role-bound system prompts with a turn policy.
//! A conversation is driven in one of two variants: *simulated* (one model
//! role-playing both agents in a shared transcript) or *dual* (two
//! independently-prompted agents, each with its own view of the
//! transcript). The [`answer`] module grades the transcripts.
//!
//! ## Quick Start
//!
//! ```rust
//! use duolog_core::{StrategyRegistry, Variant};
//!
//! let registry = StrategyRegistry::builtin();
//! let debate = registry.get("debate").unwrap();
//! assert_eq!(debate.max_turns, 5);
//! assert_eq!(Variant::Simulated.to_string(), "simulated");
//! ```

pub mod answer;
pub mod record;
pub mod strategy;
pub mod types;

pub use answer::{conversation_answer, extract_answer, extract_final_answer, score, AnswerFormat};
pub use record::{
    AgreementPattern, AnswerRecord, BenchmarkResult, ComparisonEntry, ComparisonReport,
    ConversationLog,
    CorrectnessPattern, EvaluationRun, EvolutionData, ResultsSummary, RunHeader, StrategySummary,
    VariantOutcome,
};
pub use strategy::{StrategyDefinition, StrategyRegistry, UnknownStrategyError};
pub use types::{Message, Role, Variant};
