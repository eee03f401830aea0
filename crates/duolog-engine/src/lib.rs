//! # Duolog Engine
//!
//! Drives one full conversation, turn by turn, for a given
//! {problem, strategy, variant}.
//!
//! The *simulated* variant sends a single composite-prompted model the
//! shared transcript plus a role cue each turn; the *dual* variant keeps
//! two role-bound histories and cross-posts each reply into the
//! counterpart's view. Turns are strictly sequential: turn N's output is
//! part of turn N+1's prompt. Messages are pushed through a
//! [`MessageSink`] as they are produced so live viewers see turns as
//! they happen.

pub mod engine;
pub mod sink;

pub use engine::{DialogueEngine, EngineError};
pub use sink::{ChannelSink, MessageSink, NullSink};
