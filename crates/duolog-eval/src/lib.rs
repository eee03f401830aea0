//! # Duolog Eval
//!
//! The benchmark harness: question sets, the evaluation runner that
//! drives simulated and dual conversations over them, per-dialogue
//! solution-evolution analysis, and cross-strategy comparison reports.
//!
//! A run is started with [`EvaluationManager::start`], returns
//! immediately with a pollable evaluation id, and persists an
//! [`duolog_core::EvaluationRun`] plus one
//! [`duolog_core::ConversationLog`] per question on completion.

pub mod benchmarks;
pub mod comparison;
pub mod evolution;
pub mod runner;

pub use benchmarks::{
    Benchmark, BenchmarkError, BenchmarkRegistry, Question, StaticBenchmark,
    UnknownBenchmarkError,
};
pub use evolution::analyze_evolution;
pub use runner::{EvalError, EvaluationManager, EvaluationStatus};
