//! Benchmark trait, question model, and registry

pub mod aime;
pub mod simple;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use duolog_core::{score, AnswerFormat};

pub use aime::AimeBench;
pub use simple::SimpleBench;

/// Lookup failure for a benchmark id
#[derive(Debug, Error)]
#[error("Unknown benchmark: {0}")]
pub struct UnknownBenchmarkError(pub String);

/// Benchmark data problems, surfaced at run start
#[derive(Debug, Error)]
pub enum BenchmarkError {
    #[error("Benchmark data unavailable: {0}")]
    DataUnavailable(String),
    #[error("Benchmark data malformed: {0}")]
    Malformed(String),
}

fn default_unknown() -> String {
    "unknown".to_string()
}

/// One benchmark question with its ground truth
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub question: String,
    /// Ground-truth answer
    pub answer: String,
    #[serde(default = "default_unknown")]
    pub category: String,
    #[serde(default = "default_unknown")]
    pub difficulty: String,
}

/// A benchmark: a loadable question set plus its grading rule.
///
/// Question loading is deferred and fallible so that a missing dataset
/// fails the run that needs it, not process startup.
#[async_trait]
pub trait Benchmark: Send + Sync + std::fmt::Debug {
    /// Stable id used in requests
    fn id(&self) -> &str;

    /// Human-readable name
    fn name(&self) -> &str;

    /// Load up to `max` questions
    async fn load_questions(&self, max: Option<usize>) -> Result<Vec<Question>, BenchmarkError>;

    /// Grade an extracted answer against the ground truth.
    /// Must be deterministic and side-effect-free.
    fn evaluate_answer(&self, answer: &str, ground_truth: &str) -> bool;
}

/// In-memory benchmark over a fixed question list (tests, custom sets)
#[derive(Debug, Clone)]
pub struct StaticBenchmark {
    id: String,
    name: String,
    format: AnswerFormat,
    questions: Vec<Question>,
}

impl StaticBenchmark {
    pub fn new(
        id: &str,
        name: &str,
        format: AnswerFormat,
        questions: Vec<Question>,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            format,
            questions,
        }
    }
}

#[async_trait]
impl Benchmark for StaticBenchmark {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn load_questions(&self, max: Option<usize>) -> Result<Vec<Question>, BenchmarkError> {
        let take = max.unwrap_or(self.questions.len());
        Ok(self.questions.iter().take(take).cloned().collect())
    }

    fn evaluate_answer(&self, answer: &str, ground_truth: &str) -> bool {
        score(answer, ground_truth, self.format)
    }
}

/// Registry of available benchmarks, loaded once at process start
pub struct BenchmarkRegistry {
    benchmarks: HashMap<String, Arc<dyn Benchmark>>,
}

impl BenchmarkRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self {
            benchmarks: HashMap::new(),
        }
    }

    /// Registry with the built-in benchmarks rooted at `data_dir`
    pub fn builtin(data_dir: &std::path::Path) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(SimpleBench::new(
            data_dir.join("simple_bench/questions.json"),
        )));
        registry.register(Arc::new(AimeBench::new(
            data_dir.join("aime/questions.json"),
        )));
        registry
    }

    /// Add a benchmark, replacing any previous one with the same id
    pub fn register(&mut self, benchmark: Arc<dyn Benchmark>) {
        self.benchmarks.insert(benchmark.id().to_string(), benchmark);
    }

    /// Look up a benchmark by id
    pub fn get(&self, id: &str) -> Result<Arc<dyn Benchmark>, UnknownBenchmarkError> {
        self.benchmarks
            .get(id)
            .cloned()
            .ok_or_else(|| UnknownBenchmarkError(id.to_string()))
    }

    /// Ids of all registered benchmarks
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.benchmarks.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl Default for BenchmarkRegistry {
    fn default() -> Self {
        Self::new()
    }
}
