//! Evaluation runner: drives a benchmark's question set through both
//! conversation variants and persists the graded results

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tokio::sync::{RwLock, Semaphore};
use uuid::Uuid;

use duolog_core::{
    conversation_answer, BenchmarkResult, ConversationLog, EvaluationRun, Message, ResultsSummary,
    StrategyDefinition, StrategyRegistry, UnknownStrategyError, Variant, VariantOutcome,
};
use duolog_engine::{DialogueEngine, NullSink};
use duolog_llm::CompletionClient;
use duolog_persist::{ComparisonStore, LogStore, RunStore, StorageError};

use crate::benchmarks::{Benchmark, BenchmarkRegistry, Question, UnknownBenchmarkError};
use crate::comparison::build_report;
use crate::evolution::analyze_evolution;

/// Questions processed concurrently per run (the upstream rate limit
/// budget); turns within one conversation stay sequential.
const DEFAULT_CONCURRENCY: usize = 5;

/// Errors surfaced by the evaluation manager
#[derive(Debug, Error)]
pub enum EvalError {
    #[error(transparent)]
    UnknownBenchmark(#[from] UnknownBenchmarkError),
    #[error(transparent)]
    UnknownStrategy(#[from] UnknownStrategyError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("comparison requires at least one run id")]
    EmptyComparison,
    #[error("comparison runs span multiple benchmarks: {0} vs {1}")]
    MixedBenchmarks(String, String),
}

/// Externally visible state of one evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvaluationStatus {
    Pending,
    Running,
    Completed { run_id: String },
    Error { message: String },
}

impl EvaluationStatus {
    pub fn label(&self) -> &'static str {
        match self {
            EvaluationStatus::Pending => "pending",
            EvaluationStatus::Running => "running",
            EvaluationStatus::Completed { .. } => "completed",
            EvaluationStatus::Error { .. } => "error",
        }
    }

    pub fn run_id(&self) -> Option<&str> {
        match self {
            EvaluationStatus::Completed { run_id } => Some(run_id),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            EvaluationStatus::Error { message } => Some(message),
            _ => None,
        }
    }
}

/// Runs benchmark evaluations and owns their pollable statuses.
///
/// Each run iterates up to `max_questions` questions; per question the
/// simulated and dual conversations execute concurrently and are graded
/// independently. One bad question never aborts its siblings.
pub struct EvaluationManager {
    client: CompletionClient,
    strategies: Arc<StrategyRegistry>,
    benchmarks: Arc<BenchmarkRegistry>,
    run_store: RunStore,
    log_store: LogStore,
    comparison_store: ComparisonStore,
    statuses: RwLock<HashMap<Uuid, EvaluationStatus>>,
    concurrency: usize,
}

impl EvaluationManager {
    pub fn new(
        client: CompletionClient,
        strategies: Arc<StrategyRegistry>,
        benchmarks: Arc<BenchmarkRegistry>,
        run_store: RunStore,
        log_store: LogStore,
        comparison_store: ComparisonStore,
    ) -> Arc<Self> {
        Arc::new(Self {
            client,
            strategies,
            benchmarks,
            run_store,
            log_store,
            comparison_store,
            statuses: RwLock::new(HashMap::new()),
            concurrency: DEFAULT_CONCURRENCY,
        })
    }

    /// Start an evaluation and return its pollable id immediately.
    ///
    /// Unknown benchmark or strategy ids take the status directly to
    /// `error` before anything is spawned or persisted.
    pub async fn start(
        self: &Arc<Self>,
        benchmark_id: &str,
        strategy_id: &str,
        max_questions: Option<usize>,
    ) -> Uuid {
        let evaluation_id = Uuid::new_v4();

        let (benchmark, strategy) = match (
            self.benchmarks.get(benchmark_id),
            self.strategies.get(strategy_id),
        ) {
            (Ok(benchmark), Ok(strategy)) => (benchmark, strategy),
            (Err(e), _) => {
                self.set_status(evaluation_id, EvaluationStatus::Error { message: e.to_string() })
                    .await;
                tracing::warn!(%evaluation_id, error = %e, "evaluation rejected");
                return evaluation_id;
            }
            (_, Err(e)) => {
                self.set_status(evaluation_id, EvaluationStatus::Error { message: e.to_string() })
                    .await;
                tracing::warn!(%evaluation_id, error = %e, "evaluation rejected");
                return evaluation_id;
            }
        };

        self.set_status(evaluation_id, EvaluationStatus::Pending).await;

        let manager = self.clone();
        tokio::spawn(async move {
            manager
                .execute(evaluation_id, benchmark, strategy, max_questions)
                .await;
        });

        evaluation_id
    }

    /// Current status of an evaluation
    pub async fn status(&self, evaluation_id: Uuid) -> Option<EvaluationStatus> {
        self.statuses.read().await.get(&evaluation_id).cloned()
    }

    async fn set_status(&self, evaluation_id: Uuid, status: EvaluationStatus) {
        self.statuses.write().await.insert(evaluation_id, status);
    }

    async fn execute(
        &self,
        evaluation_id: Uuid,
        benchmark: Arc<dyn Benchmark>,
        strategy: Arc<StrategyDefinition>,
        max_questions: Option<usize>,
    ) {
        self.set_status(evaluation_id, EvaluationStatus::Running).await;

        let questions = match benchmark.load_questions(max_questions).await {
            Ok(questions) if !questions.is_empty() => questions,
            Ok(_) => {
                self.set_status(
                    evaluation_id,
                    EvaluationStatus::Error {
                        message: format!("no questions loaded from benchmark {}", benchmark.id()),
                    },
                )
                .await;
                return;
            }
            Err(e) => {
                tracing::error!(%evaluation_id, error = %e, "failed to load benchmark data");
                self.set_status(evaluation_id, EvaluationStatus::Error { message: e.to_string() })
                    .await;
                return;
            }
        };

        tracing::info!(
            %evaluation_id,
            benchmark = benchmark.id(),
            strategy = %strategy.id,
            questions = questions.len(),
            "evaluation started"
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let tasks = questions.iter().map(|question| {
            let semaphore = semaphore.clone();
            let benchmark = benchmark.clone();
            let strategy = strategy.clone();
            async move {
                let _permit = semaphore.acquire().await.ok()?;
                self.process_question(question, benchmark.as_ref(), strategy).await
            }
        });
        let results: Vec<BenchmarkResult> = futures::future::join_all(tasks)
            .await
            .into_iter()
            .flatten()
            .collect();

        let summary = ResultsSummary::aggregate(&results);
        let run = EvaluationRun {
            run_id: format!(
                "{}_{}_{}",
                benchmark.id(),
                strategy.id,
                chrono::Utc::now().timestamp()
            ),
            strategy: strategy.id.clone(),
            benchmark: benchmark.id().to_string(),
            timestamp: chrono::Utc::now(),
            summary,
            results,
        };

        match self.run_store.save(&run).await {
            Ok(()) => {
                tracing::info!(
                    %evaluation_id,
                    run_id = %run.run_id,
                    simulated_accuracy = run.summary.simulated_accuracy,
                    dual_accuracy = run.summary.dual_accuracy,
                    "evaluation completed"
                );
                self.set_status(
                    evaluation_id,
                    EvaluationStatus::Completed { run_id: run.run_id },
                )
                .await;
            }
            Err(e) => {
                tracing::error!(%evaluation_id, error = %e, "failed to persist run");
                self.set_status(evaluation_id, EvaluationStatus::Error { message: e.to_string() })
                    .await;
            }
        }
    }

    /// Run, grade, and log both conversation variants for one question.
    /// An engine fault on a variant is recorded as an incorrect outcome
    /// rather than aborting the run.
    async fn process_question(
        &self,
        question: &Question,
        benchmark: &dyn Benchmark,
        strategy: Arc<StrategyDefinition>,
    ) -> Option<BenchmarkResult> {
        let log_id = format!(
            "{}_{}_{}_{}",
            benchmark.id(),
            question.id,
            strategy.id,
            chrono::Utc::now().timestamp()
        );
        let engine = DialogueEngine::new(self.client.clone(), strategy.clone());

        let timed = |variant: Variant| {
            let engine = engine.clone();
            let problem = question.question.clone();
            async move {
                let start = Instant::now();
                let outcome = engine.run(&problem, variant, &NullSink).await;
                (outcome, start.elapsed().as_secs_f64())
            }
        };

        let ((sim_outcome, sim_secs), (dual_outcome, dual_secs)) =
            tokio::join!(timed(Variant::Simulated), timed(Variant::Dual));

        let grade = |outcome: Result<Vec<Message>, duolog_engine::EngineError>, secs: f64| {
            match outcome {
                Ok(messages) => {
                    let answer = conversation_answer(&messages);
                    let correct = benchmark.evaluate_answer(&answer, &question.answer);
                    let evolution =
                        Some(analyze_evolution(&messages, &question.answer, benchmark));
                    (messages, VariantOutcome {
                        answer,
                        correct,
                        elapsed_secs: secs,
                        log_id: log_id.clone(),
                        evolution,
                    })
                }
                Err(e) => {
                    tracing::error!(
                        question_id = %question.id,
                        error = %e,
                        "conversation failed; recording incorrect result"
                    );
                    (e.messages, VariantOutcome {
                        answer: String::new(),
                        correct: false,
                        elapsed_secs: secs,
                        log_id: log_id.clone(),
                        evolution: None,
                    })
                }
            }
        };

        let (sim_messages, simulated) = grade(sim_outcome, sim_secs);
        let (dual_messages, dual) = grade(dual_outcome, dual_secs);

        let log = ConversationLog {
            log_id: log_id.clone(),
            question_id: question.id.clone(),
            question: question.question.clone(),
            ground_truth: question.answer.clone(),
            strategy: strategy.id.clone(),
            benchmark: benchmark.id().to_string(),
            simulated_messages: sim_messages,
            dual_messages,
            simulated_evolution: simulated.evolution.clone(),
            dual_evolution: dual.evolution.clone(),
        };
        if let Err(e) = self.log_store.save(&log).await {
            tracing::error!(log_id, error = %e, "failed to persist conversation log");
        }

        Some(BenchmarkResult {
            question_id: question.id.clone(),
            question: question.question.clone(),
            ground_truth: question.answer.clone(),
            category: question.category.clone(),
            difficulty: question.difficulty.clone(),
            simulated,
            dual,
        })
    }

    /// Build and persist a comparison report over runs sharing a benchmark
    pub async fn build_comparison(
        &self,
        run_ids: &[String],
    ) -> Result<duolog_core::ComparisonReport, EvalError> {
        if run_ids.is_empty() {
            return Err(EvalError::EmptyComparison);
        }

        let mut runs = Vec::with_capacity(run_ids.len());
        for run_id in run_ids {
            runs.push(self.run_store.get(run_id).await?);
        }
        if let Some(other) = runs.iter().find(|r| r.benchmark != runs[0].benchmark) {
            return Err(EvalError::MixedBenchmarks(
                runs[0].benchmark.clone(),
                other.benchmark.clone(),
            ));
        }

        let comparison_id = format!(
            "comparison_{}_{}",
            runs[0].benchmark,
            chrono::Utc::now().timestamp()
        );
        let report = build_report(&comparison_id, &runs);
        self.comparison_store.save(&report).await?;
        Ok(report)
    }

    /// Stores, for read-side route handlers
    pub fn run_store(&self) -> &RunStore {
        &self.run_store
    }

    pub fn log_store(&self) -> &LogStore {
        &self.log_store
    }

    pub fn comparison_store(&self) -> &ComparisonStore {
        &self.comparison_store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmarks::StaticBenchmark;
    use duolog_core::AnswerFormat;
    use duolog_llm::MockProvider;
    use duolog_persist::MemoryBackend;
    use std::time::Duration;

    fn question(id: &str, text: &str, answer: &str) -> Question {
        Question {
            id: id.to_string(),
            question: text.to_string(),
            answer: answer.to_string(),
            category: "unknown".to_string(),
            difficulty: "unknown".to_string(),
        }
    }

    fn manager_with(
        provider: MockProvider,
        questions: Vec<Question>,
    ) -> (Arc<EvaluationManager>, LogStore) {
        let backend: Arc<dyn duolog_persist::StorageBackend> = Arc::new(MemoryBackend::new());
        let log_store = LogStore::new(backend.clone());
        let mut benchmarks = BenchmarkRegistry::new();
        benchmarks.register(Arc::new(StaticBenchmark::new(
            "simple",
            "SimpleBench",
            AnswerFormat::Text,
            questions,
        )));
        let manager = EvaluationManager::new(
            CompletionClient::mock(provider.with_latency(Duration::ZERO)),
            Arc::new(StrategyRegistry::builtin()),
            Arc::new(benchmarks),
            RunStore::new(backend.clone()),
            log_store.clone(),
            ComparisonStore::new(backend),
        );
        (manager, log_store)
    }

    async fn wait_terminal(manager: &Arc<EvaluationManager>, id: Uuid) -> EvaluationStatus {
        for _ in 0..200 {
            match manager.status(id).await {
                Some(status)
                    if matches!(
                        status,
                        EvaluationStatus::Completed { .. } | EvaluationStatus::Error { .. }
                    ) =>
                {
                    return status
                }
                _ => tokio::time::sleep(Duration::from_millis(10)).await,
            }
        }
        panic!("evaluation never finished");
    }

    #[tokio::test]
    async fn test_correct_simulated_answer_scores() {
        let (manager, log_store) = manager_with(
            MockProvider::constant("Working through it... Final Answer: 42"),
            vec![question("1", "What is 6 x 7?", "42")],
        );

        let id = manager.start("simple", "debate", Some(1)).await;
        let status = wait_terminal(&manager, id).await;

        let run_id = status.run_id().expect("run should complete").to_string();
        let run = manager.run_store().get(&run_id).await.unwrap();

        assert_eq!(run.summary.total_questions, 1);
        assert!(run.results[0].simulated.correct);
        assert_eq!(run.results[0].simulated.answer, "42");
        assert!(run.results[0].dual.correct);
        assert_eq!(
            run.summary.simulated_accuracy,
            run.summary.simulated_correct as f64 / run.summary.total_questions as f64
        );

        // One conversation log per question, retrievable by its id
        assert_eq!(log_store.count().await.unwrap(), 1);
        let log = log_store.get(&run.results[0].simulated.log_id).await.unwrap();
        assert_eq!(log.simulated_messages.len(), 6);
        assert_eq!(log.dual_messages.len(), 6);
        assert!(log.simulated_evolution.is_some());
    }

    #[tokio::test]
    async fn test_unknown_benchmark_goes_straight_to_error() {
        let (manager, log_store) =
            manager_with(MockProvider::constant("x"), vec![question("1", "q", "a")]);

        let id = manager.start("nope", "debate", Some(1)).await;
        let status = manager.status(id).await.unwrap();
        assert_eq!(status.label(), "error");
        assert!(status.error_message().unwrap().contains("Unknown benchmark"));
        assert_eq!(log_store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_strategy_goes_straight_to_error() {
        let (manager, _) =
            manager_with(MockProvider::constant("x"), vec![question("1", "q", "a")]);

        let id = manager.start("simple", "nope", Some(1)).await;
        let status = manager.status(id).await.unwrap();
        assert_eq!(status.label(), "error");
        assert!(status.error_message().unwrap().contains("Unknown strategy"));
    }

    #[tokio::test]
    async fn test_provider_failures_record_incorrect_results() {
        let (manager, log_store) = manager_with(
            MockProvider::broken(),
            vec![question("1", "q", "42"), question("2", "q2", "7")],
        );

        let id = manager.start("simple", "debate", None).await;
        let status = wait_terminal(&manager, id).await;
        let run = manager
            .run_store()
            .get(status.run_id().unwrap())
            .await
            .unwrap();

        // Soft-failed turns still produce full conversations, graded wrong
        assert_eq!(run.summary.total_questions, 2);
        assert_eq!(run.summary.simulated_correct, 0);
        assert_eq!(run.summary.dual_correct, 0);
        assert_eq!(log_store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_comparison_over_two_strategies() {
        let (manager, _) = manager_with(
            MockProvider::constant("Final Answer: 42"),
            vec![question("1", "q", "42")],
        );

        let first = manager.start("simple", "debate", Some(1)).await;
        let first_run = wait_terminal(&manager, first).await.run_id().unwrap().to_string();
        let second = manager.start("simple", "cooperative", Some(1)).await;
        let second_run = wait_terminal(&manager, second).await.run_id().unwrap().to_string();

        let report = manager
            .build_comparison(&[first_run, second_run])
            .await
            .unwrap();
        assert_eq!(report.strategies.len(), 2);
        assert!(report.strategies.contains_key("debate"));
        assert!(report.strategies.contains_key("cooperative"));
        assert_eq!(report.questions["1"].len(), 2);

        let listed = manager.comparison_store().list().await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_status_unknown_evaluation() {
        let (manager, _) = manager_with(MockProvider::constant("x"), vec![]);
        assert!(manager.status(Uuid::new_v4()).await.is_none());
    }
}
