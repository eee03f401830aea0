//! End-to-end evaluation flow over an in-memory stack

use std::sync::Arc;
use std::time::Duration;

use duolog_core::{AnswerFormat, StrategyRegistry};
use duolog_eval::{
    BenchmarkRegistry, EvaluationManager, EvaluationStatus, Question, StaticBenchmark,
};
use duolog_llm::{CompletionClient, MockProvider};
use duolog_persist::{ComparisonStore, LogStore, MemoryBackend, RunStore, StorageBackend};

fn question(id: &str, text: &str, answer: &str) -> Question {
    Question {
        id: id.to_string(),
        question: text.to_string(),
        answer: answer.to_string(),
        category: "math".to_string(),
        difficulty: "easy".to_string(),
    }
}

fn stack(provider: MockProvider, questions: Vec<Question>) -> Arc<EvaluationManager> {
    let backend: Arc<dyn StorageBackend> = Arc::new(MemoryBackend::new());
    let mut benchmarks = BenchmarkRegistry::new();
    benchmarks.register(Arc::new(StaticBenchmark::new(
        "arith",
        "Arithmetic",
        AnswerFormat::Integer,
        questions,
    )));
    EvaluationManager::new(
        CompletionClient::mock(provider.with_latency(Duration::ZERO)),
        Arc::new(StrategyRegistry::builtin()),
        Arc::new(benchmarks),
        RunStore::new(backend.clone()),
        LogStore::new(backend.clone()),
        ComparisonStore::new(backend),
    )
}

async fn finished(manager: &Arc<EvaluationManager>, id: uuid::Uuid) -> EvaluationStatus {
    for _ in 0..300 {
        if let Some(status) = manager.status(id).await {
            if matches!(
                status,
                EvaluationStatus::Completed { .. } | EvaluationStatus::Error { .. }
            ) {
                return status;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("evaluation never finished");
}

#[tokio::test]
async fn mixed_correctness_run_aggregates_and_logs() {
    // The scripted model always concludes 42: correct for one question,
    // wrong for the other two.
    let manager = stack(
        MockProvider::scripted(vec![
            "Considering the factors here. Answer: 42".to_string(),
            "I agree with that count. Final Answer: 42".to_string(),
        ]),
        vec![
            question("1", "What is 6 x 7?", "42"),
            question("2", "What is 6 x 8?", "48"),
            question("3", "What is 5 x 5?", "25"),
        ],
    );

    let evaluation = manager.start("arith", "cooperative", None).await;
    let status = finished(&manager, evaluation).await;
    let run_id = status.run_id().expect("run should complete").to_string();

    let run = manager.run_store().get(&run_id).await.unwrap();
    assert_eq!(run.strategy, "cooperative");
    assert_eq!(run.benchmark, "arith");
    assert_eq!(run.summary.total_questions, 3);
    assert_eq!(run.summary.simulated_correct, 1);
    assert_eq!(run.summary.dual_correct, 1);
    assert_eq!(run.summary.simulated_accuracy, 1.0 / 3.0);
    assert_eq!(run.summary.dual_accuracy, 1.0 / 3.0);
    assert!(run.summary.mean_simulated_secs >= 0.0);

    // Every question left a retrievable log carrying evolution data, and
    // question metadata survived into the results
    for result in &run.results {
        assert_eq!(result.category, "math");
        let log = manager
            .log_store()
            .get(&result.simulated.log_id)
            .await
            .unwrap();
        assert_eq!(log.strategy, "cooperative");
        assert_eq!(log.simulated_messages.len(), 6);
        assert_eq!(log.dual_messages.len(), 6);
        let evolution = log.simulated_evolution.as_ref().unwrap();
        assert!(!evolution.answer_history.is_empty());
    }

    // Reads are idempotent: two loads return byte-identical records
    let again = manager.run_store().get(&run_id).await.unwrap();
    assert_eq!(
        serde_json::to_vec(&run).unwrap(),
        serde_json::to_vec(&again).unwrap()
    );

    // Run history lists the run
    let headers = manager.run_store().list().await.unwrap();
    assert_eq!(headers[0].id, run_id);
}

#[tokio::test]
async fn comparison_requires_a_shared_benchmark() {
    let manager = stack(
        MockProvider::constant("Final Answer: 42"),
        vec![question("1", "q", "42")],
    );

    let evaluation = manager.start("arith", "debate", Some(1)).await;
    let run_id = finished(&manager, evaluation)
        .await
        .run_id()
        .unwrap()
        .to_string();

    let report = manager.build_comparison(&[run_id.clone()]).await.unwrap();
    assert_eq!(report.benchmark, "arith");
    assert!(report.strategies.contains_key("debate"));

    let err = manager.build_comparison(&[]).await.unwrap_err();
    assert!(err.to_string().contains("at least one run"));

    let err = manager
        .build_comparison(&["absent_run".to_string()])
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Not found"));
}
