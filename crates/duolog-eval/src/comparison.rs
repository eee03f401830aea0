//! Cross-strategy comparison reports

use std::collections::HashMap;

use chrono::Utc;

use duolog_core::{ComparisonEntry, ComparisonReport, EvaluationRun, StrategySummary};

/// Build a comparison over runs sharing a benchmark. Callers guarantee a
/// non-empty, single-benchmark run list.
pub fn build_report(comparison_id: &str, runs: &[EvaluationRun]) -> ComparisonReport {
    let mut strategies = HashMap::new();
    let mut questions: HashMap<String, HashMap<String, ComparisonEntry>> = HashMap::new();

    for run in runs {
        strategies.insert(
            run.strategy.clone(),
            StrategySummary {
                run_id: run.run_id.clone(),
                summary: run.summary.clone(),
            },
        );

        for result in &run.results {
            questions
                .entry(result.question_id.clone())
                .or_default()
                .insert(
                    run.strategy.clone(),
                    ComparisonEntry {
                        ground_truth: result.ground_truth.clone(),
                        simulated_answer: result.simulated.answer.clone(),
                        simulated_correct: result.simulated.correct,
                        dual_answer: result.dual.answer.clone(),
                        dual_correct: result.dual.correct,
                    },
                );
        }
    }

    ComparisonReport {
        comparison_id: comparison_id.to_string(),
        timestamp: Utc::now(),
        benchmark: runs.first().map(|r| r.benchmark.clone()).unwrap_or_default(),
        strategies,
        questions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duolog_core::{BenchmarkResult, ResultsSummary, VariantOutcome};

    fn outcome(answer: &str, correct: bool) -> VariantOutcome {
        VariantOutcome {
            answer: answer.to_string(),
            correct,
            elapsed_secs: 1.0,
            log_id: "log".to_string(),
            evolution: None,
        }
    }

    fn run(strategy: &str, sim_correct: bool) -> EvaluationRun {
        let results = vec![BenchmarkResult {
            question_id: "1".to_string(),
            question: "q".to_string(),
            ground_truth: "42".to_string(),
            category: "unknown".to_string(),
            difficulty: "unknown".to_string(),
            simulated: outcome("42", sim_correct),
            dual: outcome("41", false),
        }];
        EvaluationRun {
            run_id: format!("simple_{}_1", strategy),
            strategy: strategy.to_string(),
            benchmark: "simple".to_string(),
            timestamp: Utc::now(),
            summary: ResultsSummary::aggregate(&results),
            results,
        }
    }

    #[test]
    fn test_report_indexes_by_strategy_and_question() {
        let runs = vec![run("debate", true), run("cooperative", false)];
        let report = build_report("comparison_simple_1", &runs);

        assert_eq!(report.benchmark, "simple");
        assert_eq!(report.strategies.len(), 2);
        assert_eq!(report.strategies["debate"].run_id, "simple_debate_1");

        let by_strategy = &report.questions["1"];
        assert!(by_strategy["debate"].simulated_correct);
        assert!(!by_strategy["cooperative"].simulated_correct);
        assert_eq!(by_strategy["debate"].ground_truth, "42");
    }
}
