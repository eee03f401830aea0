//! Persisted and derived evaluation records

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Message, Role};

/// How the two agents' stated answers related across the dialogue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgreementPattern {
    /// Consensus from the first answers onward
    #[serde(rename = "Complete Agreement")]
    CompleteAgreement,
    /// Final answers match after earlier disagreement
    #[serde(rename = "Resolved Disagreement")]
    ResolvedDisagreement,
    /// Disagreement persists to the final answers
    #[serde(rename = "Unresolved Disagreement")]
    UnresolvedDisagreement,
    /// Fewer than two answers, or one agent never answered
    #[serde(rename = "Insufficient Data")]
    InsufficientData,
}

/// How answer correctness evolved across the dialogue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorrectnessPattern {
    #[serde(rename = "Stable Correct")]
    StableCorrect,
    #[serde(rename = "Stable Incorrect")]
    StableIncorrect,
    /// One agent held the correct answer throughout, the other did not
    #[serde(rename = "Stable Correct (One Agent)")]
    StableCorrectOneAgent,
    /// Wrong at the start, correct at the end
    Improvement,
    /// Correct at the start, wrong at the end
    Deterioration,
    #[serde(rename = "Mixed Pattern")]
    MixedPattern,
    #[serde(rename = "Mixed Pattern (Final Correct)")]
    MixedPatternFinalCorrect,
    #[serde(rename = "Mixed Pattern (Final Incorrect)")]
    MixedPatternFinalIncorrect,
    #[serde(rename = "Insufficient Data")]
    InsufficientData,
}

/// One stated answer in a dialogue, in order of appearance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub turn: u32,
    pub agent: Role,
    pub answer: String,
    pub is_correct: bool,
}

/// Derived classification of how answers agreed and improved across turns.
/// Computed purely from a conversation's per-turn extracted answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionData {
    pub agreement_pattern: AgreementPattern,
    pub correctness_pattern: CorrectnessPattern,
    pub answer_history: Vec<AnswerRecord>,
}

/// Outcome of one conversation variant for one question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantOutcome {
    pub answer: String,
    pub correct: bool,
    /// Wall-clock seconds for the conversation
    #[serde(rename = "time")]
    pub elapsed_secs: f64,
    pub log_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evolution: Option<EvolutionData>,
}

/// Graded result for one benchmark question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub question_id: String,
    pub question: String,
    pub ground_truth: String,
    pub category: String,
    pub difficulty: String,
    pub simulated: VariantOutcome,
    pub dual: VariantOutcome,
}

/// Aggregate accuracy and latency over a run's results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsSummary {
    pub total_questions: usize,
    pub simulated_correct: usize,
    pub dual_correct: usize,
    pub simulated_accuracy: f64,
    pub dual_accuracy: f64,
    pub mean_simulated_secs: f64,
    pub mean_dual_secs: f64,
}

impl ResultsSummary {
    /// Recompute the summary from a result list
    pub fn aggregate(results: &[BenchmarkResult]) -> Self {
        let total = results.len();
        let simulated_correct = results.iter().filter(|r| r.simulated.correct).count();
        let dual_correct = results.iter().filter(|r| r.dual.correct).count();
        let mean = |f: fn(&BenchmarkResult) -> f64| {
            if total == 0 {
                0.0
            } else {
                results.iter().map(f).sum::<f64>() / total as f64
            }
        };
        let ratio = |correct: usize| {
            if total == 0 {
                0.0
            } else {
                correct as f64 / total as f64
            }
        };
        Self {
            total_questions: total,
            simulated_correct,
            dual_correct,
            simulated_accuracy: ratio(simulated_correct),
            dual_accuracy: ratio(dual_correct),
            mean_simulated_secs: mean(|r| r.simulated.elapsed_secs),
            mean_dual_secs: mean(|r| r.dual.elapsed_secs),
        }
    }
}

/// Recency-sortable listing entry for a persisted run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunHeader {
    pub id: String,
    pub strategy: String,
    pub benchmark: String,
    pub timestamp: DateTime<Utc>,
}

/// One full execution of a benchmark's question set under one strategy.
/// Write-once; the unit returned by history listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRun {
    pub run_id: String,
    pub strategy: String,
    pub benchmark: String,
    pub timestamp: DateTime<Utc>,
    pub summary: ResultsSummary,
    pub results: Vec<BenchmarkResult>,
}

impl EvaluationRun {
    pub fn header(&self) -> RunHeader {
        RunHeader {
            id: self.run_id.clone(),
            strategy: self.strategy.clone(),
            benchmark: self.benchmark.clone(),
            timestamp: self.timestamp,
        }
    }
}

/// Persisted per-question transcript pair backing a run's detail view.
/// Write-once, keyed by log_id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationLog {
    pub log_id: String,
    pub question_id: String,
    pub question: String,
    pub ground_truth: String,
    pub strategy: String,
    pub benchmark: String,
    pub simulated_messages: Vec<Message>,
    pub dual_messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simulated_evolution: Option<EvolutionData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dual_evolution: Option<EvolutionData>,
}

/// Per-strategy slice of a comparison report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategySummary {
    pub run_id: String,
    pub summary: ResultsSummary,
}

/// Per-question, per-strategy outcome snapshot inside a comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonEntry {
    pub ground_truth: String,
    pub simulated_answer: String,
    pub simulated_correct: bool,
    pub dual_answer: String,
    pub dual_correct: bool,
}

/// Derived view over multiple runs sharing a benchmark
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub comparison_id: String,
    pub timestamp: DateTime<Utc>,
    pub benchmark: String,
    pub strategies: HashMap<String, StrategySummary>,
    pub questions: HashMap<String, HashMap<String, ComparisonEntry>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(correct: bool, secs: f64) -> VariantOutcome {
        VariantOutcome {
            answer: "x".to_string(),
            correct,
            elapsed_secs: secs,
            log_id: "log_1".to_string(),
            evolution: None,
        }
    }

    fn result(sim_correct: bool, dual_correct: bool) -> BenchmarkResult {
        BenchmarkResult {
            question_id: "1".to_string(),
            question: "q".to_string(),
            ground_truth: "x".to_string(),
            category: "unknown".to_string(),
            difficulty: "unknown".to_string(),
            simulated: outcome(sim_correct, 2.0),
            dual: outcome(dual_correct, 4.0),
        }
    }

    #[test]
    fn test_summary_accuracy_exact() {
        let results = vec![result(true, true), result(true, false), result(false, false)];
        let summary = ResultsSummary::aggregate(&results);
        assert_eq!(summary.total_questions, 3);
        assert_eq!(summary.simulated_correct, 2);
        assert_eq!(summary.dual_correct, 1);
        assert_eq!(summary.simulated_accuracy, 2.0 / 3.0);
        assert_eq!(summary.dual_accuracy, 1.0 / 3.0);
        assert_eq!(summary.mean_simulated_secs, 2.0);
        assert_eq!(summary.mean_dual_secs, 4.0);
    }

    #[test]
    fn test_summary_empty() {
        let summary = ResultsSummary::aggregate(&[]);
        assert_eq!(summary.total_questions, 0);
        assert_eq!(summary.simulated_accuracy, 0.0);
    }

    #[test]
    fn test_pattern_serialization() {
        assert_eq!(
            serde_json::to_value(AgreementPattern::ResolvedDisagreement).unwrap(),
            "Resolved Disagreement"
        );
        assert_eq!(
            serde_json::to_value(CorrectnessPattern::StableCorrectOneAgent).unwrap(),
            "Stable Correct (One Agent)"
        );
        assert_eq!(
            serde_json::to_value(CorrectnessPattern::Improvement).unwrap(),
            "Improvement"
        );
    }

    #[test]
    fn test_variant_outcome_wire_field() {
        let json = serde_json::to_value(outcome(true, 1.5)).unwrap();
        assert_eq!(json["time"], 1.5);
        assert!(json.get("evolution").is_none());
    }
}
