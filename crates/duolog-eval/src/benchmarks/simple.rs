//! SimpleBench: short questions that are easy for humans, hard for models

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;

use duolog_core::{score, AnswerFormat};

use super::{Benchmark, BenchmarkError, Question};

#[derive(Debug, Deserialize)]
struct SimpleBenchFile {
    eval_data: Vec<SimpleBenchEntry>,
}

#[derive(Debug, Deserialize)]
struct SimpleBenchEntry {
    question_id: serde_json::Value,
    prompt: String,
    answer: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    difficulty: Option<String>,
}

/// Benchmark backed by the SimpleBench `questions.json` file
/// (`{"eval_data": [{question_id, prompt, answer}, ...]}`).
#[derive(Debug)]
pub struct SimpleBench {
    json_path: PathBuf,
}

impl SimpleBench {
    pub fn new(json_path: impl Into<PathBuf>) -> Self {
        Self {
            json_path: json_path.into(),
        }
    }
}

#[async_trait]
impl Benchmark for SimpleBench {
    fn id(&self) -> &str {
        "simple"
    }

    fn name(&self) -> &str {
        "SimpleBench"
    }

    async fn load_questions(&self, max: Option<usize>) -> Result<Vec<Question>, BenchmarkError> {
        let bytes = tokio::fs::read(&self.json_path).await.map_err(|e| {
            BenchmarkError::DataUnavailable(format!("{}: {}", self.json_path.display(), e))
        })?;
        let file: SimpleBenchFile = serde_json::from_slice(&bytes)
            .map_err(|e| BenchmarkError::Malformed(e.to_string()))?;

        let take = max.unwrap_or(usize::MAX);
        Ok(file
            .eval_data
            .into_iter()
            .take(take)
            .map(|entry| Question {
                id: match entry.question_id {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                },
                question: entry.prompt,
                answer: entry.answer,
                category: entry.category.unwrap_or_else(|| "unknown".to_string()),
                difficulty: entry.difficulty.unwrap_or_else(|| "unknown".to_string()),
            })
            .collect())
    }

    /// Multiple-choice questions carry a single-letter ground truth and
    /// are graded by letter extraction; anything else is graded as
    /// normalized text.
    fn evaluate_answer(&self, answer: &str, ground_truth: &str) -> bool {
        let truth = ground_truth.trim();
        let format = if truth.len() == 1 && truth.chars().all(|c| c.is_ascii_alphabetic()) {
            AnswerFormat::Letter
        } else {
            AnswerFormat::Text
        };
        score(answer, truth, format)
    }
}
