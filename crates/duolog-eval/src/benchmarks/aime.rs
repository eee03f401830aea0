//! AIME: competition math with integer answers

use std::path::PathBuf;

use async_trait::async_trait;

use duolog_core::{score, AnswerFormat};

use super::{Benchmark, BenchmarkError, Question};

/// Benchmark backed by a local `questions.json` holding an array of
/// `{id, question, answer}` problems.
#[derive(Debug)]
pub struct AimeBench {
    json_path: PathBuf,
}

impl AimeBench {
    pub fn new(json_path: impl Into<PathBuf>) -> Self {
        Self {
            json_path: json_path.into(),
        }
    }
}

#[async_trait]
impl Benchmark for AimeBench {
    fn id(&self) -> &str {
        "aime"
    }

    fn name(&self) -> &str {
        "AIME"
    }

    async fn load_questions(&self, max: Option<usize>) -> Result<Vec<Question>, BenchmarkError> {
        let bytes = tokio::fs::read(&self.json_path).await.map_err(|e| {
            BenchmarkError::DataUnavailable(format!("{}: {}", self.json_path.display(), e))
        })?;
        let questions: Vec<Question> = serde_json::from_slice(&bytes)
            .map_err(|e| BenchmarkError::Malformed(e.to_string()))?;

        let take = max.unwrap_or(usize::MAX);
        Ok(questions.into_iter().take(take).collect())
    }

    /// AIME answers are integers; leading zeros and surrounding prose are
    /// tolerated on both sides.
    fn evaluate_answer(&self, answer: &str, ground_truth: &str) -> bool {
        score(answer, ground_truth, AnswerFormat::Integer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_and_grade() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("questions.json");
        std::fs::write(
            &path,
            r#"[{"id": "AIME_2022_1", "question": "Find n.", "answer": "197"}]"#,
        )
        .unwrap();

        let bench = AimeBench::new(&path);
        let questions = bench.load_questions(None).await.unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].category, "unknown");

        assert!(bench.evaluate_answer("the answer is 197", "197"));
        assert!(bench.evaluate_answer("0197", "197"));
        assert!(!bench.evaluate_answer("198", "197"));
    }

    #[tokio::test]
    async fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("questions.json");
        std::fs::write(&path, "not json").unwrap();

        let err = AimeBench::new(&path).load_questions(None).await.unwrap_err();
        assert!(matches!(err, BenchmarkError::Malformed(_)));
    }
}
