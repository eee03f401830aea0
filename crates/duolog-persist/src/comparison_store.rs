//! Cross-strategy comparison report storage

use std::sync::Arc;

use duolog_core::ComparisonReport;

use crate::backend::{StorageBackend, StorageError, StorageExt};

/// Store for comparison reports (`comparison:` key space)
#[derive(Debug, Clone)]
pub struct ComparisonStore {
    backend: Arc<dyn StorageBackend>,
}

impl ComparisonStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    fn key(comparison_id: &str) -> String {
        format!("comparison:{}", comparison_id)
    }

    /// Persist a comparison report. Reports are write-once.
    pub async fn save(&self, report: &ComparisonReport) -> Result<(), StorageError> {
        self.backend
            .put(&Self::key(&report.comparison_id), report)
            .await
    }

    /// Load a report by id; a miss is a [`StorageError::NotFound`]
    pub async fn get(&self, comparison_id: &str) -> Result<ComparisonReport, StorageError> {
        self.backend
            .get(&Self::key(comparison_id))
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("comparison {}", comparison_id)))
    }

    /// All persisted reports, newest first
    pub async fn list(&self) -> Result<Vec<ComparisonReport>, StorageError> {
        let keys = self.backend.list_keys("comparison:").await?;
        let mut reports = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(report) = self.backend.get::<ComparisonReport>(&key).await? {
                reports.push(report);
            }
        }
        reports.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use chrono::Utc;
    use std::collections::HashMap;

    fn report(id: &str) -> ComparisonReport {
        ComparisonReport {
            comparison_id: id.to_string(),
            timestamp: Utc::now(),
            benchmark: "simple".to_string(),
            strategies: HashMap::new(),
            questions: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn test_comparison_round_trip_and_list() {
        let store = ComparisonStore::new(Arc::new(MemoryBackend::new()));
        store.save(&report("comparison_simple_1")).await.unwrap();

        let loaded = store.get("comparison_simple_1").await.unwrap();
        assert_eq!(loaded.benchmark, "simple");
        assert_eq!(store.list().await.unwrap().len(), 1);

        assert!(matches!(
            store.get("absent").await.unwrap_err(),
            StorageError::NotFound(_)
        ));
    }
}
