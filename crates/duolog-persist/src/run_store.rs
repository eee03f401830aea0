//! Evaluation run storage

use std::sync::Arc;

use duolog_core::{EvaluationRun, RunHeader};

use crate::backend::{StorageBackend, StorageError, StorageExt};

/// Store for persisted [`EvaluationRun`] records (`run:` key space)
#[derive(Debug, Clone)]
pub struct RunStore {
    backend: Arc<dyn StorageBackend>,
}

impl RunStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    fn key(run_id: &str) -> String {
        format!("run:{}", run_id)
    }

    /// Persist a completed run. Runs are write-once.
    pub async fn save(&self, run: &EvaluationRun) -> Result<(), StorageError> {
        self.backend.put(&Self::key(&run.run_id), run).await
    }

    /// Load a run by id; a miss is a [`StorageError::NotFound`]
    pub async fn get(&self, run_id: &str) -> Result<EvaluationRun, StorageError> {
        self.backend
            .get(&Self::key(run_id))
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("run {}", run_id)))
    }

    /// Headers of all persisted runs, newest first
    pub async fn list(&self) -> Result<Vec<RunHeader>, StorageError> {
        let keys = self.backend.list_keys("run:").await?;
        let mut headers = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(run) = self.backend.get::<EvaluationRun>(&key).await? {
                headers.push(run.header());
            }
        }
        headers.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(headers)
    }
}
