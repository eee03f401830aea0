//! Conversation log storage

use std::sync::Arc;

use duolog_core::ConversationLog;

use crate::backend::{StorageBackend, StorageError, StorageExt};

/// Store for per-question transcript pairs (`log:` key space)
#[derive(Debug, Clone)]
pub struct LogStore {
    backend: Arc<dyn StorageBackend>,
}

impl LogStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    fn key(log_id: &str) -> String {
        format!("log:{}", log_id)
    }

    /// Persist a conversation log. Logs are write-once.
    pub async fn save(&self, log: &ConversationLog) -> Result<(), StorageError> {
        self.backend.put(&Self::key(&log.log_id), log).await
    }

    /// Load a log by id; a miss is a [`StorageError::NotFound`]
    pub async fn get(&self, log_id: &str) -> Result<ConversationLog, StorageError> {
        self.backend
            .get(&Self::key(log_id))
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("log {}", log_id)))
    }

    /// Number of persisted logs (test/diagnostic helper)
    pub async fn count(&self) -> Result<usize, StorageError> {
        Ok(self.backend.list_keys("log:").await?.len())
    }
}
