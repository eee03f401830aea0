//! Filesystem backend: one pretty-printed JSON file per record

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::backend::{StorageBackend, StorageError};

/// Stores each key as `<dir>/<sanitized-key>.json`. Colons in keys (the
/// store prefixes) become double underscores on disk.
#[derive(Debug)]
pub struct FsBackend {
    dir: PathBuf,
}

impl FsBackend {
    /// Open a backend rooted at `dir`, creating the directory if needed
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|e| StorageError::Io(e.to_string()))?;
        Ok(Self { dir })
    }

    fn file_name(key: &str) -> String {
        let sanitized: String = key
            .chars()
            .map(|c| match c {
                ':' => "__".to_string(),
                c if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' => c.to_string(),
                _ => '-'.to_string(),
            })
            .collect();
        format!("{}.json", sanitized)
    }

    fn key_of(file_name: &str) -> Option<String> {
        file_name
            .strip_suffix(".json")
            .map(|stem| stem.replace("__", ":"))
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(Self::file_name(key))
    }
}

#[async_trait]
impl StorageBackend for FsBackend {
    fn name(&self) -> &str {
        "fs"
    }

    async fn is_healthy(&self) -> bool {
        tokio::fs::metadata(&self.dir).await.is_ok()
    }

    async fn put_new(&self, key: &str, value: serde_json::Value) -> Result<(), StorageError> {
        let path = self.path(key);
        if tokio::fs::try_exists(&path)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?
        {
            return Err(StorageError::AlreadyExists(key.to_string()));
        }
        let body = serde_json::to_vec_pretty(&value)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        tokio::fs::write(&path, body)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;
        tracing::debug!(key, path = %path.display(), "record written");
        Ok(())
    }

    async fn get_value(&self, key: &str) -> Result<Option<serde_json::Value>, StorageError> {
        match tokio::fs::read(self.path(key)).await {
            Ok(bytes) => {
                let value = serde_json::from_slice(&bytes)
                    .map_err(|e| StorageError::Serialization(e.to_string()))?;
                Ok(Some(value))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e.to_string())),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        tokio::fs::try_exists(self.path(key))
            .await
            .map_err(|e| StorageError::Io(e.to_string()))
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;
        let mut keys = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?
        {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(key) = Self::key_of(name) {
                if key.starts_with(prefix) {
                    keys.push(key);
                }
            }
        }
        Ok(keys)
    }
}
