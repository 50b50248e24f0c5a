// Async wrapper for the document store
// Runs the blocking file I/O on tokio's blocking pool

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tokio::task;

use crate::document::Document;
use crate::errors::{JsonDbError, Result};
use crate::outcome::Outcome;
use crate::path_key::PathKey;
use crate::store::Store;

/// Cheap-to-clone handle shared by every connection worker
#[derive(Debug, Clone)]
pub struct AsyncStore {
    inner: Arc<Store>,
}

impl AsyncStore {
    /// Open the store at `path`; see [`Store::open`] for the truncation rule
    pub async fn open(path: &Path, persist: bool) -> Result<Self> {
        let path_buf: PathBuf = path.to_path_buf();
        let store = task::spawn_blocking(move || Store::open(&path_buf, persist))
            .await
            .map_err(|e| worker_failure("open", e))??;

        Ok(AsyncStore {
            inner: Arc::new(store),
        })
    }

    pub fn from_store(store: Store) -> Self {
        AsyncStore {
            inner: Arc::new(store),
        }
    }

    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    pub async fn get(&self, key: PathKey) -> Outcome {
        let store = self.inner.clone();
        task::spawn_blocking(move || store.get(&key))
            .await
            .unwrap_or_else(|e| joined_outcome("get", e))
    }

    pub async fn set(&self, key: PathKey, value: Value) -> Outcome {
        let store = self.inner.clone();
        task::spawn_blocking(move || store.set(&key, value))
            .await
            .unwrap_or_else(|e| joined_outcome("set", e))
    }

    pub async fn delete(&self, key: PathKey) -> Outcome {
        let store = self.inner.clone();
        task::spawn_blocking(move || store.delete(&key))
            .await
            .unwrap_or_else(|e| joined_outcome("delete", e))
    }

    pub async fn snapshot(&self) -> Result<Document> {
        let store = self.inner.clone();
        task::spawn_blocking(move || store.snapshot())
            .await
            .map_err(|e| worker_failure("snapshot", e))?
    }
}

fn worker_failure(operation: &str, e: task::JoinError) -> JsonDbError {
    JsonDbError::Worker {
        operation: operation.to_string(),
        reason: e.to_string(),
    }
}

fn joined_outcome(operation: &str, e: task::JoinError) -> Outcome {
    tracing::error!(error = %worker_failure(operation, e), "store worker did not finish");
    Outcome::DatabaseError
}
