use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use super::error::{StorageError, StorageResult};
use super::traits::KeyValueStore;

/// Bounds every backend call by a fixed deadline. A call that overruns is
/// reported as [`StorageError::Timeout`] and its result is discarded.
pub struct TimedStore {
    inner: Arc<dyn KeyValueStore>,
    limit: Duration,
}

impl TimedStore {
    pub fn new(inner: Arc<dyn KeyValueStore>, limit: Duration) -> Self {
        Self { inner, limit }
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        key: &str,
        call: impl Future<Output = StorageResult<T>> + Send,
    ) -> StorageResult<T> {
        if let Ok(result) = tokio::time::timeout(self.limit, call).await {
            result
        } else {
            warn!("Storage {} on '{}' exceeded {:?}", operation, key, self.limit);
            Err(StorageError::Timeout {
                operation,
                key: key.to_string(),
                elapsed: self.limit,
            })
        }
    }
}

#[async_trait]
impl KeyValueStore for TimedStore {
    async fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        self.bounded("get", key, self.inner.get(key)).await
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> StorageResult<()> {
        self.bounded("set", key, self.inner.set(key, value)).await
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        self.bounded("exists", key, self.inner.exists(key)).await
    }

    async fn keys(&self, prefix: &str) -> StorageResult<Vec<String>> {
        self.bounded("keys", prefix, self.inner.keys(prefix)).await
    }
}
