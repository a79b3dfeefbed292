use async_trait::async_trait;

use super::error::StorageResult;

/// Opaque key/value backend. Holds no business logic.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the raw value stored under `key`, or `None` when absent.
    async fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// Once this returns `Ok` the value must be readable by subsequent `get` calls.
    async fn set(&self, key: &str, value: Vec<u8>) -> StorageResult<()>;

    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// All keys starting with `prefix`, in no particular order.
    async fn keys(&self, prefix: &str) -> StorageResult<Vec<String>>;
}
