use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::{ObjectStore, PutPayload};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::config::StorageConfig;
use super::error::StorageResult;
use super::traits::KeyValueStore;

/// Key/value adapter over any `object_store` backend. Each key is stored as a
/// single object whose location is the key itself.
pub struct ObjectStoreBackend {
    store: Arc<dyn ObjectStore>,
}

impl ObjectStoreBackend {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    pub fn from_config(config: StorageConfig) -> Result<Self> {
        let store: Arc<dyn ObjectStore> = match config {
            StorageConfig::Local { path } => {
                info!("Initializing local storage at: {:?}", path);
                std::fs::create_dir_all(&path)?;
                Arc::new(LocalFileSystem::new_with_prefix(path)?)
            }
            StorageConfig::S3 {
                bucket,
                region,
                endpoint,
                access_key_id,
                secret_access_key,
                allow_http,
            } => {
                info!("Initializing S3 storage in bucket: {}", bucket);
                let mut builder = AmazonS3Builder::new()
                    .with_bucket_name(bucket)
                    .with_allow_http(allow_http);
                if let Some(region) = region {
                    builder = builder.with_region(region);
                }
                if let Some(endpoint) = endpoint {
                    builder = builder.with_endpoint(endpoint);
                }
                if let Some(access_key_id) = access_key_id {
                    builder = builder.with_access_key_id(access_key_id);
                }
                if let Some(secret_access_key) = secret_access_key {
                    builder = builder.with_secret_access_key(secret_access_key);
                }
                Arc::new(builder.build()?)
            }
            StorageConfig::Memory => {
                info!("Initializing in-memory object storage");
                Arc::new(InMemory::new())
            }
        };

        Ok(Self { store })
    }

    fn location(key: &str) -> Path {
        Path::from(key)
    }
}

#[async_trait]
impl KeyValueStore for ObjectStoreBackend {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        match self.store.get(&Self::location(key)).await {
            Ok(result) => {
                let bytes = result.bytes().await?;
                Ok(Some(bytes.to_vec()))
            }
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self, value), fields(len = value.len()))]
    async fn set(&self, key: &str, value: Vec<u8>) -> StorageResult<()> {
        let payload = PutPayload::from(Bytes::from(value));
        self.store.put(&Self::location(key), payload).await?;
        debug!("Stored object {}", key);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn exists(&self, key: &str) -> StorageResult<bool> {
        match self.store.head(&Self::location(key)).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self))]
    async fn keys(&self, prefix: &str) -> StorageResult<Vec<String>> {
        // Object-store prefixes are path based, so list everything and match on
        // the raw key string.
        let mut stream = self.store.list(None);
        let mut keys = Vec::new();

        while let Some(meta) = stream.next().await.transpose()? {
            let key = meta.location.as_ref();
            if key.starts_with(prefix) {
                keys.push(key.to_string());
            }
        }

        Ok(keys)
    }
}
