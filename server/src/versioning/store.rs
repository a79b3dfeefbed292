use shared_types::{BackupId, Configuration, WriteOutcome};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::backup::{BackupLog, decode};
use super::clock::{Clock, SystemClock};
use super::error::{ConfigError, ConfigResult};
use super::merge::MergePolicy;
use crate::storage::{KeyValueStore, StorageError};

/// Reserved key holding the current configuration. Never inside the backup
/// namespace.
pub const CURRENT_CONFIG_KEY: &str = "agent_config";

/// Owner of the single current configuration document.
///
/// Every write-class operation snapshots the previous document into the
/// [`BackupLog`] before the new one is written. If the snapshot fails the
/// write is abandoned and the current document is left as it was.
pub struct ConfigStore {
    storage: Arc<dyn KeyValueStore>,
    backups: BackupLog,
    merge_policy: MergePolicy,
}

impl ConfigStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self::with_clock(storage, Arc::new(SystemClock))
    }

    pub fn with_clock(storage: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            backups: BackupLog::new(Arc::clone(&storage), clock),
            storage,
            merge_policy: MergePolicy::default(),
        }
    }

    #[must_use]
    pub fn with_merge_policy(mut self, merge_policy: MergePolicy) -> Self {
        self.merge_policy = merge_policy;
        self
    }

    pub fn backups(&self) -> &BackupLog {
        &self.backups
    }

    pub fn merge_policy(&self) -> &MergePolicy {
        &self.merge_policy
    }

    pub(super) fn storage(&self) -> &dyn KeyValueStore {
        self.storage.as_ref()
    }

    pub(super) async fn load_current(&self) -> ConfigResult<Option<Configuration>> {
        match self.storage.get(CURRENT_CONFIG_KEY).await? {
            Some(bytes) => Ok(Some(decode(CURRENT_CONFIG_KEY, &bytes)?)),
            None => Ok(None),
        }
    }

    pub(super) async fn write_current(&self, config: &Configuration) -> ConfigResult<()> {
        let encoded = serde_json::to_vec(config).map_err(StorageError::from)?;
        self.storage.set(CURRENT_CONFIG_KEY, encoded).await?;
        Ok(())
    }

    /// Snapshot `previous` (when there is one), then make `next` current.
    pub(super) async fn commit(
        &self,
        previous: Option<&Configuration>,
        next: Configuration,
    ) -> ConfigResult<WriteOutcome> {
        let encoded = serde_json::to_vec(&next).map_err(StorageError::from)?;

        let backup: Option<BackupId> = match previous {
            Some(previous) => Some(self.backups.snapshot(previous).await?),
            None => {
                debug!("No current configuration, skipping backup");
                None
            }
        };

        self.storage.set(CURRENT_CONFIG_KEY, encoded).await?;

        Ok(WriteOutcome {
            config: next,
            backup,
        })
    }

    /// The current configuration.
    #[instrument(skip(self))]
    pub async fn read(&self) -> ConfigResult<Configuration> {
        self.load_current()
            .await?
            .ok_or_else(|| ConfigError::NotFound("Configuration not initialized".to_string()))
    }

    /// Overwrite the current configuration with `new_config` verbatim.
    #[instrument(skip(self, new_config))]
    pub async fn replace(&self, new_config: Configuration) -> ConfigResult<WriteOutcome> {
        let previous = self.load_current().await?;
        let outcome = self.commit(previous.as_ref(), new_config).await?;

        info!("Replaced configuration (backup: {:?})", outcome.backup);
        Ok(outcome)
    }

    /// Merge `patch` into the current configuration according to the
    /// store's [`MergePolicy`]. An absent configuration merges as `{}`.
    #[instrument(skip(self, patch), fields(fields = patch.len()))]
    pub async fn partial_update(&self, patch: Configuration) -> ConfigResult<WriteOutcome> {
        let previous = self.load_current().await?;
        let base = previous.clone().unwrap_or_default();
        let merged = self.merge_policy.merge(base, patch);
        let outcome = self.commit(previous.as_ref(), merged).await?;

        info!("Partially updated configuration (backup: {:?})", outcome.backup);
        Ok(outcome)
    }
}
