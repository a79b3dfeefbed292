use shared_types::Configuration;
use tracing::{debug, info, instrument};

use super::error::ConfigResult;
use super::store::{CURRENT_CONFIG_KEY, ConfigStore};

impl ConfigStore {
    /// Write `default_config` as current if nothing is stored yet. No backup
    /// is taken. Returns whether the store was seeded by this call.
    #[instrument(skip(self, default_config))]
    pub async fn ensure_seeded(&self, default_config: &Configuration) -> ConfigResult<bool> {
        if self.storage().exists(CURRENT_CONFIG_KEY).await? {
            debug!("Configuration already present, not seeding");
            return Ok(false);
        }

        self.write_current(default_config).await?;
        info!("Initialized store with default configuration");
        Ok(true)
    }
}
