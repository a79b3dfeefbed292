use shared_types::{BackupId, WriteOutcome};
use tracing::{info, instrument};

use super::error::ConfigResult;
use super::store::ConfigStore;

impl ConfigStore {
    /// Make the backup `id` current again.
    ///
    /// The configuration being replaced is itself snapshotted first, so a
    /// restore can always be undone. The restored backup is only read.
    #[instrument(skip(self))]
    pub async fn restore(&self, id: &BackupId) -> ConfigResult<WriteOutcome> {
        let target = self.backups().get(id).await?;
        let previous = self.load_current().await?;

        let outcome = self.commit(previous.as_ref(), target).await?;

        info!(
            "Restored backup {} (pre-restore state saved as {:?})",
            id, outcome.backup
        );
        Ok(outcome)
    }
}
