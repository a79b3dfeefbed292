use serde::{Deserialize, Serialize};
use shared_types::{BackupId, Configuration, WriteOutcome};

/// Response for replace, partial update and restore
#[derive(Debug, Serialize, Deserialize)]
pub struct WriteResponse {
    pub success: bool,

    /// Backup holding the configuration that was current before this write.
    /// Absent when there was nothing to back up.
    pub backup_id: Option<BackupId>,

    /// The configuration that is now current
    pub config: Configuration,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: Option<String>,
}

impl From<WriteOutcome> for WriteResponse {
    fn from(outcome: WriteOutcome) -> Self {
        Self {
            success: true,
            backup_id: outcome.backup,
            config: outcome.config,
        }
    }
}
