use chrono::{DateTime, Duration, NaiveDateTime, SecondsFormat, SubsecRound, Utc};
use shared_types::{BackupId, BackupRecord, Configuration};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::clock::Clock;
use super::error::{ConfigError, ConfigResult};
use crate::storage::{KeyValueStore, StorageError};

/// Namespace tag shared by every backup key.
pub const BACKUP_PREFIX: &str = "backup:";

const KEY_STAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%S-%3fZ";

/// Derive the storage key for a snapshot taken at `at`.
///
/// The timestamp is rendered as RFC 3339 with millisecond precision and the
/// `:` and `.` separators replaced by `-`, e.g.
/// `backup:2024-05-01T12-30-45-123Z`. The rendering is fixed width, so
/// lexicographic key order matches chronological order.
pub fn backup_key(at: DateTime<Utc>) -> BackupId {
    let stamp = at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    BackupId::new(format!("{BACKUP_PREFIX}{stamp}"))
}

/// Recover the timestamp embedded in a backup key. Accepts both the
/// key-safe form and a plain RFC 3339 stamp written by older deployments.
pub fn parse_backup_timestamp(key: &str) -> Option<DateTime<Utc>> {
    let stamp = key.strip_prefix(BACKUP_PREFIX)?;

    NaiveDateTime::parse_from_str(stamp, KEY_STAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .or_else(|_| DateTime::parse_from_rfc3339(stamp).map(|at| at.with_timezone(&Utc)))
        .ok()
}

/// Append-only log of configuration snapshots.
pub struct BackupLog {
    storage: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    last_issued: Mutex<Option<DateTime<Utc>>>,
}

impl BackupLog {
    pub fn new(storage: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            storage,
            clock,
            last_issued: Mutex::new(None),
        }
    }

    /// Newest timestamp among the backups already in storage.
    async fn newest_stored(&self) -> ConfigResult<Option<DateTime<Utc>>> {
        let keys = self.storage.keys(BACKUP_PREFIX).await?;
        Ok(keys
            .iter()
            .filter_map(|key| parse_backup_timestamp(key))
            .max())
    }

    /// Pick a key that sorts after every backup already stored and is not
    /// already taken.
    async fn allocate_key(&self) -> ConfigResult<BackupId> {
        let mut last_issued = self.last_issued.lock().await;

        // First snapshot since startup: resume after whatever is on disk
        if last_issued.is_none() {
            *last_issued = self.newest_stored().await?;
        }

        let mut at = self.clock.now().trunc_subsecs(3);
        if let Some(last) = *last_issued
            && at <= last
        {
            at = last + Duration::milliseconds(1);
        }

        let mut key = backup_key(at);
        while self.storage.exists(key.as_str()).await? {
            debug!("Backup key {} already taken, bumping", key);
            at += Duration::milliseconds(1);
            key = backup_key(at);
        }

        *last_issued = Some(at);
        Ok(key)
    }

    /// Write `config` as a new immutable backup and return its key.
    #[instrument(skip(self, config))]
    pub async fn snapshot(&self, config: &Configuration) -> ConfigResult<BackupId> {
        let encoded = serde_json::to_vec(config).map_err(StorageError::from)?;
        let key = self.allocate_key().await?;

        self.storage.set(key.as_str(), encoded).await?;

        info!("Created backup {}", key);
        Ok(key)
    }

    /// All backups, newest first.
    #[instrument(skip(self))]
    pub async fn list(&self) -> ConfigResult<Vec<BackupRecord>> {
        let keys = self.storage.keys(BACKUP_PREFIX).await?;
        let mut records = Vec::with_capacity(keys.len());

        for key in keys {
            let Some(timestamp) = parse_backup_timestamp(&key) else {
                warn!("Skipping backup with unparseable key: {}", key);
                continue;
            };

            // A key may vanish between listing and reading on shared backends
            let Some(bytes) = self.storage.get(&key).await? else {
                debug!("Backup {} disappeared while listing", key);
                continue;
            };

            let data = decode(&key, &bytes)?;
            records.push(BackupRecord {
                id: BackupId::new(key),
                data,
                timestamp,
            });
        }

        records.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| b.id.cmp(&a.id))
        });

        Ok(records)
    }

    #[instrument(skip(self))]
    pub async fn get_record(&self, id: &BackupId) -> ConfigResult<BackupRecord> {
        let not_found = || ConfigError::NotFound(format!("Backup not found: {id}"));

        let timestamp = parse_backup_timestamp(id.as_str()).ok_or_else(not_found)?;
        let bytes = self.storage.get(id.as_str()).await?.ok_or_else(not_found)?;

        Ok(BackupRecord {
            id: id.clone(),
            data: decode(id.as_str(), &bytes)?,
            timestamp,
        })
    }

    pub async fn get(&self, id: &BackupId) -> ConfigResult<Configuration> {
        Ok(self.get_record(id).await?.data)
    }
}

pub(crate) fn decode(key: &str, bytes: &[u8]) -> ConfigResult<Configuration> {
    serde_json::from_slice(bytes).map_err(|source| ConfigError::Corrupt {
        key: key.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).single().unwrap()
    }

    #[test]
    fn test_backup_key_is_key_safe() {
        let when = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 45).unwrap()
            + Duration::milliseconds(123);
        assert_eq!(
            backup_key(when).as_str(),
            "backup:2024-05-01T12-30-45-123Z"
        );
    }

    #[test]
    fn test_backup_key_pads_whole_seconds() {
        let when = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        assert_eq!(
            backup_key(when).as_str(),
            "backup:2024-05-01T00-00-00-000Z"
        );
    }

    #[test]
    fn test_parse_round_trips_key() {
        let when = at(1_714_566_645_123);
        let key = backup_key(when);
        assert_eq!(parse_backup_timestamp(key.as_str()), Some(when));
    }

    #[test]
    fn test_parse_accepts_plain_rfc3339() {
        let parsed = parse_backup_timestamp("backup:2024-05-01T12:30:45.123Z");
        assert_eq!(parsed, Some(at(1_714_566_645_123)));
    }

    #[test]
    fn test_parse_rejects_foreign_keys() {
        assert_eq!(parse_backup_timestamp("agent_config"), None);
        assert_eq!(parse_backup_timestamp("backup:yesterday"), None);
        assert_eq!(parse_backup_timestamp("backup:"), None);
    }

    #[test]
    fn test_key_order_matches_time_order() {
        let earlier = backup_key(at(1_714_566_645_999));
        let later = backup_key(at(1_714_566_646_000));
        assert!(earlier < later);
    }
}
