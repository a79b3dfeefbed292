use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A schemaless configuration document. Always a JSON object at the top level.
pub type Configuration = serde_json::Map<String, serde_json::Value>;

/// Identifier of a backup record, which is also its storage key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct BackupId(String);

impl BackupId {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for BackupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for BackupId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A point-in-time copy of the current configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupRecord {
    pub id: BackupId,
    pub data: Configuration,
    pub timestamp: DateTime<Utc>,
}

/// Result of a write-class operation: the new current document and the
/// snapshot taken of the previous one, if there was one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteOutcome {
    pub config: Configuration,
    pub backup: Option<BackupId>,
}
