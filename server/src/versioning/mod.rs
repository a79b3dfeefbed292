//! Versioned current-configuration store.
//!
//! A single document lives under [`CURRENT_CONFIG_KEY`]. Replace, partial
//! update and restore all snapshot the previous document into the
//! [`BackupLog`] before writing, so any earlier state can be brought back.

mod backup;
mod clock;
mod error;
mod merge;
mod restore;
mod seed;
mod store;


pub use backup::{BACKUP_PREFIX, BackupLog, backup_key, parse_backup_timestamp};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, ConfigResult};
pub use merge::{DEFAULT_DEEP_MERGE_FIELDS, MergePolicy};
pub use store::{CURRENT_CONFIG_KEY, ConfigStore};
