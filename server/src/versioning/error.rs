use thiserror::Error;

use crate::storage::StorageError;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Document stored under '{key}' is not a valid configuration: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
