use anyhow::{Context, Result};
use shared_types::Configuration;
use std::net::SocketAddr;
use std::time::Duration;

use crate::storage::StorageConfig;
use crate::versioning::MergePolicy;

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3001";
const DEFAULT_STORAGE_TIMEOUT_MS: u64 = 5_000;
const BUILTIN_SEED: &str = include_str!("../config/default_config.json");

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_address: SocketAddr,
    pub storage: StorageConfig,
    pub storage_timeout: Duration,
    pub merge_policy: MergePolicy,
    pub seed: Configuration,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bind_address = lookup("BIND_ADDRESS")
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string())
            .parse::<SocketAddr>()
            .context("BIND_ADDRESS must be a socket address")?;

        let storage_timeout = match lookup("STORAGE_TIMEOUT_MS") {
            Some(ms) => Duration::from_millis(
                ms.parse::<u64>()
                    .with_context(|| format!("Invalid STORAGE_TIMEOUT_MS: {ms}"))?,
            ),
            None => Duration::from_millis(DEFAULT_STORAGE_TIMEOUT_MS),
        };

        let merge_policy = lookup("DEEP_MERGE_FIELDS")
            .map(|fields| MergePolicy::from_list(&fields))
            .unwrap_or_default();

        let seed = match lookup("SEED_CONFIG_PATH") {
            Some(path) => {
                let raw = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read seed config {path}"))?;
                parse_seed(&raw).with_context(|| format!("Invalid seed config {path}"))?
            }
            None => parse_seed(BUILTIN_SEED).context("Invalid built-in seed config")?,
        };

        Ok(Self {
            bind_address,
            storage: StorageConfig::from_lookup(&lookup)?,
            storage_timeout,
            merge_policy,
            seed,
        })
    }
}

fn parse_seed(raw: &str) -> Result<Configuration> {
    serde_json::from_str(raw).context("Seed configuration must be a JSON object")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn settings_from(vars: &[(&str, &str)]) -> Result<Settings> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Settings::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let settings = settings_from(&[]).unwrap();

        assert_eq!(settings.bind_address, "0.0.0.0:3001".parse::<SocketAddr>().unwrap());
        assert_eq!(settings.storage, StorageConfig::local("./data"));
        assert_eq!(settings.storage_timeout, Duration::from_secs(5));
        assert_eq!(settings.merge_policy, MergePolicy::default());
        assert!(settings.seed.contains_key("roleNames"));
    }

    #[test]
    fn test_overrides() {
        let settings = settings_from(&[
            ("BIND_ADDRESS", "127.0.0.1:8080"),
            ("STORAGE_BACKEND", "memory"),
            ("STORAGE_TIMEOUT_MS", "250"),
            ("DEEP_MERGE_FIELDS", "roleNames,limits"),
        ])
        .unwrap();

        assert_eq!(settings.bind_address, "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(settings.storage, StorageConfig::Memory);
        assert_eq!(settings.storage_timeout, Duration::from_millis(250));
        assert_eq!(
            settings.merge_policy,
            MergePolicy::new(["roleNames", "limits"])
        );
    }

    #[test]
    fn test_seed_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"theme": "light"}}"#).unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let settings = settings_from(&[("SEED_CONFIG_PATH", path.as_str())]).unwrap();

        assert_eq!(
            serde_json::Value::Object(settings.seed),
            serde_json::json!({"theme": "light"})
        );
    }

    #[test]
    fn test_seed_must_be_object() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[1, 2]").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        assert!(settings_from(&[("SEED_CONFIG_PATH", path.as_str())]).is_err());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(settings_from(&[("BIND_ADDRESS", "not-an-address")]).is_err());
        assert!(settings_from(&[("STORAGE_TIMEOUT_MS", "soon")]).is_err());
    }
}
