use anyhow::Result;
use reqwest::{Client as ReqwestClient, Response, StatusCode};
use serde::Deserialize;
use shared_types::{BackupId, BackupRecord, Configuration, WriteOutcome};
use std::time::Duration;
use tracing::debug;

const CONFIG_PATH: &str = "/api/config/agents";

/// Body returned by the write endpoints
#[derive(Debug, Deserialize)]
struct WriteResponse {
    backup_id: Option<BackupId>,
    config: Configuration,
}

/// Client for interacting with the agent config service
pub struct ConfigClient {
    client: ReqwestClient,
    base_url: String,
}

impl ConfigClient {
    /// Create a new client instance
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = ReqwestClient::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, CONFIG_PATH, path)
    }

    async fn write_outcome(response: Response) -> Result<WriteOutcome> {
        response.error_for_status_ref()?;
        let body: WriteResponse = response.json().await?;

        Ok(WriteOutcome {
            config: body.config,
            backup: body.backup_id,
        })
    }

    /// Get the current configuration
    pub async fn get_config(&self) -> Result<Configuration> {
        let response = self.client.get(self.url("")).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            anyhow::bail!("Configuration not initialized");
        }

        response.error_for_status_ref()?;

        Ok(response.json().await?)
    }

    /// Replace the current configuration
    pub async fn replace_config(&self, config: &Configuration) -> Result<WriteOutcome> {
        debug!("Replacing configuration ({} fields)", config.len());
        let response = self.client.put(self.url("")).json(config).send().await?;

        Self::write_outcome(response).await
    }

    /// Merge a partial document into the current configuration
    pub async fn patch_config(&self, patch: &Configuration) -> Result<WriteOutcome> {
        debug!("Patching configuration ({} fields)", patch.len());
        let response = self.client.patch(self.url("")).json(patch).send().await?;

        Self::write_outcome(response).await
    }

    /// List all backups, newest first
    pub async fn list_backups(&self) -> Result<Vec<BackupRecord>> {
        let response = self.client.get(self.url("/backups")).send().await?;

        response.error_for_status_ref()?;

        Ok(response.json().await?)
    }

    /// Get a single backup
    pub async fn get_backup(&self, id: &BackupId) -> Result<BackupRecord> {
        let response = self
            .client
            .get(self.url(&format!("/backups/{id}")))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            anyhow::bail!("Backup not found: {}", id);
        }

        response.error_for_status_ref()?;

        Ok(response.json().await?)
    }

    /// Make a backup current again
    pub async fn restore_backup(&self, id: &BackupId) -> Result<WriteOutcome> {
        let response = self
            .client
            .post(self.url(&format!("/restore/{id}")))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            anyhow::bail!("Backup not found: {}", id);
        }

        Self::write_outcome(response).await
    }

    /// Check if the service is healthy
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/health", self.base_url);

        let response = self.client.get(&url).send().await?;

        Ok(response.status() == StatusCode::OK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = ConfigClient::new("http://localhost:3001").unwrap();
        assert_eq!(client.base_url, "http://localhost:3001");

        // Test trailing slash removal
        let client = ConfigClient::new("http://localhost:3001/").unwrap();
        assert_eq!(client.base_url, "http://localhost:3001");
    }

    #[test]
    fn test_client_url_formatting() {
        let client = ConfigClient::new("http://localhost:3001///").unwrap();
        assert_eq!(client.url(""), "http://localhost:3001/api/config/agents");
        assert_eq!(
            client.url("/backups"),
            "http://localhost:3001/api/config/agents/backups"
        );
    }

    #[test]
    fn test_client_with_paths() {
        let client = ConfigClient::new("https://api.example.com/v1/").unwrap();
        assert_eq!(
            client.url("/restore/backup:2024-01-01T00-00-00-000Z"),
            "https://api.example.com/v1/api/config/agents/restore/backup:2024-01-01T00-00-00-000Z"
        );
    }
}
