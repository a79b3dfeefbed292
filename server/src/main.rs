use anyhow::Result;
use server::settings::Settings;
use server::storage::{KeyValueStore, ObjectStoreBackend, TimedStore};
use server::versioning::ConfigStore;
use std::sync::Arc;
use tracing::{Level, info};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine; real environment variables still apply
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()),
        )
        .init();

    info!("Starting agent config server");

    let settings = Settings::from_env()?;
    info!("Using storage backend: {:?}", settings.storage);

    // Initialize storage backend
    let backend: Arc<dyn KeyValueStore> =
        Arc::new(ObjectStoreBackend::from_config(settings.storage.clone())?);
    let storage: Arc<dyn KeyValueStore> =
        Arc::new(TimedStore::new(backend, settings.storage_timeout));

    let store = ConfigStore::new(storage).with_merge_policy(settings.merge_policy.clone());
    store.ensure_seeded(&settings.seed).await?;

    // Start the HTTP server
    server::http::start_server(Arc::new(store), settings.bind_address).await?;

    Ok(())
}
