use anyhow::Result;
use axum::{
    Router,
    routing::{get, post},
};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use super::{handlers, state::AppState};
use crate::versioning::ConfigStore;

pub fn router(store: Arc<ConfigStore>) -> Router {
    let app_state = Arc::new(AppState { store });

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Current configuration
        .route(
            "/api/config/agents",
            get(handlers::get_config)
                .put(handlers::replace_config)
                .patch(handlers::patch_config),
        )
        // Backups
        .route("/api/config/agents/backups", get(handlers::list_backups))
        .route(
            "/api/config/agents/backups/:backup_id",
            get(handlers::get_backup),
        )
        .route(
            "/api/config/agents/restore/:backup_id",
            post(handlers::restore_backup),
        )
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Serve the API on an already bound listener until the process stops.
pub async fn serve(listener: TcpListener, store: Arc<ConfigStore>) -> Result<()> {
    info!("Server listening on {}", listener.local_addr()?);
    axum::serve(listener, router(store)).await?;
    Ok(())
}

pub async fn start_server(store: Arc<ConfigStore>, bind_address: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(bind_address).await?;
    serve(listener, store).await
}
