use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use shared_types::{BackupId, BackupRecord, Configuration};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    dto::WriteResponse,
    error::{ApiError, ApiResult},
    state::AppState,
};

fn body(payload: Result<Json<Configuration>, JsonRejection>) -> ApiResult<Configuration> {
    payload
        .map(|Json(config)| config)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

/// GET /api/config/agents
/// Get the current configuration
#[instrument(skip(state))]
pub async fn get_config(State(state): State<Arc<AppState>>) -> ApiResult<Json<Configuration>> {
    info!("Getting current configuration");

    let config = state.store.read().await?;

    Ok(Json(config))
}

/// PUT /api/config/agents
/// Replace the current configuration
#[instrument(skip(state, payload))]
pub async fn replace_config(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Configuration>, JsonRejection>,
) -> ApiResult<Json<WriteResponse>> {
    info!("Replacing configuration");

    let outcome = state.store.replace(body(payload)?).await?;

    Ok(Json(outcome.into()))
}

/// PATCH /api/config/agents
/// Merge a partial document into the current configuration
#[instrument(skip(state, payload))]
pub async fn patch_config(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Configuration>, JsonRejection>,
) -> ApiResult<Json<WriteResponse>> {
    info!("Partially updating configuration");

    let outcome = state.store.partial_update(body(payload)?).await?;

    Ok(Json(outcome.into()))
}

/// GET /api/config/agents/backups
/// List all backups, newest first
#[instrument(skip(state))]
pub async fn list_backups(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<BackupRecord>>> {
    info!("Listing backups");

    let backups = state.store.backups().list().await?;

    Ok(Json(backups))
}

/// GET /api/config/agents/backups/:backup_id
/// Get a single backup
#[instrument(skip(state))]
pub async fn get_backup(
    State(state): State<Arc<AppState>>,
    Path(backup_id): Path<String>,
) -> ApiResult<Json<BackupRecord>> {
    info!("Getting backup: {}", backup_id);

    let record = state
        .store
        .backups()
        .get_record(&BackupId::new(backup_id))
        .await?;

    Ok(Json(record))
}

/// POST /api/config/agents/restore/:backup_id
/// Make a backup current again
#[instrument(skip(state))]
pub async fn restore_backup(
    State(state): State<Arc<AppState>>,
    Path(backup_id): Path<String>,
) -> ApiResult<Json<WriteResponse>> {
    info!("Restoring backup: {}", backup_id);

    let outcome = state.store.restore(&BackupId::new(backup_id)).await?;

    Ok(Json(outcome.into()))
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "agent-config",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
