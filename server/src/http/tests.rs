use super::dto::*;
use super::server::router;
use crate::storage::MemoryStore;
use crate::versioning::ConfigStore;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
    response::Response,
};
use serde_json::json;
use shared_types::BackupRecord;
use std::sync::Arc;
use tower::util::ServiceExt;

async fn create_test_app(seed: Option<serde_json::Value>) -> Router {
    let store = ConfigStore::new(Arc::new(MemoryStore::new()));
    if let Some(serde_json::Value::Object(seed)) = seed {
        store.ensure_seeded(&seed).await.unwrap();
    }
    router(Arc::new(store))
}

fn json_request(method: &str, uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn read_json<T: serde::de::DeserializeOwned>(response: Response) -> T {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app(None).await;

    let response = app.oneshot(empty_request("GET", "/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json: serde_json::Value = read_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["service"], "agent-config");
    assert!(json.get("timestamp").is_some());
}

#[tokio::test]
async fn test_get_uninitialized_config_is_404() {
    let app = create_test_app(None).await;

    let response = app
        .oneshot(empty_request("GET", "/api/config/agents"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let error: ErrorResponse = read_json(response).await;
    assert_eq!(error.error, "Not Found");
}

#[tokio::test]
async fn test_put_and_get_config() {
    let app = create_test_app(Some(json!({"theme": "dark"}))).await;
    let new_config = json!({"theme": "light", "roleNames": {"lead": "Alice"}});

    let response = app
        .clone()
        .oneshot(json_request("PUT", "/api/config/agents", &new_config))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let write: WriteResponse = read_json(response).await;
    assert!(write.success);
    assert!(write.backup_id.is_some());
    assert_eq!(serde_json::Value::Object(write.config), new_config);

    let response = app
        .oneshot(empty_request("GET", "/api/config/agents"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let current: serde_json::Value = read_json(response).await;
    assert_eq!(current, new_config);
}

#[tokio::test]
async fn test_patch_merges_and_backs_up() {
    let app = create_test_app(Some(json!({"theme": "dark"}))).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            "/api/config/agents",
            &json!({"theme": "light", "roleNames": {"lead": "Alice"}}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let write: WriteResponse = read_json(response).await;
    assert_eq!(
        serde_json::Value::Object(write.config),
        json!({"theme": "light", "roleNames": {"lead": "Alice"}})
    );

    let response = app
        .oneshot(empty_request("GET", "/api/config/agents/backups"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let backups: Vec<BackupRecord> = read_json(response).await;
    assert_eq!(backups.len(), 1);
    assert_eq!(Some(backups[0].id.clone()), write.backup_id);
    assert_eq!(
        serde_json::Value::Object(backups[0].data.clone()),
        json!({"theme": "dark"})
    );
}

#[tokio::test]
async fn test_non_object_body_is_rejected() {
    let app = create_test_app(Some(json!({"theme": "dark"}))).await;

    let response = app
        .clone()
        .oneshot(json_request("PUT", "/api/config/agents", &json!([1, 2, 3])))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Nothing was written and nothing was backed up
    let response = app
        .oneshot(empty_request("GET", "/api/config/agents/backups"))
        .await
        .unwrap();
    let backups: Vec<BackupRecord> = read_json(response).await;
    assert!(backups.is_empty());
}

#[tokio::test]
async fn test_restore_backup() {
    let app = create_test_app(Some(json!({"version": 1}))).await;

    let response = app
        .clone()
        .oneshot(json_request("PUT", "/api/config/agents", &json!({"version": 2})))
        .await
        .unwrap();
    let write: WriteResponse = read_json(response).await;
    let backup_id = write.backup_id.unwrap();

    let response = app
        .clone()
        .oneshot(empty_request(
            "POST",
            &format!("/api/config/agents/restore/{backup_id}"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let restored: WriteResponse = read_json(response).await;
    assert!(restored.success);
    assert_eq!(serde_json::Value::Object(restored.config), json!({"version": 1}));

    // The pre-restore state was saved too
    let undo = restored.backup_id.unwrap();
    let response = app
        .oneshot(empty_request(
            "GET",
            &format!("/api/config/agents/backups/{undo}"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let record: BackupRecord = read_json(response).await;
    assert_eq!(serde_json::Value::Object(record.data), json!({"version": 2}));
}

#[tokio::test]
async fn test_restore_missing_backup_is_404() {
    let app = create_test_app(Some(json!({"version": 1}))).await;

    let response = app
        .clone()
        .oneshot(empty_request(
            "POST",
            "/api/config/agents/restore/backup:2000-01-01T00-00-00-000Z",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(empty_request("GET", "/api/config/agents"))
        .await
        .unwrap();
    let current: serde_json::Value = read_json(response).await;
    assert_eq!(current, json!({"version": 1}));
}

#[tokio::test]
async fn test_get_missing_backup_is_404() {
    let app = create_test_app(None).await;

    let response = app
        .oneshot(empty_request("GET", "/api/config/agents/backups/agent_config"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
