use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use mirror_console::{ConsoleError, HttpTransport, Transport};
use mirror_core::api::RetryRequest;
use mirror_core::{JobId, JobStatus};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpListener;

type Captured = Arc<Mutex<Vec<Value>>>;

async fn downloads() -> Json<Value> {
    Json(json!({
        "active": [{
            "id": "foo-1.2.3-20250101",
            "component": "ibm-foo-operator",
            "version": "1.2.3",
            "name": "foo-1.2.3",
            "status": "running",
            "pid": 4242,
            "progress": 40,
            "home_dir": "/opt/cp4i",
        }],
        "history": [{
            "id": "bar-2.0.0-20241201",
            "component": "ibm-bar",
            "version": "2.0.0",
            "name": "bar-2.0.0",
            "status": "stopped",
            "return_code": -15,
        }],
    }))
}

async fn detail(Path(id): Path<String>) -> Response {
    if id != "foo-1.2.3-20250101" {
        return (StatusCode::NOT_FOUND, Json(json!({"error": "Download not found"}))).into_response();
    }
    Json(json!({
        "id": id,
        "component": "ibm-foo-operator",
        "version": "1.2.3",
        "name": "foo-1.2.3",
        "status": "running",
        "log_tail": ["pulling manifests", "copied 12/40 images"],
        "progress": {"percent": 30, "summary": "12 of 40 images"},
    }))
    .into_response()
}

async fn stop(Path(_id): Path<String>) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({"error": "Download is not running"}))).into_response()
}

async fn dismiss(Path(_id): Path<String>) -> Json<Value> {
    Json(json!({"success": true, "message": "Download dismissed"}))
}

async fn retry(
    State(captured): State<Captured>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    captured.lock().push(body);
    Json(json!({"success": true, "download_id": format!("{id}-retry"), "pid": 5151}))
}

async fn logs(Path(name): Path<String>, Query(q): Query<HashMap<String, String>>) -> Json<Value> {
    let home = q.get("home_dir").cloned().unwrap_or_default();
    Json(json!({"logs": format!("{name} @ {home}")}))
}

async fn components() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn validate() -> Json<Value> {
    Json(json!({"valid": false, "output": "oc-mirror: not found"}))
}

async fn start_server() -> (SocketAddr, Captured) {
    let captured: Captured = Arc::default();
    let app = Router::new()
        .route("/api/components", get(components))
        .route("/api/downloads", get(downloads))
        .route(
            "/api/downloads/{id}",
            get(detail).delete(stop).patch(dismiss),
        )
        .route("/api/downloads/{id}/retry", post(retry))
        .route("/api/logs/{name}", get(logs))
        .route("/api/validate", post(validate))
        .with_state(Arc::clone(&captured));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, captured)
}

async fn transport() -> (HttpTransport, Captured) {
    let (addr, captured) = start_server().await;
    let t = HttpTransport::new(&format!("http://{addr}/api")).unwrap();
    (t, captured)
}

#[tokio::test]
async fn lists_both_collections() {
    let (t, _) = transport().await;
    let resp = t.list_downloads().await.unwrap();

    assert_eq!(resp.active.len(), 1);
    let running = &resp.active[0];
    assert_eq!(running.status, JobStatus::Running);
    assert_eq!(running.pid, Some(4242));
    assert_eq!(running.progress.as_ref().and_then(|p| p.percent()), Some(40.0));

    let stopped = &resp.history[0];
    assert_eq!(stopped.status, JobStatus::Stopped);
    assert_eq!(stopped.return_code, Some(-15));
    assert_eq!(stopped.home_dir, None);
}

#[tokio::test]
async fn detail_carries_log_tail_and_summary() {
    let (t, _) = transport().await;
    let detail = t.job_detail(&JobId::new("foo-1.2.3-20250101")).await.unwrap();
    assert_eq!(detail.log_tail.len(), 2);
    assert_eq!(
        detail.job.progress.as_ref().and_then(|p| p.summary()),
        Some("12 of 40 images")
    );
}

#[tokio::test]
async fn error_bodies_become_server_errors() {
    let (t, _) = transport().await;

    let err = t.job_detail(&JobId::new("nope")).await.unwrap_err();
    assert!(matches!(
        err,
        ConsoleError::Server { status: 404, ref message } if message == "Download not found"
    ));

    let err = t.stop(&JobId::new("foo-1.2.3-20250101")).await.unwrap_err();
    assert_eq!(err.user_message("Failed to stop download"), "Download is not running");
}

#[tokio::test]
async fn error_without_body_falls_back_to_the_status_reason() {
    let (t, _) = transport().await;
    let err = t.list_components().await.unwrap_err();
    assert!(matches!(
        err,
        ConsoleError::Server { status: 500, ref message } if message == "Internal Server Error"
    ));
}

#[tokio::test]
async fn dismiss_uses_patch() {
    let (t, _) = transport().await;
    let resp = t.dismiss(&JobId::new("bar-2.0.0-20241201")).await.unwrap();
    assert!(resp.success);
}

#[tokio::test]
async fn retry_sends_every_config_field() {
    let (t, captured) = transport().await;
    let req = RetryRequest {
        home_dir: "/opt/cp4i".into(),
        final_registry: "reg:5000".into(),
        registry_auth_file: "/root/.docker/config.json".into(),
        entitlement_key: String::new(),
    };

    let resp = t.retry(&JobId::new("bar-2.0.0-20241201"), &req).await.unwrap();
    assert_eq!(resp.download_id, Some(JobId::new("bar-2.0.0-20241201-retry")));
    assert_eq!(
        captured.lock()[0],
        json!({
            "home_dir": "/opt/cp4i",
            "final_registry": "reg:5000",
            "registry_auth_file": "/root/.docker/config.json",
            "entitlement_key": "",
        })
    );
}

#[tokio::test]
async fn logs_pass_home_dir_as_query() {
    let (t, _) = transport().await;
    let text = t.logs("foo-1.2.3", "/opt/cp4i").await.unwrap();
    assert_eq!(text, "foo-1.2.3 @ /opt/cp4i");
}

#[tokio::test]
async fn validation_output_is_decoded() {
    let (t, _) = transport().await;
    let resp = t.validate().await.unwrap();
    assert!(!resp.valid);
    assert_eq!(resp.output.as_deref(), Some("oc-mirror: not found"));
}

#[tokio::test]
async fn unreachable_service_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let t = HttpTransport::new(&format!("http://{addr}/api")).unwrap();
    let err = t.list_downloads().await.unwrap_err();
    assert!(matches!(err, ConsoleError::Transport(_)));
    assert_eq!(err.user_message("Failed to load downloads"), "Failed to load downloads");
}
