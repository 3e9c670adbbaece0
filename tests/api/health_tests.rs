//! Health Check API Tests

use axum::http::StatusCode;
use serde_json::Value;

use crate::common::TestApp;

#[tokio::test]
async fn test_health_check_returns_ok() {
    let app = TestApp::new().await;

    let response = app.server.get("/health").await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_liveness_probe() {
    let app = TestApp::new().await;

    let response = app.server.get("/health/live").await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "alive");
}

#[tokio::test]
async fn test_readiness_reports_relay_stats() {
    let app = TestApp::new().await;
    let _alice = app.connect("alice").await;

    let response = app.server.get("/health/ready").await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["checks"]["relay"]["online_users"], 1);
    assert_eq!(json["checks"]["relay"]["active_calls"], 0);
}

#[tokio::test]
async fn test_readiness_unavailable_when_store_down() {
    let app = TestApp::new().await;
    app.messages.set_down(true);

    let response = app.server.get("/health/ready").await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.json::<Value>()["status"], "unhealthy");
}

#[tokio::test]
async fn test_metrics_endpoint_exposes_relay_gauges() {
    let app = TestApp::new().await;
    let _alice = app.connect("alice").await;
    app.relay.stats().await.unwrap();

    let response = app.server.get("/metrics").await;

    response.assert_status_ok();
    assert!(response.text().contains("chat_call_relay_online_users"));
}
