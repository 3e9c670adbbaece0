//! Call History API Tests

use axum::http::StatusCode;
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use chat_call_server::application::relay::{CallOffer, CallParties, ClientEvent};
use chat_call_server::domain::{CallRecord, CallRecordStatus};

use crate::common::TestApp;

#[tokio::test]
async fn test_completed_call_appears_in_history() {
    let app = TestApp::new().await;
    let mut alice = app.connect("alice").await;
    let mut bob = app.connect("bob").await;

    alice
        .send(
            &app,
            ClientEvent::InitiateCall(CallOffer {
                caller_id: "alice".into(),
                receiver_id: "bob".into(),
                signal_data: json!({"type": "offer", "sdp": "v=0"}),
            }),
        )
        .await;
    bob.next_event().await;
    bob.send(
        &app,
        ClientEvent::AcceptCall(CallOffer {
            caller_id: "alice".into(),
            receiver_id: "bob".into(),
            signal_data: json!({"type": "answer", "sdp": "v=0"}),
        }),
    )
    .await;
    alice.next_event().await;
    alice
        .send(
            &app,
            ClientEvent::EndCall(CallParties {
                caller_id: "alice".into(),
                receiver_id: "bob".into(),
            }),
        )
        .await;

    app.wait_for_calls(|calls| calls.iter().any(|c| c.status == CallRecordStatus::Completed))
        .await;

    let history: Vec<Value> = app.server.get("/api/calls/history/bob").await.json();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["callerId"], "alice");
    assert_eq!(history[0]["receiverId"], "bob");
    assert_eq!(history[0]["status"], "completed");
    assert!(history[0]["durationSecs"].as_i64().is_some());

    let id = history[0]["id"].as_str().unwrap();
    let call: Value = app.server.get(&format!("/api/calls/{id}")).await.json();
    assert_eq!(call["status"], "completed");
}

#[tokio::test]
async fn test_unanswered_call_recorded_as_missed() {
    let app = TestApp::new().await;
    let alice = app.connect("alice").await;
    let bob = app.connect("bob").await;

    alice
        .send(
            &app,
            ClientEvent::InitiateCall(CallOffer {
                caller_id: "alice".into(),
                receiver_id: "bob".into(),
                signal_data: json!({"type": "offer", "sdp": "v=0"}),
            }),
        )
        .await;
    app.relay.disconnect(bob.handle.clone()).await.unwrap();

    let calls = app
        .wait_for_calls(|calls| calls.iter().any(|c| c.status == CallRecordStatus::Missed))
        .await;
    assert_eq!(calls[0].duration_secs, None);
}

#[tokio::test]
async fn test_history_newest_first() {
    let app = TestApp::new().await;
    let older = CallRecord::initiated(Uuid::now_v7(), "alice".into(), "bob".into(), Utc::now());
    let newer = CallRecord::initiated(Uuid::now_v7(), "carol".into(), "alice".into(), Utc::now());
    app.calls.insert(older.clone());
    app.calls.insert(newer.clone());

    let history: Vec<CallRecord> = app.server.get("/api/calls/history/alice").await.json();

    assert_eq!(history, vec![newer, older]);
}

#[tokio::test]
async fn test_unknown_call_is_not_found() {
    let app = TestApp::new().await;

    let response = app.server.get(&format!("/api/calls/{}", Uuid::new_v4())).await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["message"], "Call not found");
}

#[tokio::test]
async fn test_malformed_call_id_is_bad_request() {
    let app = TestApp::new().await;

    let response = app.server.get("/api/calls/not-a-uuid").await;

    response.assert_status(StatusCode::BAD_REQUEST);
}
