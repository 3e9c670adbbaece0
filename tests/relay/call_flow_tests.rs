//! Call signaling scenarios

use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use chat_call_server::application::relay::{CallFailureReason, ClientEvent, ServerEvent};

use crate::common::{TestApp, TestClient};

fn frame(value: Value) -> ClientEvent {
    serde_json::from_value(value).unwrap()
}

fn offer(caller: &str, receiver: &str) -> ClientEvent {
    frame(json!({
        "event": "initiateCall",
        "data": {
            "callerId": caller,
            "receiverId": receiver,
            "signalData": {"type": "offer", "sdp": "v=0"}
        }
    }))
}

async fn ring(app: &TestApp, caller: &TestClient, callee: &mut TestClient, caller_id: &str, callee_id: &str) {
    caller.send(app, offer(caller_id, callee_id)).await;
    match callee.next_event().await {
        ServerEvent::IncomingCall { caller_id: from, .. } => assert_eq!(from, caller_id),
        other => panic!("expected incomingCall, got {:?}", other),
    }
}

#[tokio::test]
async fn test_full_call_with_candidate_exchange() {
    let app = TestApp::new().await;
    let mut alice = app.connect("alice").await;
    let mut bob = app.connect("bob").await;

    ring(&app, &alice, &mut bob, "alice", "bob").await;

    bob.send(
        &app,
        frame(json!({
            "event": "acceptCall",
            "data": {"callerId": "alice", "receiverId": "bob", "signalData": {"type": "answer", "sdp": "v=0"}}
        })),
    )
    .await;
    assert_eq!(
        alice.next_event().await,
        ServerEvent::CallAccepted {
            signal_data: json!({"type": "answer", "sdp": "v=0"})
        }
    );

    let candidate = json!({"candidate": "candidate:1 1 UDP 2122252543 10.0.0.2 54400 typ host"});
    alice
        .send(
            &app,
            frame(json!({"event": "signal", "data": {"userId": "bob", "signal": candidate}})),
        )
        .await;
    assert_eq!(
        bob.next_event().await,
        ServerEvent::Signal {
            user_id: Some("alice".into()),
            signal: candidate,
        }
    );

    bob.send(
        &app,
        frame(json!({"event": "endCall", "data": {"callerId": "alice", "receiverId": "bob"}})),
    )
    .await;
    assert_eq!(
        alice.next_event().await,
        ServerEvent::CallEnded { user_id: "bob".into() }
    );
    assert_eq!(app.relay.stats().await.unwrap().active_calls, 0);
}

#[tokio::test]
async fn test_call_to_offline_user_fails() {
    let app = TestApp::new().await;
    let mut alice = app.connect("alice").await;

    alice.send(&app, offer("alice", "bob")).await;

    assert_eq!(
        alice.next_event().await,
        ServerEvent::CallFailed {
            receiver_id: "bob".into(),
            reason: CallFailureReason::Offline,
        }
    );
}

#[tokio::test]
async fn test_call_to_busy_user_fails() {
    let app = TestApp::new().await;
    let alice = app.connect("alice").await;
    let mut bob = app.connect("bob").await;
    let mut carol = app.connect("carol").await;

    ring(&app, &alice, &mut bob, "alice", "bob").await;
    carol.send(&app, offer("carol", "bob")).await;

    assert_eq!(
        carol.next_event().await,
        ServerEvent::CallFailed {
            receiver_id: "bob".into(),
            reason: CallFailureReason::Busy,
        }
    );
    bob.assert_no_event(&app).await;
}

#[tokio::test]
async fn test_rejected_call_frees_both_parties() {
    let app = TestApp::new().await;
    let mut alice = app.connect("alice").await;
    let mut bob = app.connect("bob").await;

    ring(&app, &alice, &mut bob, "alice", "bob").await;
    bob.send(
        &app,
        frame(json!({"event": "rejectCall", "data": {"callerId": "alice", "receiverId": "bob"}})),
    )
    .await;

    assert_eq!(
        alice.next_event().await,
        ServerEvent::CallRejected { receiver_id: "bob".into() }
    );
    ring(&app, &alice, &mut bob, "alice", "bob").await;
}

#[tokio::test]
async fn test_empty_signal_is_never_forwarded() {
    let app = TestApp::new().await;
    let alice = app.connect("alice").await;
    let mut bob = app.connect("bob").await;

    alice
        .send(&app, frame(json!({"event": "signal", "data": {"userId": "bob", "signal": {}}})))
        .await;

    bob.assert_no_event(&app).await;
}

#[tokio::test]
async fn test_callee_disconnect_ends_call_for_caller() {
    let app = TestApp::new().await;
    let mut alice = app.connect("alice").await;
    let mut bob = app.connect("bob").await;

    ring(&app, &alice, &mut bob, "alice", "bob").await;
    app.relay.disconnect(bob.handle.clone()).await.unwrap();

    assert_eq!(
        alice.next_event().await,
        ServerEvent::CallEnded { user_id: "bob".into() }
    );
    let stats = app.relay.stats().await.unwrap();
    assert_eq!(stats.online_users, 1);
    assert_eq!(stats.active_calls, 0);
}
