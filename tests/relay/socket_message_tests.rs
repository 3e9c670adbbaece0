//! Socket frame handling: chat messages are stored before they are relayed

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;

use chat_call_server::application::relay::ServerEvent;
use chat_call_server::presentation::websocket::handler::handle_text;
use chat_call_server::presentation::websocket::ConnectionSession;

use crate::common::{test_settings, TestApp, TestClient};

async fn send_frame(app: &TestApp, client: &TestClient, frame: serde_json::Value) {
    let mut session = ConnectionSession::new(client.handle.id());
    handle_text(&frame.to_string(), &client.handle, &mut session, &app.state)
        .await
        .unwrap();
}

fn chat_frame(sender: &str, receiver: &str, text: &str) -> serde_json::Value {
    json!({
        "event": "sendMessage",
        "data": {"sender": sender, "receiver": receiver, "text": text}
    })
}

#[tokio::test]
async fn test_socket_message_is_stored_then_relayed_with_id() {
    let app = TestApp::new().await;
    let mut alice = app.connect("alice").await;
    let mut bob = app.connect("bob").await;

    send_frame(&app, &alice, chat_frame("alice", "bob", "hi bob")).await;

    let stored = app.messages.all();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].message, "hi bob");

    for client in [&mut bob, &mut alice] {
        match client.next_event().await {
            ServerEvent::ReceiveMessage(relayed) => {
                assert_eq!(relayed.id, Some(stored[0].id));
                assert_eq!(relayed.message, "hi bob");
            }
            other => panic!("expected receiveMessage, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_socket_message_with_empty_field_is_dropped() {
    let app = TestApp::new().await;
    let mut alice = app.connect("alice").await;
    let mut bob = app.connect("bob").await;

    send_frame(&app, &alice, chat_frame("alice", "bob", "")).await;

    assert!(app.messages.all().is_empty());
    bob.assert_no_event(&app).await;
    alice.assert_no_event(&app).await;
}

#[tokio::test]
async fn test_socket_message_relayed_unsaved_when_store_down() {
    let app = TestApp::new().await;
    let alice = app.connect("alice").await;
    let mut bob = app.connect("bob").await;
    app.messages.set_down(true);

    send_frame(&app, &alice, chat_frame("alice", "bob", "still there?")).await;

    match bob.next_event().await {
        ServerEvent::ReceiveMessage(relayed) => {
            assert_eq!(relayed.id, None);
            assert_eq!(relayed.message, "still there?");
        }
        other => panic!("expected receiveMessage, got {:?}", other),
    }
    assert!(app.messages.all().is_empty());
}

#[tokio::test]
async fn test_slow_store_does_not_hold_back_delivery() {
    let mut settings = test_settings();
    settings.websocket.persist_timeout_ms = 50;
    let app = TestApp::with_settings(settings).await;
    let alice = app.connect("alice").await;
    let mut bob = app.connect("bob").await;
    app.messages.set_save_delay(Duration::from_secs(5));

    tokio::time::timeout(
        Duration::from_secs(1),
        send_frame(&app, &alice, chat_frame("alice", "bob", "quick")),
    )
    .await
    .expect("frame handling waited on the store");

    match bob.next_event().await {
        ServerEvent::ReceiveMessage(relayed) => assert_eq!(relayed.id, None),
        other => panic!("expected receiveMessage, got {:?}", other),
    }
}

#[tokio::test]
async fn test_register_frame_names_the_session() {
    let app = TestApp::new().await;
    let client = app.connect("placeholder").await;
    let mut session = ConnectionSession::new(client.handle.id());

    let frame = json!({"event": "registerUser", "data": " carol "}).to_string();
    handle_text(&frame, &client.handle, &mut session, &app.state)
        .await
        .unwrap();

    assert_eq!(session.user_id.as_deref(), Some("carol"));
    assert_eq!(app.relay.stats().await.unwrap().online_users, 1);
}

#[tokio::test]
async fn test_malformed_frame_is_ignored() {
    let app = TestApp::new().await;
    let alice = app.connect("alice").await;
    let mut bob = app.connect("bob").await;
    let mut session = ConnectionSession::new(alice.handle.id());

    handle_text("{not json", &alice.handle, &mut session, &app.state)
        .await
        .unwrap();
    handle_text(r#"{"event": "unknownEvent", "data": {}}"#, &alice.handle, &mut session, &app.state)
        .await
        .unwrap();

    bob.assert_no_event(&app).await;
}
