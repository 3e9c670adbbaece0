//! Chat API Tests

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use chat_call_server::application::relay::ServerEvent;
use chat_call_server::domain::ChatMessage;

use crate::common::TestApp;

async fn send(app: &TestApp, sender: &str, receiver: &str, message: &str) {
    app.server
        .post("/api/chat/send")
        .json(&json!({"sender": sender, "receiver": receiver, "message": message}))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_send_persists_and_relays() {
    let app = TestApp::new().await;
    let mut alice = app.connect("alice").await;
    let mut bob = app.connect("bob").await;

    let response = app
        .server
        .post("/api/chat/send")
        .json(&json!({"sender": "alice", "receiver": "bob", "message": "hello"}))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Message sent successfully");
    assert_eq!(body["newMessage"]["sender"], "alice");
    assert_eq!(body["newMessage"]["softDeletedBy"], json!([]));

    let stored = app.messages.all();
    assert_eq!(stored.len(), 1);

    for client in [&mut bob, &mut alice] {
        match client.next_event().await {
            ServerEvent::ReceiveMessage(relayed) => {
                assert_eq!(relayed.id, Some(stored[0].id));
                assert_eq!(relayed.message, "hello");
            }
            other => panic!("expected receiveMessage, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_send_to_offline_receiver_still_stored() {
    let app = TestApp::new().await;

    send(&app, "alice", "bob", "are you there?").await;

    assert_eq!(app.messages.all().len(), 1);
}

#[tokio::test]
async fn test_send_requires_all_fields() {
    let app = TestApp::new().await;

    let response = app
        .server
        .post("/api/chat/send")
        .json(&json!({"sender": "alice", "message": "hello"}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["message"], "All fields are required");
    assert!(app.messages.all().is_empty());
}

#[tokio::test]
async fn test_messages_require_current_user() {
    let app = TestApp::new().await;

    let response = app.server.get("/api/chat/messages/bob").await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["message"], "Current user ID is required");
}

#[tokio::test]
async fn test_conversation_in_both_directions_oldest_first() {
    let app = TestApp::new().await;
    send(&app, "alice", "bob", "one").await;
    send(&app, "bob", "alice", "two").await;
    send(&app, "alice", "carol", "elsewhere").await;

    let messages: Vec<ChatMessage> = app
        .server
        .get("/api/chat/messages/bob")
        .add_query_param("currentUserId", "alice")
        .await
        .json();

    let texts: Vec<&str> = messages.iter().map(|m| m.message.as_str()).collect();
    assert_eq!(texts, vec!["one", "two"]);
}

#[tokio::test]
async fn test_soft_delete_hides_only_for_requesting_user() {
    let app = TestApp::new().await;
    send(&app, "alice", "bob", "one").await;
    send(&app, "bob", "alice", "two").await;

    let response = app
        .server
        .post("/api/chat/soft-delete")
        .json(&json!({"userId": "bob", "currentUserId": "alice"}))
        .await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({"success": true, "message": "Chat history soft deleted"})
    );

    let for_alice: Vec<ChatMessage> = app
        .server
        .get("/api/chat/messages/bob")
        .add_query_param("currentUserId", "alice")
        .await
        .json();
    assert!(for_alice.is_empty());

    let for_bob: Vec<ChatMessage> = app
        .server
        .get("/api/chat/messages/alice")
        .add_query_param("currentUserId", "bob")
        .await
        .json();
    assert_eq!(for_bob.len(), 2);

    let history: Vec<ChatMessage> = app
        .server
        .get("/api/chat/message-history/bob")
        .add_query_param("currentUserId", "alice")
        .await
        .json();
    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|m| m.soft_deleted_by == vec!["alice".to_string()]));
}

#[tokio::test]
async fn test_soft_delete_is_idempotent() {
    let app = TestApp::new().await;
    send(&app, "alice", "bob", "one").await;

    for _ in 0..2 {
        app.server
            .post("/api/chat/auto-soft-delete")
            .json(&json!({"userId": "bob", "currentUserId": "alice"}))
            .await
            .assert_status_ok();
    }

    assert_eq!(app.messages.all()[0].soft_deleted_by, vec!["alice".to_string()]);
}

#[tokio::test]
async fn test_last_message() {
    let app = TestApp::new().await;

    let missing = app
        .server
        .get("/api/chat/last-message/bob")
        .add_query_param("currentUserId", "alice")
        .await;
    missing.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(missing.json::<Value>()["message"], "No messages found");

    send(&app, "alice", "bob", "first").await;
    send(&app, "bob", "alice", "latest").await;

    let last: ChatMessage = app
        .server
        .get("/api/chat/last-message/bob")
        .add_query_param("currentUserId", "alice")
        .await
        .json();
    assert_eq!(last.message, "latest");
}

#[tokio::test]
async fn test_send_fails_when_store_down() {
    let app = TestApp::new().await;
    let mut bob = app.connect("bob").await;
    app.messages.set_down(true);

    let response = app
        .server
        .post("/api/chat/send")
        .json(&json!({"sender": "alice", "receiver": "bob", "message": "hello"}))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    bob.assert_no_event(&app).await;
}
