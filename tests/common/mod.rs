//! Common Test Utilities
//!
//! In-memory repositories and a test application wired to the real router.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum_test::TestServer;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc::UnboundedReceiver;
use uuid::Uuid;

use chat_call_server::application::relay::{ClientEvent, ConnectionHandle, RelayHandle, ServerEvent};
use chat_call_server::config::{
    CorsSettings, DatabaseSettings, RelaySettings, ServerSettings, Settings, WebSocketSettings,
};
use chat_call_server::domain::{
    CallRecord, CallRecordStatus, CallRepository, ChatMessage, Conversation, MessageRepository,
};
use chat_call_server::shared::error::AppError;
use chat_call_server::startup::{build_router, spawn_relay, AppState};

/// Message store kept in insertion order
#[derive(Default)]
pub struct InMemoryMessageRepository {
    messages: Mutex<Vec<ChatMessage>>,
    down: AtomicBool,
    save_delay_ms: AtomicU64,
}

impl InMemoryMessageRepository {
    /// Make every call fail as if the database were unreachable
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    /// Make every save take this long
    pub fn set_save_delay(&self, delay: Duration) {
        self.save_delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn all(&self) -> Vec<ChatMessage> {
        self.messages.lock().unwrap().clone()
    }

    fn check(&self) -> Result<(), AppError> {
        if self.down.load(Ordering::SeqCst) {
            Err(AppError::Internal("store unavailable".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn save(&self, message: &ChatMessage) -> Result<ChatMessage, AppError> {
        let delay = self.save_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        self.check()?;
        self.messages.lock().unwrap().push(message.clone());
        Ok(message.clone())
    }

    async fn find_conversation(
        &self,
        conversation: &Conversation,
        exclude_hidden_for: Option<String>,
    ) -> Result<Vec<ChatMessage>, AppError> {
        self.check()?;
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| conversation.matches(&m.sender, &m.receiver))
            .filter(|m| exclude_hidden_for.as_deref().map_or(true, |u| !m.is_hidden_for(u)))
            .cloned()
            .collect())
    }

    async fn find_latest(&self, conversation: &Conversation) -> Result<Option<ChatMessage>, AppError> {
        self.check()?;
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|m| conversation.matches(&m.sender, &m.receiver))
            .cloned())
    }

    async fn mark_soft_deleted(&self, conversation: &Conversation, user_id: &str) -> Result<u64, AppError> {
        self.check()?;
        let mut hidden = 0;
        for message in self.messages.lock().unwrap().iter_mut() {
            if conversation.matches(&message.sender, &message.receiver) && !message.is_hidden_for(user_id) {
                message.soft_deleted_by.push(user_id.to_string());
                hidden += 1;
            }
        }
        Ok(hidden)
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.check()
    }
}

/// Call history kept in insertion order
#[derive(Default)]
pub struct InMemoryCallRepository {
    calls: Mutex<Vec<CallRecord>>,
}

impl InMemoryCallRepository {
    pub fn all(&self) -> Vec<CallRecord> {
        self.calls.lock().unwrap().clone()
    }

    pub fn insert(&self, record: CallRecord) {
        self.calls.lock().unwrap().push(record);
    }
}

#[async_trait]
impl CallRepository for InMemoryCallRepository {
    async fn create(&self, record: &CallRecord) -> Result<(), AppError> {
        self.insert(record.clone());
        Ok(())
    }

    async fn mark_answered(&self, id: Uuid, answered_at: DateTime<Utc>) -> Result<(), AppError> {
        if let Some(call) = self.calls.lock().unwrap().iter_mut().find(|c| c.id == id) {
            if call.status == CallRecordStatus::Initiated {
                call.status = CallRecordStatus::Ongoing;
                call.answered_at = Some(answered_at);
                call.updated_at = answered_at;
            }
        }
        Ok(())
    }

    async fn finish(&self, id: Uuid, status: CallRecordStatus, ended_at: DateTime<Utc>) -> Result<(), AppError> {
        if let Some(call) = self.calls.lock().unwrap().iter_mut().find(|c| c.id == id) {
            if !call.status.is_terminal() {
                call.status = status;
                call.ended_at = Some(ended_at);
                call.updated_at = ended_at;
                call.duration_secs = CallRecord::duration_until(call.answered_at, ended_at);
            }
        }
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CallRecord>, AppError> {
        Ok(self.calls.lock().unwrap().iter().find(|c| c.id == id).cloned())
    }

    async fn find_by_participant(&self, user_id: &str) -> Result<Vec<CallRecord>, AppError> {
        Ok(self
            .calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|c| c.caller_id == user_id || c.receiver_id == user_id)
            .cloned()
            .collect())
    }
}

pub fn test_settings() -> Settings {
    Settings {
        server: ServerSettings {
            host: "127.0.0.1".into(),
            port: 0,
        },
        database: DatabaseSettings {
            url: "postgres://unused".into(),
            max_connections: 1,
            min_connections: 0,
            acquire_timeout: 1,
            run_migrations: false,
        },
        cors: CorsSettings {
            allowed_origins: vec!["http://localhost:3000".into()],
        },
        websocket: WebSocketSettings {
            max_message_size: 65536,
            max_frame_size: 16384,
            heartbeat_interval_ms: 25000,
            idle_timeout_secs: 60,
            persist_timeout_ms: 2000,
        },
        relay: RelaySettings {
            command_queue_capacity: 64,
        },
        environment: "test".into(),
    }
}

/// Test application: real router and relay over in-memory stores
pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub relay: RelayHandle,
    pub messages: Arc<InMemoryMessageRepository>,
    pub calls: Arc<InMemoryCallRepository>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_settings(test_settings()).await
    }

    pub async fn with_settings(settings: Settings) -> Self {
        let messages = Arc::new(InMemoryMessageRepository::default());
        let calls = Arc::new(InMemoryCallRepository::default());

        let (relay, _task) = spawn_relay(calls.clone(), &settings);
        let state = AppState::new(messages.clone(), calls.clone(), relay.clone(), settings);
        let server = TestServer::new(build_router(state.clone())).unwrap();

        Self {
            server,
            state,
            relay,
            messages,
            calls,
        }
    }

    /// Register `user_id` on a fresh in-process connection
    pub async fn connect(&self, user_id: &str) -> TestClient {
        let (handle, events) = ConnectionHandle::channel();
        self.relay
            .submit(handle.clone(), ClientEvent::RegisterUser(user_id.to_string()))
            .await
            .unwrap();
        TestClient { handle, events }
    }

    /// Wait for the call history writer to catch up
    pub async fn wait_for_calls<F>(&self, done: F) -> Vec<CallRecord>
    where
        F: Fn(&[CallRecord]) -> bool,
    {
        for _ in 0..100 {
            let calls = self.calls.all();
            if done(&calls) {
                return calls;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("call history did not reach the expected state: {:?}", self.calls.all());
    }
}

/// Connection registered with the relay, without a socket
pub struct TestClient {
    pub handle: ConnectionHandle,
    pub events: UnboundedReceiver<ServerEvent>,
}

impl TestClient {
    pub async fn send(&self, app: &TestApp, event: ClientEvent) {
        app.relay.submit(self.handle.clone(), event).await.unwrap();
    }

    /// Next pushed event, failing the test after one second
    pub async fn next_event(&mut self) -> ServerEvent {
        tokio::time::timeout(Duration::from_secs(1), self.events.recv())
            .await
            .expect("timed out waiting for event")
            .expect("connection channel closed")
    }

    /// Assert nothing is queued once the relay has drained its backlog
    pub async fn assert_no_event(&mut self, app: &TestApp) {
        app.relay.stats().await.unwrap();
        assert!(self.events.try_recv().is_err(), "unexpected event queued");
    }
}
