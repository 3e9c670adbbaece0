//! Application Startup
//!
//! Application building and server initialization.

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;

use crate::application::relay::{CallRecorder, RelayHandle, RelayService};
use crate::application::services::{CallService, CallServiceImpl, MessageService, MessageServiceImpl};
use crate::config::Settings;
use crate::domain::{CallRepository, MessageRepository};
use crate::infrastructure::database;
use crate::infrastructure::repositories::{PgCallRepository, PgMessageRepository};
use crate::presentation::http::{handlers, routes};
use crate::presentation::middleware::{create_cors_layer, create_trace_layer};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub messages: Arc<dyn MessageService>,
    pub calls: Arc<dyn CallService>,
    pub relay: RelayHandle,
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Wire services over the given repositories
    pub fn new(
        message_repo: Arc<dyn MessageRepository>,
        call_repo: Arc<dyn CallRepository>,
        relay: RelayHandle,
        settings: Settings,
    ) -> Self {
        Self {
            messages: Arc::new(MessageServiceImpl::new(message_repo)),
            calls: Arc::new(CallServiceImpl::new(call_repo)),
            relay,
            settings: Arc::new(settings),
        }
    }
}

/// Start the relay event loop and its call history writer.
///
/// Returns the handle plus the event loop task; the writer stops on its own
/// once the relay (and with it the recorder) is dropped.
pub fn spawn_relay(call_repo: Arc<dyn CallRepository>, settings: &Settings) -> (RelayHandle, JoinHandle<()>) {
    let (recorder, _writer) = CallRecorder::spawn(call_repo);
    RelayHandle::spawn(RelayService::new(recorder), settings.relay.command_queue_capacity)
}

/// Full router with HTTP middleware applied
pub fn build_router(state: AppState) -> Router {
    let cors = create_cors_layer(&state.settings.cors);
    routes::create_router(state).layer(ServiceBuilder::new().layer(create_trace_layer()).layer(cors))
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
    relay_task: JoinHandle<()>,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        handlers::health::init_server_start();

        // Create database pool
        let db = database::create_pool(&settings.database)
            .await
            .context("Failed to connect to database")?;
        tracing::info!("Database connection pool created");

        if settings.database.run_migrations {
            database::run_migrations(&db).await.context("Failed to run migrations")?;
            tracing::info!("Database migrations applied");
        }

        let message_repo: Arc<dyn MessageRepository> = Arc::new(PgMessageRepository::new(db.clone()));
        let call_repo: Arc<dyn CallRepository> = Arc::new(PgCallRepository::new(db));

        // Relay must be running before the listener accepts sockets
        let (relay, relay_task) = spawn_relay(call_repo.clone(), &settings);
        tracing::info!(
            queue_capacity = settings.relay.command_queue_capacity,
            "Relay event loop started"
        );

        let state = AppState::new(message_repo, call_repo, relay, settings.clone());
        let router = build_router(state);

        // Bind to address
        let addr = settings.server.socket_addr().context("Invalid server address")?;
        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Listening on {}", addr);

        Ok(Self {
            listener,
            router,
            relay_task,
        })
    }

    /// Run the server until stopped
    ///
    /// The relay ending on its own is fatal: the server stops with it.
    pub async fn run_until_stopped(self) -> Result<()> {
        let server = axum::serve(self.listener, self.router).into_future();

        tokio::select! {
            result = server => {
                result?;
                Ok(())
            }
            outcome = self.relay_task => {
                match outcome {
                    Ok(()) => Err(anyhow!("Relay event loop stopped unexpectedly")),
                    Err(e) => Err(anyhow!("Relay event loop failed: {e}")),
                }
            }
        }
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}
