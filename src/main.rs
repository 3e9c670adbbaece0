//! # Chat & Call Server
//!
//! Application entry point. Initializes:
//! - Tracing/logging subsystem
//! - Configuration loading (`.env`, config files, environment)
//! - Database connection pool and migrations
//! - Relay event loop
//! - HTTP/WebSocket server

use anyhow::Result;
use tracing::info;

use chat_call_server::config::Settings;
use chat_call_server::startup::Application;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignore errors if not found)
    let _ = dotenvy::dotenv();

    // Initialize tracing subscriber for structured logging
    chat_call_server::telemetry::init_tracing();

    info!("Starting Chat & Call Server...");

    // Load configuration from environment and config files
    let settings = Settings::load()?;
    info!(
        host = %settings.server.host,
        port = %settings.server.port,
        environment = %settings.environment,
        "Configuration loaded"
    );

    // Build and run the application
    let application = Application::build(settings).await?;

    info!("Server ready to accept connections");
    application.run_until_stopped().await?;

    Ok(())
}
