//! Cloneable front door to the relay event loop.

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::error::RelayError;
use super::events::{ClientEvent, RelayedMessage};
use super::presence::ConnectionHandle;
use super::service::{RelayCommand, RelayService, RelayStats};

/// Submits commands to the single task that owns relay state.
///
/// Every method fails with [`RelayError::NotRunning`] once the event loop is
/// gone; there is no silent no-op.
#[derive(Debug, Clone)]
pub struct RelayHandle {
    commands: mpsc::Sender<RelayCommand>,
}

impl RelayHandle {
    /// Start the event loop for `service` with a bounded command queue.
    pub fn spawn(service: RelayService, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let task = tokio::spawn(service.run(rx));
        (Self { commands: tx }, task)
    }

    /// Forward an inbound client event.
    pub async fn submit(&self, connection: ConnectionHandle, event: ClientEvent) -> Result<(), RelayError> {
        self.send(RelayCommand::Inbound { connection, event }).await
    }

    /// Push a message to its participants. Without an `origin` the echo goes
    /// to the sender's registered connection.
    pub async fn deliver(&self, message: RelayedMessage, origin: Option<ConnectionHandle>) -> Result<(), RelayError> {
        self.send(RelayCommand::Deliver { message, origin }).await
    }

    pub async fn disconnect(&self, connection: ConnectionHandle) -> Result<(), RelayError> {
        self.send(RelayCommand::Disconnect { connection }).await
    }

    pub async fn stats(&self) -> Result<RelayStats, RelayError> {
        let (reply, rx) = oneshot::channel();
        self.send(RelayCommand::Stats { reply }).await?;
        rx.await.map_err(|_| RelayError::NotRunning)
    }

    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }

    async fn send(&self, command: RelayCommand) -> Result<(), RelayError> {
        self.commands.send(command).await.map_err(|_| RelayError::NotRunning)
    }
}
