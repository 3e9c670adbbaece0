//! Relay error taxonomy.

/// Failures of a single relay operation.
///
/// Everything except `NotRunning` is a per-event condition: it is reported or
/// logged and the relay keeps going.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelayError {
    /// The peer a call event addresses has no live connection
    #[error("User {0} is offline")]
    TargetOffline(String),

    /// The receiver already has a ringing or ongoing call
    #[error("User {0} is already in a call")]
    PeerBusy(String),

    /// Signal payload is not an SDP offer/answer or ICE candidate
    #[error("Malformed signal payload ({0})")]
    MalformedSignal(&'static str),

    #[error("Invalid request: {0}")]
    InvalidRequest(&'static str),

    /// The relay event loop is not accepting commands
    #[error("Relay is not running")]
    NotRunning,
}

impl RelayError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::TargetOffline(_) => "offline",
            RelayError::PeerBusy(_) => "busy",
            RelayError::MalformedSignal(_) => "malformed",
            RelayError::InvalidRequest(_) => "invalid",
            RelayError::NotRunning => "not_running",
        }
    }
}
