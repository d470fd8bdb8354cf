use thiserror::Error;

/// Failures crossing the local IPC boundary.
///
/// These are environmental (the chat client may not be running or may have
/// closed mid-session); the session manager surfaces them as events and
/// never retries on its own.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to open local channel: {0}")]
    Connect(String),

    #[error("failed to send over local channel: {0}")]
    Send(String),

    #[error("remote endpoint rejected the request: {0}")]
    Rejected(String),
}

/// Failures reading or writing a persisted presence record.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("presence record is not valid JSON: {0}")]
    Format(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
