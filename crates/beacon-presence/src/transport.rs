//! The local IPC boundary to the chat client.
//!
//! The session manager only depends on the [`IpcConnector`] / [`IpcTransport`]
//! traits; [`SocketConnector`] is the shipped implementation, a blocking
//! newline-delimited JSON client over a Unix domain socket (TCP localhost on
//! Windows). Blocking I/O with timeouts keeps a dead remote from hanging a
//! send; all methods are designed to be called from `spawn_blocking`.

use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::TransportError;
use crate::payload::PresencePayload;

#[cfg(unix)]
use std::os::unix::net::UnixStream;

#[cfg(windows)]
use std::net::TcpStream;

/// Opens the local channel to the chat client for a given application id.
///
/// `open` may block while the channel and handshake are established; callers
/// driving a UI must run it off the event thread.
pub trait IpcConnector: Send + Sync {
    type Transport: IpcTransport;

    fn open(&self, application_id: &str) -> Result<Self::Transport, TransportError>;
}

/// An established channel. `send` and `clear` must report an error rather
/// than hang when the remote end has silently gone away.
pub trait IpcTransport: Send {
    /// Publish a payload, replacing whatever is currently displayed.
    fn send(&mut self, payload: &PresencePayload) -> Result<(), TransportError>;

    /// Remove any currently published presence without closing the channel.
    fn clear(&mut self) -> Result<(), TransportError>;

    /// Best-effort shutdown; the remote side may already be gone.
    fn close(&mut self);
}

/// Request frame to the chat client bridge (newline-delimited JSON).
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
enum WireRequest {
    /// First frame on a fresh channel; scopes the session to an application.
    Handshake { application_id: String },
    /// Replace the displayed presence.
    SetPresence { payload: PresencePayload },
    /// Remove the displayed presence.
    ClearPresence,
}

/// Response frame from the bridge.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
enum WireResponse {
    Ok,
    Error { message: String },
}

const READ_TIMEOUT: Duration = Duration::from_secs(10);
const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

#[cfg(windows)]
const BRIDGE_TCP_PORT: u16 = 19285;

/// The default bridge socket path: `$BEACON_SOCKET` if set, else a
/// well-known name in the temp directory.
pub fn default_socket_path() -> PathBuf {
    std::env::var_os("BEACON_SOCKET")
        .map_or_else(|| std::env::temp_dir().join("beacon-bridge.sock"), PathBuf::from)
}

/// Connects [`SocketTransport`]s to the chat client bridge.
pub struct SocketConnector {
    socket_path: PathBuf,
}

impl SocketConnector {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
        }
    }

    /// Connector for the default bridge socket.
    pub fn from_env() -> Self {
        Self::new(default_socket_path())
    }
}

impl IpcConnector for SocketConnector {
    type Transport = SocketTransport;

    fn open(&self, application_id: &str) -> Result<SocketTransport, TransportError> {
        let mut transport = SocketTransport::connect(&self.socket_path)?;
        let handshake = WireRequest::Handshake {
            application_id: application_id.to_string(),
        };
        match transport.round_trip(&handshake) {
            Ok(WireResponse::Ok) => Ok(transport),
            Ok(WireResponse::Error { message }) => Err(TransportError::Rejected(message)),
            // A channel that dies mid-handshake is a failed open, not a failed send.
            Err(TransportError::Send(cause)) => {
                Err(TransportError::Connect(format!("handshake: {cause}")))
            }
            Err(other) => Err(other),
        }
    }
}

/// Synchronous channel to the chat client bridge.
///
/// On Unix: a Unix domain socket. On Windows: TCP localhost (the bridge
/// listens on a fixed local port; the socket path is ignored).
pub struct SocketTransport {
    #[cfg(unix)]
    stream: BufReader<UnixStream>,
    #[cfg(windows)]
    stream: BufReader<TcpStream>,
}

impl SocketTransport {
    #[cfg(unix)]
    fn connect(socket_path: &Path) -> Result<Self, TransportError> {
        let stream = UnixStream::connect(socket_path).map_err(|e| {
            TransportError::Connect(format!(
                "bridge socket at {}: {e}",
                socket_path.display()
            ))
        })?;
        stream
            .set_read_timeout(Some(READ_TIMEOUT))
            .map_err(|e| TransportError::Connect(format!("set read timeout: {e}")))?;
        stream
            .set_write_timeout(Some(WRITE_TIMEOUT))
            .map_err(|e| TransportError::Connect(format!("set write timeout: {e}")))?;

        Ok(Self {
            stream: BufReader::new(stream),
        })
    }

    #[cfg(windows)]
    fn connect(_socket_path: &Path) -> Result<Self, TransportError> {
        let addr = format!("127.0.0.1:{BRIDGE_TCP_PORT}");
        let stream = TcpStream::connect(&addr)
            .map_err(|e| TransportError::Connect(format!("bridge at {addr}: {e}")))?;
        stream
            .set_read_timeout(Some(READ_TIMEOUT))
            .map_err(|e| TransportError::Connect(format!("set read timeout: {e}")))?;
        stream
            .set_write_timeout(Some(WRITE_TIMEOUT))
            .map_err(|e| TransportError::Connect(format!("set write timeout: {e}")))?;

        Ok(Self {
            stream: BufReader::new(stream),
        })
    }

    /// Write one request frame and read one response frame.
    fn round_trip(&mut self, request: &WireRequest) -> Result<WireResponse, TransportError> {
        let mut buf = serde_json::to_vec(request)
            .map_err(|e| TransportError::Send(format!("serialize frame: {e}")))?;
        buf.push(b'\n');

        self.stream
            .get_mut()
            .write_all(&buf)
            .map_err(|e| TransportError::Send(format!("write to bridge: {e}")))?;

        let mut line = String::new();
        let read = self
            .stream
            .read_line(&mut line)
            .map_err(|e| TransportError::Send(format!("read from bridge: {e}")))?;
        if read == 0 {
            return Err(TransportError::Send("bridge closed the channel".to_string()));
        }

        serde_json::from_str(line.trim())
            .map_err(|e| TransportError::Send(format!("parse bridge response: {e}")))
    }
}

impl IpcTransport for SocketTransport {
    fn send(&mut self, payload: &PresencePayload) -> Result<(), TransportError> {
        let frame = WireRequest::SetPresence {
            payload: payload.clone(),
        };
        match self.round_trip(&frame)? {
            WireResponse::Ok => Ok(()),
            WireResponse::Error { message } => Err(TransportError::Rejected(message)),
        }
    }

    fn clear(&mut self) -> Result<(), TransportError> {
        match self.round_trip(&WireRequest::ClearPresence)? {
            WireResponse::Ok => Ok(()),
            WireResponse::Error { message } => Err(TransportError::Rejected(message)),
        }
    }

    fn close(&mut self) {
        if let Err(e) = self.stream.get_ref().shutdown(std::net::Shutdown::Both) {
            tracing::debug!(error = %e, "bridge socket shutdown failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handshake_frame_shape() {
        let frame = WireRequest::Handshake {
            application_id: "12345".to_string(),
        };
        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "method": "Handshake",
                "params": { "application_id": "12345" }
            })
        );
    }

    #[test]
    fn clear_frame_has_no_params() {
        let value = serde_json::to_value(WireRequest::ClearPresence).unwrap();
        assert_eq!(value, serde_json::json!({ "method": "ClearPresence" }));
    }

    #[test]
    fn error_response_parses() {
        let response: WireResponse =
            serde_json::from_str(r#"{"type": "Error", "data": {"message": "bad id"}}"#).unwrap();
        assert!(matches!(response, WireResponse::Error { message } if message == "bad id"));
    }

    #[test]
    fn ok_response_parses() {
        let response: WireResponse = serde_json::from_str(r#"{"type": "Ok"}"#).unwrap();
        assert!(matches!(response, WireResponse::Ok));
    }
}
