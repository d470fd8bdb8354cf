//! Presence session lifecycle: connect, publish, disconnect.
//!
//! One manager owns at most one transport handle. Operations serialize on an
//! internal lock so two threads can never write to the same handle, and every
//! operation reports its outcome as a [`SessionEvent`] value rather than an
//! `Err`. The caller (GUI or CLI) decides how to surface each kind.

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::error::TransportError;
use crate::payload::{self, PresencePayload};
use crate::request::PresenceRequest;
use crate::transport::{IpcConnector, IpcTransport};

/// Where the session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
    /// A connect attempt failed. Transitional: the manager resets to
    /// `Disconnected` before surfacing the event, so retry is allowed
    /// immediately.
    Failed,
}

/// Read-only snapshot of the manager's state, for display.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub state: SessionState,
    /// Set when a timestamped payload was published, cleared on disconnect.
    pub start_epoch_secs: Option<u64>,
    /// Last payload sent, for re-publish and status summaries.
    pub last_payload: Option<PresencePayload>,
}

/// Events streamed to the caller for display and logging.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "data")]
pub enum SessionEvent {
    Connected,
    ConnectError { cause: String },
    Published { payload: PresencePayload },
    PublishError { cause: String },
    Disconnected,
    ValidationError { field: String },
    InvalidStateError { attempted: String, current: SessionState },
}

struct SessionInner<T> {
    state: SessionState,
    transport: Option<T>,
    start_epoch_secs: Option<u64>,
    last_payload: Option<PresencePayload>,
    /// Bumped by every disconnect so a connect that lost the race can tell
    /// its freshly opened handle is stale and must not be adopted.
    generation: u64,
}

/// Owns the transport lifecycle and the active payload for one session.
pub struct SessionManager<C: IpcConnector> {
    connector: C,
    inner: Mutex<SessionInner<C::Transport>>,
    events: Mutex<Option<mpsc::UnboundedSender<SessionEvent>>>,
}

impl<C: IpcConnector> SessionManager<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            inner: Mutex::new(SessionInner {
                state: SessionState::Disconnected,
                transport: None,
                start_epoch_secs: None,
                last_payload: None,
                generation: 0,
            }),
            events: Mutex::new(None),
        }
    }

    /// Register a sink that receives a copy of every event, in operation
    /// order. Replaces any previously registered sink.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<SessionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.events.lock() = Some(tx);
        rx
    }

    /// Open the channel to the chat client. Does not publish anything:
    /// connect and publish are separate steps, matching the remote
    /// protocol's handshake-then-data shape.
    ///
    /// May block while the channel is established; run from `spawn_blocking`
    /// in async contexts. `disconnect` stays callable meanwhile.
    pub fn connect(&self, req: &PresenceRequest) -> SessionEvent {
        if req.application_id.trim().is_empty() {
            return self.emit(SessionEvent::ValidationError {
                field: "application_id".to_string(),
            });
        }

        let generation = {
            let mut inner = self.inner.lock();
            if inner.state != SessionState::Disconnected {
                let current = inner.state;
                return self.emit(SessionEvent::InvalidStateError {
                    attempted: "connect".to_string(),
                    current,
                });
            }
            inner.state = SessionState::Connecting;
            inner.generation
        };

        // Open outside the lock: it may block for a while, and a concurrent
        // disconnect must not have to wait for it.
        let opened = self.connector.open(&req.application_id);

        // The lock is held through the emit so events leave in the order the
        // operations resolved.
        let mut inner = self.inner.lock();
        match opened {
            Ok(mut transport) => {
                if inner.generation != generation {
                    // Disconnect won the race. Close the late handle, never
                    // adopt it; the session stays as the user left it.
                    transport.close();
                    tracing::debug!("connect result superseded by disconnect, handle closed");
                    return self.emit(SessionEvent::Disconnected);
                }
                inner.state = SessionState::Connected;
                inner.transport = Some(transport);
                self.emit(SessionEvent::Connected)
            }
            Err(e) => {
                if inner.generation == generation {
                    // `Failed` is transitional: reset right away so the user
                    // may retry without cooldown.
                    inner.state = SessionState::Disconnected;
                }
                self.emit(SessionEvent::ConnectError {
                    cause: e.to_string(),
                })
            }
        }
    }

    /// Build the payload for `req` at the current time and send it.
    ///
    /// Only valid while connected. A failed send leaves the session
    /// connected: a single failed update is recoverable, and retry policy
    /// belongs to the caller.
    pub fn publish(&self, req: &PresenceRequest) -> SessionEvent {
        if req.application_id.trim().is_empty() {
            return self.emit(SessionEvent::ValidationError {
                field: "application_id".to_string(),
            });
        }

        let mut inner = self.inner.lock();
        if inner.state != SessionState::Connected {
            let current = inner.state;
            return self.emit(SessionEvent::InvalidStateError {
                attempted: "publish".to_string(),
                current,
            });
        }

        let built = payload::build_now(req);
        let result = match inner.transport.as_mut() {
            Some(transport) => transport.send(&built),
            None => Err(TransportError::Send("no transport handle".to_string())),
        };

        match result {
            Ok(()) => {
                inner.start_epoch_secs = built.start;
                inner.last_payload = Some(built.clone());
                self.emit(SessionEvent::Published { payload: built })
            }
            Err(e) => self.emit(SessionEvent::PublishError {
                cause: e.to_string(),
            }),
        }
    }

    /// Tear the session down, from any state. Idempotent.
    ///
    /// Clear and close are best-effort: by the time disconnect is requested
    /// the remote state no longer matters to local correctness, so failures
    /// are logged and swallowed.
    pub fn disconnect(&self) -> SessionEvent {
        let mut inner = self.inner.lock();
        inner.generation += 1;
        inner.state = SessionState::Disconnected;
        inner.start_epoch_secs = None;
        inner.last_payload = None;

        if let Some(mut transport) = inner.transport.take() {
            if let Err(e) = transport.clear() {
                tracing::warn!(error = %e, "failed to clear presence on disconnect");
            }
            transport.close();
        }

        self.emit(SessionEvent::Disconnected)
    }

    /// Read-only snapshot for display.
    pub fn status(&self) -> Session {
        let inner = self.inner.lock();
        Session {
            state: inner.state,
            start_epoch_secs: inner.start_epoch_secs,
            last_payload: inner.last_payload.clone(),
        }
    }

    fn emit(&self, event: SessionEvent) -> SessionEvent {
        if let Some(tx) = self.events.lock().as_ref() {
            let _ = tx.send(event.clone());
        }
        event
    }
}
