pub mod config;
pub mod error;
pub mod payload;
pub mod request;
pub mod session;
pub mod transport;

pub use error::{ConfigError, TransportError};
pub use payload::PresencePayload;
pub use request::{PresenceRequest, DEFAULT_LARGE_IMAGE, DEFAULT_SMALL_IMAGE};
pub use session::{Session, SessionEvent, SessionManager, SessionState};
pub use transport::{IpcConnector, IpcTransport, SocketConnector, SocketTransport};
