//! Session struct definition
//!
//! Represents one client connection: its identity, negotiated username,
//! membership flag, and the write half of the stream.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use crate::error::SendError;
use crate::message::ServerMessage;
use crate::types::{ClientId, Username};

/// Per-connection session state
///
/// The write half is behind a mutex because two independent writers
/// target the same connection: the session's own chat-relay task and the
/// coordinator's broadcast path. The read half never goes through here;
/// it belongs to the session's [`LineFramer`](crate::framer::LineFramer).
pub struct Session {
    /// Unique identifier for this session
    id: ClientId,
    /// Username, set exactly once by the coordinator on admission
    username: OnceLock<Username>,
    /// True only while the coordinator counts this session as a room member
    connected: AtomicBool,
    /// Write half of the connection, serialized across writers
    writer: Mutex<Box<dyn AsyncWrite + Send + Unpin>>,
}

impl Session {
    /// Create a session around the write half of a connection
    pub fn new(id: ClientId, writer: impl AsyncWrite + Send + Unpin + 'static) -> Self {
        Self {
            id,
            username: OnceLock::new(),
            connected: AtomicBool::new(false),
            writer: Mutex::new(Box::new(writer)),
        }
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    /// Send one protocol line to this client
    ///
    /// Appends the `\n` terminator and writes under the session's write
    /// lock. A failure means the peer is gone and the caller should treat
    /// this session as disconnected.
    pub async fn send(&self, msg: &ServerMessage) -> Result<(), SendError> {
        self.send_line(&msg.to_string()).await
    }

    /// Send an already-formatted line (terminator appended here)
    pub(crate) async fn send_line(&self, line: &str) -> Result<(), SendError> {
        let mut writer = self.writer.lock().await;
        writer
            .write_all(line.as_bytes())
            .await
            .map_err(|_| SendError::ConnectionClosed)?;
        writer
            .write_all(b"\n")
            .await
            .map_err(|_| SendError::ConnectionClosed)?;
        writer.flush().await.map_err(|_| SendError::ConnectionClosed)
    }

    /// Shut down the write half, signalling the peer we are done
    pub async fn close(&self) {
        let mut writer = self.writer.lock().await;
        let _ = writer.shutdown().await;
    }

    /// Set the negotiated username
    ///
    /// Returns false if a username was already set; a session's name is
    /// immutable once negotiated.
    pub fn set_username(&self, username: Username) -> bool {
        self.username.set(username).is_ok()
    }

    /// The negotiated username, if negotiation completed
    pub fn username(&self) -> Option<&Username> {
        self.username.get()
    }

    /// Check whether the coordinator has admitted this session
    pub fn is_member(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    /// Mark admission into / removal from the room (coordinator only)
    pub(crate) fn set_member(&self, connected: bool) {
        self.connected.store(connected, Ordering::Relaxed);
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("username", &self.username.get())
            .field("connected", &self.is_member())
            .finish_non_exhaustive()
    }
}
