//! Error types for the chat server
//!
//! Defines application-level errors and line delivery errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Application-level errors
///
/// Covers fatal connection-handler errors and username protocol
/// violations. Every variant terminates at most the one connection it
/// occurred on.
#[derive(Debug, Error)]
pub enum AppError {
    /// The coordinator's event queue is gone (fatal - server shutting down)
    #[error("Coordinator event queue closed")]
    CoordinatorClosed,

    /// Username candidate failed the syntax check
    #[error("Invalid username: {0:?}")]
    InvalidUsername(String),

    /// Line delivery to the client failed
    #[error(transparent)]
    Send(#[from] SendError),
}

/// Line delivery errors
///
/// Occurs when writing to a connection whose peer is gone. Treated as an
/// implicit disconnect signal for the failing session.
#[derive(Debug, Error)]
pub enum SendError {
    /// The write half of the connection is closed
    #[error("Connection closed")]
    ConnectionClosed,
}
