//! Line-Oriented TCP Chat Room Library
//!
//! A chat room server over plain TCP: clients connect, submit a username
//! as their first line, and exchange newline-terminated text broadcast to
//! every other member.
//!
//! # Features
//! - Username negotiation with strict uniqueness (no auto-suffixing)
//! - Join and leave notices with a roster line for new members
//! - Best-effort chat fan-out that never echoes a line to its sender
//! - Bounded line framing that tolerates partial reads
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `Coordinator` is the single consumer of all membership events, so
//!   admission, removal, and their notices are totally ordered
//! - Each connection has a handler task owning a `LineFramer` (read side)
//!   and a `Session` (write side, mutex-serialized)
//! - Chat lines bypass the event queue: relay tasks fan out against the
//!   room's read view, ordered only per-sender
//!
//! # Example
//! ```ignore
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//! use tokio::sync::mpsc;
//! use chat_room::{handle_connection, Coordinator, Room};
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = TcpListener::bind("127.0.0.1:8080").await.unwrap();
//!     let room = Arc::new(Room::new());
//!     let (event_tx, event_rx) = mpsc::channel(256);
//!
//!     tokio::spawn(Coordinator::new(Arc::clone(&room), event_rx).run());
//!
//!     while let Ok((stream, _)) = listener.accept().await {
//!         let room = Arc::clone(&room);
//!         let event_tx = event_tx.clone();
//!         tokio::spawn(handle_connection(stream, room, event_tx));
//!     }
//! }
//! ```

pub mod coordinator;
pub mod error;
pub mod framer;
pub mod handler;
pub mod message;
pub mod room;
pub mod session;
pub mod types;

// Re-export main types for convenience
pub use coordinator::{Coordinator, JoinOutcome, RoomEvent};
pub use error::{AppError, SendError};
pub use framer::LineFramer;
pub use handler::handle_connection;
pub use message::ServerMessage;
pub use room::Room;
pub use session::Session;
pub use types::{ClientId, Username};
