//! Per-connection handler
//!
//! Drives one accepted connection through its lifecycle: username
//! prompt, negotiation with the coordinator, chat relay, and the single
//! disconnect path shared by every way a connection can end.

use std::sync::Arc;

use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::coordinator::{JoinOutcome, RoomEvent};
use crate::error::AppError;
use crate::framer::LineFramer;
use crate::message::ServerMessage;
use crate::room::Room;
use crate::session::Session;
use crate::types::{ClientId, Username};

/// Handle a new TCP connection
///
/// Splits the stream into a framer (read side) and a session (write
/// side), negotiates the username through the coordinator, then relays
/// chat lines until the peer goes away.
pub async fn handle_connection(
    stream: TcpStream,
    room: Arc<Room>,
    events: mpsc::Sender<RoomEvent>,
) -> Result<(), AppError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    let (read_half, write_half) = stream.into_split();
    let session = Arc::new(Session::new(ClientId::new(), write_half));
    let mut framer = LineFramer::new(read_half);

    debug!("Client {} connected from {}", session.id(), peer_addr);

    session.send(&ServerMessage::UsernamePrompt).await?;

    match negotiate_username(&session, &mut framer, &events).await? {
        JoinOutcome::Accepted => {}
        // The coordinator (or the syntax check) already sent the
        // rejection line and closed the write half.
        JoinOutcome::Rejected => return Ok(()),
    }

    relay_chat(&session, &mut framer, &room, &events).await;

    // The one disconnect path: EOF, read errors, and oversize lines all
    // land here.
    let _ = events
        .send(RoomEvent::Disconnected { id: session.id() })
        .await;

    info!("Client {} disconnected", session.id());
    Ok(())
}

/// Read the first line and submit it to the coordinator as a join request
///
/// The syntax check happens locally; the coordinator's uniqueness check
/// is the final authority on admission.
async fn negotiate_username(
    session: &Arc<Session>,
    framer: &mut LineFramer<OwnedReadHalf>,
    events: &mpsc::Sender<RoomEvent>,
) -> Result<JoinOutcome, AppError> {
    let Some(candidate) = framer.next_line().await else {
        debug!("Client {} hung up before naming itself", session.id());
        return Ok(JoinOutcome::Rejected);
    };

    let username = match Username::parse(&candidate) {
        Ok(username) => username,
        Err(e) => {
            warn!("Client {}: {}", session.id(), e);
            let _ = session.send(&ServerMessage::InvalidUsername).await;
            session.close().await;
            return Ok(JoinOutcome::Rejected);
        }
    };

    let (reply_tx, reply_rx) = oneshot::channel();
    events
        .send(RoomEvent::Connected {
            session: Arc::clone(session),
            username,
            reply: reply_tx,
        })
        .await
        .map_err(|_| AppError::CoordinatorClosed)?;

    reply_rx.await.map_err(|_| AppError::CoordinatorClosed)
}

/// Broadcast each non-empty line to every other member
///
/// Goes straight at the room's read view rather than through the event
/// queue; membership is already settled for this session and chat lines
/// only need per-sender ordering.
async fn relay_chat(
    session: &Arc<Session>,
    framer: &mut LineFramer<OwnedReadHalf>,
    room: &Arc<Room>,
    events: &mpsc::Sender<RoomEvent>,
) {
    // Settled at admission; relaying without a name would be a bug.
    let Some(username) = session.username().cloned() else {
        return;
    };

    while let Some(line) = framer.next_line().await {
        // The coordinator can evict us mid-stream (failed delivery).
        if !session.is_member() {
            break;
        }

        // Blank chat lines are a no-op, not an error.
        if line.is_empty() {
            continue;
        }

        let msg = ServerMessage::Chat {
            from: username.clone(),
            text: line,
        };
        for id in room.broadcast(&msg, Some(session.id())).await {
            let _ = events.send(RoomEvent::Disconnected { id }).await;
        }
    }
}
