//! Room coordinator actor
//!
//! The single serialization point for all membership mutations. Events
//! arrive over an mpsc queue and are processed strictly one at a time,
//! so admission checks, room mutation, and the notices they trigger can
//! never interleave across sessions.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use crate::message::ServerMessage;
use crate::room::Room;
use crate::session::Session;
use crate::types::{ClientId, Username};

/// Verdict on a join request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Admitted; the session is now a room member
    Accepted,
    /// Turned away; the rejection line was sent and the connection closed
    Rejected,
}

/// Events sent from connection handlers to the coordinator
#[derive(Debug)]
pub enum RoomEvent {
    /// A connection submitted a syntactically valid username
    Connected {
        session: Arc<Session>,
        username: Username,
        reply: oneshot::Sender<JoinOutcome>,
    },
    /// A connection is gone (EOF, read error, or failed delivery)
    Disconnected { id: ClientId },
}

/// The room coordinator actor
///
/// Owns admission and removal. Everything membership-visible that the
/// server emits (welcome, roster, join and leave notices) is written
/// while the coordinator holds exclusive processing of one event.
pub struct Coordinator {
    room: Arc<Room>,
    events: mpsc::Receiver<RoomEvent>,
}

impl Coordinator {
    /// Create a coordinator over the shared room and its event queue
    pub fn new(room: Arc<Room>, events: mpsc::Receiver<RoomEvent>) -> Self {
        Self { room, events }
    }

    /// Run the coordinator event loop
    ///
    /// Continuously receives and processes events until all senders are
    /// dropped.
    pub async fn run(mut self) {
        info!("Room coordinator started");

        while let Some(event) = self.events.recv().await {
            self.handle_event(event).await;
        }

        info!("Room coordinator shutting down");
    }

    /// Process a single event
    async fn handle_event(&mut self, event: RoomEvent) {
        match event {
            RoomEvent::Connected {
                session,
                username,
                reply,
            } => {
                self.handle_join(session, username, reply).await;
            }
            RoomEvent::Disconnected { id } => {
                let failed = self.handle_disconnect(id).await;
                self.drain_failures(failed).await;
            }
        }
    }

    /// Handle a join request: the uniqueness check is decided here
    async fn handle_join(
        &mut self,
        session: Arc<Session>,
        username: Username,
        reply: oneshot::Sender<JoinOutcome>,
    ) {
        if self.room.contains_username(&username).await {
            info!(
                "Client {} rejected: username '{}' already taken",
                session.id(),
                username
            );
            let _ = session.send(&ServerMessage::UsernameTaken).await;
            session.close().await;
            let _ = reply.send(JoinOutcome::Rejected);
            return;
        }

        if !session.set_username(username.clone()) {
            // A session negotiates exactly once; a second Connected event
            // for the same session is a contract violation.
            error!(
                "Client {} submitted a second username after negotiating",
                session.id()
            );
            session.close().await;
            let _ = reply.send(JoinOutcome::Rejected);
            return;
        }

        // Roster snapshot before the new member becomes visible, so it
        // never lists itself.
        let roster = self.room.usernames().await;

        session.set_member(true);
        self.room.insert(Arc::clone(&session)).await;
        info!("Client {} joined the room as '{}'", session.id(), username);

        let mut failed = Vec::new();

        let greeting = [
            ServerMessage::Welcome {
                username: username.clone(),
            },
            ServerMessage::Roster { usernames: roster },
        ];
        for msg in &greeting {
            if session.send(msg).await.is_err() {
                failed.push(session.id());
                break;
            }
        }

        let notice = ServerMessage::Joined { username };
        failed.extend(self.room.broadcast(&notice, Some(session.id())).await);

        let _ = reply.send(JoinOutcome::Accepted);
        self.drain_failures(failed).await;
    }

    /// Remove a session and notify the remaining members
    ///
    /// Returns the ids whose leave-notice delivery failed. Unknown ids
    /// are a no-op: duplicate disconnect signals for one session are
    /// expected (its reader task and a failed broadcast can both report).
    async fn handle_disconnect(&mut self, id: ClientId) -> Vec<ClientId> {
        let Some(session) = self.room.remove(id).await else {
            debug!("Disconnect for {} ignored (not a member)", id);
            return Vec::new();
        };

        session.set_member(false);
        session.close().await;

        let Some(username) = session.username().cloned() else {
            // Members always carry a negotiated name; this is an
            // invariant break, not a runtime condition.
            error!("Removed member {} had no negotiated username", id);
            return Vec::new();
        };

        info!("Client {} ('{}') left the room", id, username);
        let notice = ServerMessage::Disconnected { username };
        self.room.broadcast(&notice, None).await
    }

    /// Process failed deliveries as disconnects until none remain
    async fn drain_failures(&mut self, mut failed: Vec<ClientId>) {
        while let Some(id) = failed.pop() {
            failed.extend(self.handle_disconnect(id).await);
        }
    }
}
