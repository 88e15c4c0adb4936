//! Room struct definition
//!
//! The membership collection: every admitted session, keyed by client id,
//! plus the best-effort broadcaster that fans one line out to members.
//!
//! Mutation (insert/remove) is crate-private and happens only on the
//! coordinator task; chat-relay tasks only ever take the read side to fan
//! out, which is what keeps membership changes race-free without any
//! locking between reader tasks.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::join_all;
use tokio::sync::RwLock;

use crate::message::ServerMessage;
use crate::session::Session;
use crate::types::{ClientId, Username};

/// Current chat room membership
///
/// Iteration order is arbitrary and not stable across removals; the only
/// guarantee is "contains exactly the current members".
#[derive(Debug, Default)]
pub struct Room {
    members: RwLock<HashMap<ClientId, Arc<Session>>>,
}

impl Room {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of current members
    pub async fn len(&self) -> usize {
        self.members.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.members.read().await.is_empty()
    }

    /// Check whether a member already holds this exact username
    pub async fn contains_username(&self, username: &Username) -> bool {
        self.members
            .read()
            .await
            .values()
            .any(|session| session.username() == Some(username))
    }

    /// Usernames of all current members, in arbitrary order
    pub async fn usernames(&self) -> Vec<Username> {
        self.members
            .read()
            .await
            .values()
            .filter_map(|session| session.username().cloned())
            .collect()
    }

    /// Add an admitted session (coordinator only)
    pub(crate) async fn insert(&self, session: Arc<Session>) {
        self.members.write().await.insert(session.id(), session);
    }

    /// Remove a session, returning it if it was a member (coordinator only)
    ///
    /// Removing an id that is not present is a no-op, so duplicate
    /// disconnect signals for the same session are harmless.
    pub(crate) async fn remove(&self, id: ClientId) -> Option<Arc<Session>> {
        self.members.write().await.remove(&id)
    }

    /// Fan one line out to every member except `exclude`
    ///
    /// Best-effort: a failed delivery never aborts the rest of the
    /// fan-out. Returns the ids whose delivery failed so the caller can
    /// schedule their disconnects.
    ///
    /// Targets are snapshotted and the lock released before any write is
    /// awaited: a member whose peer has stopped reading can stall its own
    /// delivery, but never membership changes.
    pub async fn broadcast(&self, msg: &ServerMessage, exclude: Option<ClientId>) -> Vec<ClientId> {
        let line = msg.to_string();
        let targets: Vec<Arc<Session>> = self
            .members
            .read()
            .await
            .values()
            .filter(|session| Some(session.id()) != exclude)
            .map(Arc::clone)
            .collect();

        let deliveries = targets.iter().map(|session| {
            let line = line.as_str();
            async move { (session.id(), session.send_line(line).await) }
        });

        join_all(deliveries)
            .await
            .into_iter()
            .filter_map(|(id, result)| result.err().map(|_| id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::io::{AsyncBufReadExt, BufReader, DuplexStream};
    use tokio::time::{timeout, Duration};

    fn name(s: &str) -> Username {
        Username::parse(s).unwrap()
    }

    async fn member(username: &str) -> (Arc<Session>, BufReader<DuplexStream>) {
        let (client, server) = tokio::io::duplex(1024);
        let session = Arc::new(Session::new(ClientId::new(), server));
        session.set_username(name(username));
        session.set_member(true);
        (session, BufReader::new(client))
    }

    async fn read_line(reader: &mut BufReader<DuplexStream>) -> String {
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        line.trim_end().to_string()
    }

    #[tokio::test]
    async fn test_insert_and_remove() {
        let room = Room::new();
        let (alice, _alice_rx) = member("alice").await;
        let id = alice.id();

        room.insert(alice).await;
        assert_eq!(room.len().await, 1);
        assert!(room.contains_username(&name("alice")).await);

        let removed = room.remove(id).await;
        assert!(removed.is_some());
        assert!(room.is_empty().await);

        // Idempotent - a second removal finds nothing
        assert!(room.remove(id).await.is_none());
    }

    #[tokio::test]
    async fn test_username_lookup_is_case_sensitive() {
        let room = Room::new();
        let (alice, _rx) = member("alice").await;
        room.insert(alice).await;

        assert!(room.contains_username(&name("alice")).await);
        assert!(!room.contains_username(&name("Alice")).await);
    }

    #[tokio::test]
    async fn test_roster_lists_all_members() {
        let room = Room::new();
        let (alice, _a) = member("alice").await;
        let (bob, _b) = member("bob").await;
        room.insert(alice).await;
        room.insert(bob).await;

        let mut names = room.usernames().await;
        names.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        assert_eq!(names, vec![name("alice"), name("bob")]);
    }

    #[tokio::test]
    async fn test_broadcast_excludes_sender() {
        let room = Room::new();
        let (alice, mut alice_rx) = member("alice").await;
        let (bob, mut bob_rx) = member("bob").await;
        let (carol, _carol_session) = member("carol").await;
        let sender_id = carol.id();
        room.insert(alice).await;
        room.insert(bob).await;
        room.insert(carol).await;

        let msg = ServerMessage::Chat {
            from: name("carol"),
            text: "hi all".to_string(),
        };
        let failed = room.broadcast(&msg, Some(sender_id)).await;
        assert!(failed.is_empty());

        assert_eq!(read_line(&mut alice_rx).await, "[carol] hi all");
        assert_eq!(read_line(&mut bob_rx).await, "[carol] hi all");
    }

    #[tokio::test]
    async fn test_broadcast_survives_dead_member() {
        let room = Room::new();
        let (alice, mut alice_rx) = member("alice").await;
        let (bob, bob_rx) = member("bob").await;
        let bob_id = bob.id();
        room.insert(alice).await;
        room.insert(bob).await;

        // Bob's peer hangs up; delivery to him must fail without
        // stopping delivery to alice.
        drop(bob_rx);

        let msg = ServerMessage::Joined { username: name("carol") };
        let failed = room.broadcast(&msg, None).await;

        assert_eq!(failed, vec![bob_id]);
        assert_eq!(read_line(&mut alice_rx).await, "* carol just joined!");
    }

    #[tokio::test]
    async fn test_stalled_member_does_not_block_membership_changes() {
        let room = Arc::new(Room::new());

        // A member whose peer never reads; the tiny buffer wedges the
        // very first write to it.
        let (_stalled_peer, server) = tokio::io::duplex(16);
        let stalled = Arc::new(Session::new(ClientId::new(), server));
        stalled.set_username(name("slowpoke"));
        stalled.set_member(true);
        room.insert(stalled).await;

        let broadcaster = Arc::clone(&room);
        let fanout = tokio::spawn(async move {
            let msg = ServerMessage::Chat {
                from: name("alice"),
                text: "x".repeat(1024),
            };
            broadcaster.broadcast(&msg, None).await
        });

        // The wedged delivery must not hold the membership lock: inserts
        // and removals go through while the fan-out is stuck.
        let (joiner, _joiner_rx) = member("joiner").await;
        let joiner_id = joiner.id();
        timeout(Duration::from_secs(1), room.insert(joiner))
            .await
            .expect("insert blocked behind a stalled delivery");
        assert_eq!(room.len().await, 2);

        timeout(Duration::from_secs(1), room.remove(joiner_id))
            .await
            .expect("remove blocked behind a stalled delivery")
            .unwrap();

        fanout.abort();
    }
}
