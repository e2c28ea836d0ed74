//! Connection registry for the game server
//!
//! This module tracks every live WebSocket session, including:
//! - Session lifecycle (register, unregister, idle sweep)
//! - Player ID assignment for new connections
//! - Outbound message queues for response routing
//! - Connection health tracking and automatic cleanup
//!
//! The registry is the single mapping between player IDs and transport
//! handles; game state itself lives in the world and never holds sockets.

use log::info;
use shared::PlayerId;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

/// A connected client session
///
/// Each session pairs a player ID with the transport-side handles needed
/// to reach that client: the peer address for logging and an unbounded
/// queue drained by the connection's writer task.
#[derive(Debug)]
pub struct Session {
    /// Player ID assigned at registration
    pub player_id: PlayerId,
    /// Network address the client connected from
    pub addr: SocketAddr,
    /// Queue of frames waiting to be written to the socket
    pub outbound: mpsc::UnboundedSender<Message>,
    /// When the session was registered
    pub connected_at: Instant,
    /// Last time we received any frame from this client
    pub last_seen: Instant,
}

impl Session {
    pub fn new(player_id: PlayerId, addr: SocketAddr, outbound: mpsc::UnboundedSender<Message>) -> Self {
        let now = Instant::now();
        Self {
            player_id,
            addr,
            outbound,
            connected_at: now,
            last_seen: now,
        }
    }

    /// Marks the session as recently active
    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    /// Returns true if no frames have arrived within `timeout`
    pub fn is_idle(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }

    /// Queues a frame for delivery. Returns false if the connection's
    /// writer task has already gone away.
    pub fn send(&self, message: Message) -> bool {
        self.outbound.send(message).is_ok()
    }
}

/// Tracks all connected sessions and assigns player IDs
///
/// The registry enforces the server's capacity limit and owns the only
/// copies of the per-session outbound queues. Player IDs start from 1
/// and are never reused within a server run, so a stale ID can always
/// be distinguished from a current one.
pub struct SessionRegistry {
    /// Live sessions indexed by player ID
    sessions: HashMap<PlayerId, Session>,
    /// Next player ID to hand out
    next_player_id: PlayerId,
    /// Maximum number of concurrent sessions allowed
    max_clients: usize,
}

impl SessionRegistry {
    pub fn new(max_clients: usize) -> Self {
        Self {
            sessions: HashMap::new(),
            next_player_id: 1,
            max_clients,
        }
    }

    /// Registers a new connection and assigns it a player ID
    ///
    /// Returns Some(player_id) if successful, None if the server is at
    /// capacity. The outbound sender is stored for response routing and
    /// dropped again when the session is unregistered.
    pub fn register(
        &mut self,
        addr: SocketAddr,
        outbound: mpsc::UnboundedSender<Message>,
    ) -> Option<PlayerId> {
        if self.is_full() {
            return None;
        }

        let player_id = self.next_player_id;
        self.next_player_id += 1;

        let session = Session::new(player_id, addr, outbound);
        info!("Player {} connected from {}", player_id, addr);
        self.sessions.insert(player_id, session);

        Some(player_id)
    }

    /// Removes a session. Returns true if it was present.
    ///
    /// Dropping the session also drops the registry's copy of the
    /// outbound sender, which lets the connection's writer task finish
    /// once the remaining queue has drained.
    pub fn unregister(&mut self, player_id: PlayerId) -> bool {
        if let Some(session) = self.sessions.remove(&player_id) {
            info!("Player {} disconnected ({})", session.player_id, session.addr);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, player_id: PlayerId) -> bool {
        self.sessions.contains_key(&player_id)
    }

    /// Refreshes the activity timestamp for a session
    pub fn touch(&mut self, player_id: PlayerId) {
        if let Some(session) = self.sessions.get_mut(&player_id) {
            session.touch();
        }
    }

    /// Queues a frame for one player. Returns false if the player is not
    /// connected or their writer task has exited.
    pub fn send_to(&self, player_id: PlayerId, message: Message) -> bool {
        self.sessions
            .get(&player_id)
            .map_or(false, |session| session.send(message))
    }

    /// Iterates over all live sessions
    pub fn sessions(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    /// Removes sessions that have been silent for longer than `timeout`
    ///
    /// Each evicted session is sent a close frame first so well-behaved
    /// clients learn they were dropped. Returns the evicted player IDs so
    /// the caller can clean up game state for them.
    pub fn sweep(&mut self, timeout: Duration) -> Vec<PlayerId> {
        let idle: Vec<PlayerId> = self
            .sessions
            .iter()
            .filter(|(_, session)| session.is_idle(timeout))
            .map(|(id, _)| *id)
            .collect();

        for player_id in &idle {
            if let Some(session) = self.sessions.get(player_id) {
                session.send(Message::Close(None));
            }
            self.unregister(*player_id);
        }

        idle
    }

    pub fn is_full(&self) -> bool {
        self.sessions.len() >= self.max_clients
    }

    /// Returns the number of currently connected sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns true if no sessions are currently connected
    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_addr() -> SocketAddr {
        "127.0.0.1:9001".parse().unwrap()
    }

    fn test_addr2() -> SocketAddr {
        "127.0.0.1:9002".parse().unwrap()
    }

    fn test_channel() -> (
        mpsc::UnboundedSender<Message>,
        mpsc::UnboundedReceiver<Message>,
    ) {
        mpsc::unbounded_channel()
    }

    #[test]
    fn test_session_starts_recently_active() {
        let (tx, _rx) = test_channel();
        let session = Session::new(1, test_addr(), tx);

        assert_eq!(session.player_id, 1);
        assert_eq!(session.addr, test_addr());
        assert!(!session.is_idle(Duration::from_secs(1)));
    }

    #[test]
    fn test_session_idle_detection() {
        let (tx, _rx) = test_channel();
        let mut session = Session::new(1, test_addr(), tx);

        session.last_seen = Instant::now() - Duration::from_secs(2);
        assert!(session.is_idle(Duration::from_secs(1)));

        session.touch();
        assert!(!session.is_idle(Duration::from_secs(1)));
    }

    #[test]
    fn test_register_assigns_sequential_ids() {
        let mut registry = SessionRegistry::new(4);

        let (tx1, _rx1) = test_channel();
        let (tx2, _rx2) = test_channel();

        assert_eq!(registry.register(test_addr(), tx1), Some(1));
        assert_eq!(registry.register(test_addr2(), tx2), Some(2));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_register_respects_capacity() {
        let mut registry = SessionRegistry::new(1);

        let (tx1, _rx1) = test_channel();
        let (tx2, _rx2) = test_channel();

        assert!(registry.register(test_addr(), tx1).is_some());
        assert!(registry.is_full());
        assert!(registry.register(test_addr2(), tx2).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_ids_are_not_reused_after_unregister() {
        let mut registry = SessionRegistry::new(2);

        let (tx1, _rx1) = test_channel();
        let (tx2, _rx2) = test_channel();

        let first = registry.register(test_addr(), tx1).unwrap();
        assert!(registry.unregister(first));
        let second = registry.register(test_addr(), tx2).unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn test_unregister_unknown_player() {
        let mut registry = SessionRegistry::new(2);
        assert!(!registry.unregister(999));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_send_to_delivers_to_queue() {
        let mut registry = SessionRegistry::new(2);
        let (tx, mut rx) = test_channel();
        let player_id = registry.register(test_addr(), tx).unwrap();

        assert!(registry.send_to(player_id, Message::Text("hello".to_string())));
        assert_eq!(rx.try_recv().unwrap(), Message::Text("hello".to_string()));

        assert!(!registry.send_to(999, Message::Text("nobody".to_string())));
    }

    #[test]
    fn test_send_to_after_writer_exit() {
        let mut registry = SessionRegistry::new(2);
        let (tx, rx) = test_channel();
        let player_id = registry.register(test_addr(), tx).unwrap();

        drop(rx);
        assert!(!registry.send_to(player_id, Message::Text("lost".to_string())));
    }

    #[test]
    fn test_sweep_removes_idle_sessions() {
        let mut registry = SessionRegistry::new(4);

        let (tx1, mut rx1) = test_channel();
        let (tx2, _rx2) = test_channel();
        let idle_id = registry.register(test_addr(), tx1).unwrap();
        let live_id = registry.register(test_addr2(), tx2).unwrap();

        if let Some(session) = registry.sessions.get_mut(&idle_id) {
            session.last_seen = Instant::now() - Duration::from_secs(10);
        }

        let evicted = registry.sweep(Duration::from_secs(5));
        assert_eq!(evicted, vec![idle_id]);
        assert!(!registry.contains(idle_id));
        assert!(registry.contains(live_id));

        // The evicted session is told it was dropped.
        assert_eq!(rx1.try_recv().unwrap(), Message::Close(None));
    }

    #[test]
    fn test_touch_defers_sweep() {
        let mut registry = SessionRegistry::new(2);
        let (tx, _rx) = test_channel();
        let player_id = registry.register(test_addr(), tx).unwrap();

        if let Some(session) = registry.sessions.get_mut(&player_id) {
            session.last_seen = Instant::now() - Duration::from_secs(10);
        }
        registry.touch(player_id);

        assert!(registry.sweep(Duration::from_secs(5)).is_empty());
        assert!(registry.contains(player_id));
    }
}
