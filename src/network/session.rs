//! Player Sessions
//!
//! Tracks which connections belong to which authenticated player so round
//! events can be pushed to the round owner. One player may hold several
//! connections (multiple tabs); each gets its own copy of every event.

use std::collections::BTreeMap;
use std::net::SocketAddr;

use tokio::sync::{mpsc, RwLock};
use tracing::debug;

use crate::game::events::RoundEvent;
use crate::game::state::PlayerId;
use crate::network::protocol::ServerMessage;

type Senders = BTreeMap<SocketAddr, mpsc::Sender<ServerMessage>>;

/// Routes server pushes to authenticated players.
pub struct SessionManager {
    players: RwLock<BTreeMap<PlayerId, Senders>>,
}

impl SessionManager {
    /// Create new session manager.
    pub fn new() -> Self {
        Self {
            players: RwLock::new(BTreeMap::new()),
        }
    }

    /// Register a connection for a player. Re-registering an address
    /// replaces its sender.
    pub async fn register(&self, player_id: PlayerId, addr: SocketAddr, sender: mpsc::Sender<ServerMessage>) {
        let mut players = self.players.write().await;
        players.entry(player_id).or_default().insert(addr, sender);
    }

    /// Remove a connection.
    pub async fn unregister(&self, player_id: &PlayerId, addr: SocketAddr) {
        let mut players = self.players.write().await;
        if let Some(senders) = players.get_mut(player_id) {
            senders.remove(&addr);
            if senders.is_empty() {
                players.remove(player_id);
            }
        }
    }

    /// Push a message to every connection of a player.
    ///
    /// Returns the number of connections that accepted it.
    pub async fn send_to(&self, player_id: &PlayerId, msg: ServerMessage) -> usize {
        let senders: Vec<_> = {
            let players = self.players.read().await;
            match players.get(player_id) {
                Some(senders) => senders.values().cloned().collect(),
                None => return 0,
            }
        };

        let mut delivered = 0;
        for sender in senders {
            if sender.send(msg.clone()).await.is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    /// Push a round event to its owner.
    pub async fn route_event(&self, event: RoundEvent) -> usize {
        let player_id = event.player_id.clone();
        let delivered = self.send_to(&player_id, ServerMessage::RoundEvent(event)).await;
        if delivered == 0 {
            debug!("No connection for {}, event dropped", player_id);
        }
        delivered
    }

    /// Whether the player has at least one connection.
    pub async fn is_connected(&self, player_id: &PlayerId) -> bool {
        self.players.read().await.contains_key(player_id)
    }

    /// Number of connected players.
    pub async fn player_count(&self) -> usize {
        self.players.read().await.len()
    }

    /// Number of registered connections.
    pub async fn connection_count(&self) -> usize {
        self.players.read().await.values().map(|s| s.len()).sum()
    }

    /// Drop connections whose receiver is gone.
    pub async fn cleanup(&self) {
        let mut players = self.players.write().await;
        for senders in players.values_mut() {
            senders.retain(|_, sender| !sender.is_closed());
        }
        players.retain(|_, senders| !senders.is_empty());
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::Amount;
    use crate::game::events::RoundEventData;
    use crate::game::state::RoundId;

    fn player(address: &str) -> PlayerId {
        PlayerId::from_address(address).unwrap()
    }

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    #[tokio::test]
    async fn test_register_unregister() {
        let sessions = SessionManager::new();
        let alice = player("0xalice");
        let (tx1, _rx1) = mpsc::channel(10);
        let (tx2, _rx2) = mpsc::channel(10);

        sessions.register(alice.clone(), addr(1), tx1).await;
        sessions.register(alice.clone(), addr(2), tx2).await;
        assert_eq!(sessions.player_count().await, 1);
        assert_eq!(sessions.connection_count().await, 2);

        sessions.unregister(&alice, addr(1)).await;
        assert!(sessions.is_connected(&alice).await);
        sessions.unregister(&alice, addr(2)).await;
        assert!(!sessions.is_connected(&alice).await);
    }

    #[tokio::test]
    async fn test_event_routed_to_owner_only() {
        let sessions = SessionManager::new();
        let alice = player("0xalice");
        let bob = player("0xbob");
        let (tx_a, mut rx_a) = mpsc::channel(10);
        let (tx_b, mut rx_b) = mpsc::channel(10);
        sessions.register(alice.clone(), addr(1), tx_a).await;
        sessions.register(bob, addr(2), tx_b).await;

        let event = RoundEvent::new(
            5,
            alice,
            RoundId::new_v4(),
            RoundEventData::BetPlaced { amount: Amount::from_whole(1) },
        );
        assert_eq!(sessions.route_event(event.clone()).await, 1);

        assert_eq!(rx_a.recv().await, Some(ServerMessage::RoundEvent(event)));
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_cleanup_drops_closed() {
        let sessions = SessionManager::new();
        let alice = player("0xalice");
        let (tx, rx) = mpsc::channel(10);
        sessions.register(alice.clone(), addr(1), tx).await;
        drop(rx);

        sessions.cleanup().await;
        assert_eq!(sessions.player_count().await, 0);
        assert_eq!(sessions.send_to(&alice, ServerMessage::Shutdown { reason: "x".into() }).await, 0);
    }
}
