//! Peer registry for the LAN broadcast hub (§4.8): every connected peer
//! joins a set; any incoming text (other than a literal `ping`, which is
//! echoed as `pong`) is rebroadcast to every peer. Dead peers are removed
//! lazily — a failed send during broadcast drops that peer from the set
//! instead of erroring the whole broadcast.

use dashmap::DashMap;
use tokio::sync::mpsc;

pub type PeerId = String;

#[derive(Clone)]
pub struct Hub {
    peers: DashMap<PeerId, mpsc::UnboundedSender<String>>,
}

impl Hub {
    pub fn new() -> Self {
        Self {
            peers: DashMap::new(),
        }
    }

    pub fn join(&self, id: PeerId, sender: mpsc::UnboundedSender<String>) {
        self.peers.insert(id, sender);
    }

    pub fn leave(&self, id: &PeerId) {
        self.peers.remove(id);
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    /// Sends `payload` to every peer, including its sender — the sender
    /// gets its own message echoed back same as everyone else (§4.8). Peers
    /// whose channel is closed are removed rather than treated as a
    /// broadcast failure.
    pub fn broadcast(&self, payload: &str) {
        let mut dead = Vec::new();
        for entry in self.peers.iter() {
            if entry.value().send(payload.to_string()).is_err() {
                dead.push(entry.key().clone());
            }
        }
        for id in dead {
            self.peers.remove(&id);
        }
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}
