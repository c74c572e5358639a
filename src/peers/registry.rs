use dashmap::DashMap;

use crate::peers::client::PeerClient;
use crate::protocol::types::NodeId;

/// A live, bootstrapped link to another cluster member.
///
/// Created on a successful connect-and-probe during bootstrap, destroyed
/// when the peer is detected unreachable.
#[derive(Debug, Clone)]
pub struct Peer {
    pub id: NodeId,
    pub client: PeerClient,
}

/// Concurrency-safe store of reachable peers.
///
/// Shared simultaneously by inbound request handlers, the election
/// procedure, and the leader monitor. Reads may overlap, mutations are
/// exclusive, and the snapshot methods copy out so callers never iterate
/// under a lock.
#[derive(Debug)]
pub struct PeerRegistry {
    local_id: NodeId,
    peer_by_id: DashMap<NodeId, Peer>,
}

impl PeerRegistry {
    pub fn new(local_id: NodeId) -> Self {
        Self {
            local_id,
            peer_by_id: DashMap::new(),
        }
    }

    /// Inserts or overwrites the entry for `id`; later lookups see the new
    /// handle immediately. The local node never appears in its own registry,
    /// so such an add is refused.
    pub fn add(&self, id: NodeId, client: PeerClient) {
        if id == self.local_id {
            tracing::warn!("Refusing to register local node {} as its own peer", id);
            return;
        }

        self.peer_by_id.insert(id.clone(), Peer { id, client });
    }

    /// Removes the entry if present; absent ids are a no-op.
    pub fn delete(&self, id: &NodeId) {
        self.peer_by_id.remove(id);
    }

    /// Point lookup. A missing entry is an expected outcome, not a fault.
    pub fn get(&self, id: &NodeId) -> Option<Peer> {
        self.peer_by_id.get(id).map(|entry| entry.value().clone())
    }

    /// Point-in-time snapshot, safe to iterate without holding any lock.
    pub fn to_list(&self) -> Vec<Peer> {
        self.peer_by_id
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Projection of `to_list` for diagnostics, ordered by id.
    pub fn to_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self
            .peer_by_id
            .iter()
            .map(|entry| entry.key().clone())
            .collect();

        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.peer_by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peer_by_id.is_empty()
    }
}
