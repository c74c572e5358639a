use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::info;

use crate::config::ClusterTopology;
use crate::events::bus::{EventBus, TOPIC_LEADER_ELECTED};
use crate::peers::client::{PeerClient, RetryPolicy};
use crate::peers::registry::PeerRegistry;
use crate::protocol::types::{Message, MessageKind, NodeId, ProtocolError};

/// Fixed delay between bootstrap dial attempts.
const BOOTSTRAP_BACKOFF: Duration = Duration::from_millis(50);

/// Lifecycle of a node, from process start to an election outcome.
///
/// `Leader` and `Follower` fall back to `Electing` when the monitored
/// leader is lost. A node that stood down mid-round stays `Electing` until
/// the winner's `Elected` arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Idle,
    Bootstrapping,
    Electing,
    Leader,
    Follower,
}

/// A single cluster member: identity, peer registry, event bus, and the
/// local belief about who leads.
///
/// The registry is the only structure mutated by several logical flows at
/// once (inbound handler, election, monitor); the leader belief and state
/// live behind their own locks and are updated right next to the registry
/// mutation that accompanies a leadership change.
pub struct Node {
    pub id: NodeId,
    pub peers: Arc<PeerRegistry>,
    pub bus: Arc<EventBus>,
    topology: ClusterTopology,
    http: reqwest::Client,
    leader: RwLock<Option<NodeId>>,
    state: RwLock<NodeState>,
}

impl Node {
    pub fn new(id: NodeId, topology: ClusterTopology) -> Arc<Self> {
        Arc::new(Self {
            peers: Arc::new(PeerRegistry::new(id.clone())),
            bus: Arc::new(EventBus::new()),
            id,
            topology,
            http: reqwest::Client::new(),
            leader: RwLock::new(None),
            state: RwLock::new(NodeState::Idle),
        })
    }

    /// The node this member currently believes is leader. Not persisted;
    /// nodes may transiently disagree until the protocol converges.
    pub async fn leader(&self) -> Option<NodeId> {
        self.leader.read().await.clone()
    }

    pub async fn state(&self) -> NodeState {
        *self.state.read().await
    }

    async fn set_state(&self, next: NodeState) {
        *self.state.write().await = next;
    }

    async fn set_leader(&self, leader_id: NodeId) {
        *self.leader.write().await = Some(leader_id);
    }

    /// Drops a lost leader: removes its registry entry and clears the local
    /// belief in one place, so both views change together.
    pub async fn drop_leader(&self, leader_id: &NodeId) {
        self.peers.delete(leader_id);

        let mut leader = self.leader.write().await;
        if leader.as_ref() == Some(leader_id) {
            *leader = None;
        }
    }

    /// Connects to every configured peer and keeps the ones that answer the
    /// liveness probe with `Pong`.
    ///
    /// Dialing retries forever at a fixed backoff: a peer that is merely
    /// slow to start still joins the live set.
    pub async fn bootstrap(&self) {
        self.bootstrap_with(RetryPolicy::unbounded(BOOTSTRAP_BACKOFF))
            .await;
    }

    /// `bootstrap` under an explicit retry policy, for tests that must not
    /// block forever on an absent peer.
    pub async fn bootstrap_with(&self, policy: RetryPolicy) {
        self.set_state(NodeState::Bootstrapping).await;

        for (peer_id, addr) in self.topology.peer_entries(&self.id) {
            let client = PeerClient::new(self.http.clone(), &addr);
            let probe = Message::new(self.id.clone(), MessageKind::Ping);

            match client.call_with_retry(&probe, policy).await {
                Ok(reply) if reply.is_pong() => {
                    tracing::debug!("Node {} is connected to peer {}", self.id, peer_id);
                    self.peers.add(peer_id, client);
                }
                Ok(reply) => {
                    tracing::warn!(
                        "Peer {} answered the probe with {:?}, leaving it out",
                        peer_id,
                        reply.kind
                    );
                }
                Err(e) => {
                    tracing::warn!("Giving up on peer {}: {:#}", peer_id, e);
                }
            }
        }

        info!("{} is aware of own peers {:?}", self.id, self.peers.to_ids());
    }

    /// The single remote operation every node exposes.
    ///
    /// Answers many concurrent callers without serialization; only the
    /// `Elected` arm mutates local state.
    pub async fn handle_message(&self, request: Message) -> Result<Message, ProtocolError> {
        match request.kind {
            MessageKind::Ping => Ok(self.reply(MessageKind::Pong)),

            MessageKind::Election => {
                tracing::debug!(
                    "ELECTION from {}, acknowledging own liveness",
                    request.from_peer_id
                );
                Ok(self.reply(MessageKind::Alive))
            }

            MessageKind::Elected => {
                info!("{} has new leader {}", self.id, request.from_peer_id);
                self.adopt_leader(request.from_peer_id).await;
                Ok(self.reply(MessageKind::Ok))
            }

            kind @ (MessageKind::Pong | MessageKind::Alive | MessageKind::Ok) => {
                Err(ProtocolError::UnexpectedRequest(kind))
            }
        }
    }

    fn reply(&self, kind: MessageKind) -> Message {
        Message::new(self.id.clone(), kind)
    }

    async fn adopt_leader(&self, leader_id: NodeId) {
        self.set_leader(leader_id.clone()).await;
        self.set_state(NodeState::Follower).await;
        self.bus.emit(TOPIC_LEADER_ELECTED, leader_id);
    }

    /// One Bully election round, decided independently by this node.
    ///
    /// Probes every higher-ranked peer one at a time, in snapshot order. A
    /// single `Alive` reply means a higher-ranked node is up and will claim
    /// leadership on its own, so this node stands down for the round. A
    /// probe failure counts that peer as not alive and the round continues.
    /// With no higher-ranked peer alive, this node takes leadership and
    /// announces it to every known peer.
    pub async fn elect(&self) {
        self.set_state(NodeState::Electing).await;

        for peer in self.peers.to_list() {
            if !peer.id.outranks(&self.id) {
                continue;
            }

            let probe = Message::new(self.id.clone(), MessageKind::Election);

            match peer.client.call(&probe).await {
                Ok(reply) if reply.is_alive() => {
                    tracing::debug!(
                        "{} stands down: higher-ranked {} is alive",
                        self.id,
                        peer.id
                    );
                    return;
                }
                Ok(reply) => {
                    tracing::warn!(
                        "{} answered ELECTION with {:?}, counting it as not alive",
                        peer.id,
                        reply.kind
                    );
                }
                Err(e) => {
                    tracing::warn!("{} unreachable during election: {:#}", peer.id, e);
                }
            }
        }

        info!("{} is making itself a leader", self.id);
        self.set_leader(self.id.clone()).await;
        self.set_state(NodeState::Leader).await;
        self.broadcast(MessageKind::Elected).await;
        self.bus.emit(TOPIC_LEADER_ELECTED, self.id.clone());
    }

    /// Sends `kind` to every known peer; delivery failures are logged and
    /// skipped.
    pub async fn broadcast(&self, kind: MessageKind) {
        for peer in self.peers.to_list() {
            let msg = Message::new(self.id.clone(), kind);

            if let Err(e) = peer.client.call(&msg).await {
                tracing::warn!("Broadcast of {:?} to {} failed: {:#}", kind, peer.id, e);
            }
        }
    }
}
