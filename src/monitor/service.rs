use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::info;

use crate::election::service::Node;
use crate::events::bus::{HandlerFn, TOPIC_LEADER_ELECTED};
use crate::protocol::types::{Message, MessageKind, NodeId};

/// Delay between liveness probes of the current leader.
const PROBE_INTERVAL: Duration = Duration::from_secs(3);

/// Watches the elected leader and triggers a new election when it goes down.
pub struct LeaderMonitor {
    node: Arc<Node>,
    probe_interval: Duration,
    watch_task: Mutex<Option<JoinHandle<()>>>,
}

impl LeaderMonitor {
    pub fn new(node: Arc<Node>) -> Arc<Self> {
        Self::with_probe_interval(node, PROBE_INTERVAL)
    }

    /// Interval override for tests.
    pub fn with_probe_interval(node: Arc<Node>, probe_interval: Duration) -> Arc<Self> {
        Arc::new(Self {
            node,
            probe_interval,
            watch_task: Mutex::new(None),
        })
    }

    /// Registers the monitor on the node's bus. Called once at startup.
    pub fn subscribe(self: Arc<Self>) {
        let monitor = self.clone();

        let handler: HandlerFn = Arc::new(move |_topic, leader_id| {
            let monitor = monitor.clone();
            Box::pin(async move {
                monitor.on_leader_elected(leader_id).await;
            })
        });

        self.node.bus.subscribe(TOPIC_LEADER_ELECTED, handler);
    }

    /// Replaces the previous watch task with one for the new leader. A node
    /// that leads itself needs no monitor.
    async fn on_leader_elected(self: Arc<Self>, leader_id: NodeId) {
        let mut slot = self.watch_task.lock().await;

        if let Some(previous) = slot.take() {
            previous.abort();
        }

        if leader_id == self.node.id {
            tracing::debug!("{} leads itself, no monitor needed", self.node.id);
            return;
        }

        let monitor = self.clone();
        *slot = Some(tokio::spawn(async move {
            monitor.watch(leader_id).await;
        }));
    }

    /// Probe loop for a single leader; ends when the leader is lost, absent
    /// from the registry, or this task is replaced.
    async fn watch(&self, leader_id: NodeId) {
        info!("{} is monitoring leader {}", self.node.id, leader_id);

        loop {
            let Some(peer) = self.node.peers.get(&leader_id) else {
                tracing::warn!(
                    "Leader {} is not in the peer registry, nothing to monitor",
                    leader_id
                );
                return;
            };

            let probe = Message::new(self.node.id.clone(), MessageKind::Ping);

            match peer.client.call(&probe).await {
                Ok(reply) if reply.is_pong() => {
                    tokio::time::sleep(self.probe_interval).await;
                }
                Ok(reply) => {
                    tracing::warn!(
                        "Leader {} answered the probe with {:?}, treating it as down",
                        leader_id,
                        reply.kind
                    );
                    self.leader_lost(leader_id).await;
                    return;
                }
                Err(e) => {
                    tracing::warn!("Leader {} is unreachable: {:#}", leader_id, e);
                    self.leader_lost(leader_id).await;
                    return;
                }
            }
        }
    }

    /// Removes the lost leader and starts a fresh election round on its own
    /// task, so the ending watch task never cancels the election mid-way.
    async fn leader_lost(&self, leader_id: NodeId) {
        self.node.drop_leader(&leader_id).await;

        let node = self.node.clone();
        tokio::spawn(async move {
            node.elect().await;
        });
    }
}
