//! Election Module Tests
//!
//! Multi-node scenarios over real loopback sockets: bootstrap, the remote
//! message handler, convergence of independently-run election rounds, and
//! failover after the leader dies.

#[cfg(test)]
mod tests {
    use crate::config::ClusterTopology;
    use crate::election::handlers;
    use crate::election::service::{Node, NodeState};
    use crate::monitor::service::LeaderMonitor;
    use crate::peers::client::RetryPolicy;
    use crate::protocol::types::{Message, MessageKind, NodeId};
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;
    use tokio::task::JoinHandle;

    struct TestMember {
        node: Arc<Node>,
        server: JoinHandle<()>,
        shutdown: Option<oneshot::Sender<()>>,
    }

    impl TestMember {
        /// Stops the member's server and waits for it to wind down, so its
        /// port refuses connections and kept-alive links are closed.
        async fn kill(mut self) {
            if let Some(shutdown) = self.shutdown.take() {
                let _ = shutdown.send(());
            }
            let _ = tokio::time::timeout(Duration::from_secs(5), self.server).await;
        }
    }

    struct TestCluster {
        members: HashMap<String, TestMember>,
        topology: ClusterTopology,
    }

    impl TestCluster {
        fn node(&self, id: &str) -> &Arc<Node> {
            &self.members[id].node
        }

        fn addr(&self, id: &str) -> String {
            self.topology
                .resolve(&NodeId::from(id))
                .expect("Member is not in the test topology")
        }

        async fn kill(&mut self, id: &str) {
            self.members
                .remove(id)
                .expect("No such member to kill")
                .kill()
                .await;
        }
    }

    /// Binds a listener per id first so the topology can carry real ports,
    /// then starts one served node per id.
    async fn start_cluster(ids: &[&str]) -> TestCluster {
        let mut listeners = Vec::new();
        let mut table = HashMap::new();

        for id in ids {
            let listener = TcpListener::bind("127.0.0.1:0")
                .await
                .expect("Failed to bind test listener");
            let addr = listener.local_addr().expect("Listener has no local addr");

            table.insert(NodeId::from(*id), addr.to_string());
            listeners.push((id.to_string(), listener));
        }

        let topology = ClusterTopology::new(table);

        let mut members = HashMap::new();
        for (id, listener) in listeners {
            let node = Node::new(NodeId::from(id.as_str()), topology.clone());
            let app = handlers::router(node.clone());

            let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
            let server = tokio::spawn(async move {
                let _ = axum::serve(listener, app)
                    .with_graceful_shutdown(async move {
                        let _ = shutdown_rx.await;
                    })
                    .await;
            });

            members.insert(
                id,
                TestMember {
                    node,
                    server,
                    shutdown: Some(shutdown_tx),
                },
            );
        }

        TestCluster { members, topology }
    }

    async fn bootstrap_all(cluster: &TestCluster) {
        for member in cluster.members.values() {
            member
                .node
                .bootstrap_with(RetryPolicy::bounded(40, Duration::from_millis(25)))
                .await;
        }
    }

    // ============================================================
    // BOOTSTRAP & LIVENESS TESTS
    // ============================================================

    #[tokio::test]
    async fn test_bootstrap_registers_live_peers() {
        let cluster = start_cluster(&["node-01", "node-02", "node-03"]).await;
        bootstrap_all(&cluster).await;

        let ids: Vec<String> = cluster
            .node("node-01")
            .peers
            .to_ids()
            .into_iter()
            .map(|id| id.0)
            .collect();

        assert_eq!(ids, vec!["node-02", "node-03"]);
    }

    #[tokio::test]
    async fn test_ping_round_trip_carries_replier_id() {
        let cluster = start_cluster(&["node-01", "node-02"]).await;
        bootstrap_all(&cluster).await;

        let peer = cluster
            .node("node-01")
            .peers
            .get(&NodeId::from("node-02"))
            .expect("node-02 must be registered after bootstrap");

        let reply = peer
            .client
            .call(&Message::new(NodeId::from("node-01"), MessageKind::Ping))
            .await
            .expect("Ping to a live peer must succeed");

        assert!(reply.is_pong());
        assert_eq!(reply.from_peer_id, NodeId::from("node-02"));
    }

    #[tokio::test]
    async fn test_bootstrap_skips_dead_peers() {
        let mut cluster = start_cluster(&["node-01", "node-02", "node-03"]).await;
        cluster.kill("node-03").await;

        cluster
            .node("node-01")
            .bootstrap_with(RetryPolicy::bounded(3, Duration::from_millis(10)))
            .await;

        let ids: Vec<String> = cluster
            .node("node-01")
            .peers
            .to_ids()
            .into_iter()
            .map(|id| id.0)
            .collect();

        assert_eq!(ids, vec!["node-02"]);
    }

    // ============================================================
    // MESSAGE HANDLER TESTS
    // ============================================================

    #[tokio::test]
    async fn test_elected_request_adopts_sender_as_leader() {
        let cluster = start_cluster(&["node-01", "node-02"]).await;
        bootstrap_all(&cluster).await;

        let to_node_01 = cluster
            .node("node-02")
            .peers
            .get(&NodeId::from("node-01"))
            .expect("node-01 must be registered after bootstrap");

        let reply = to_node_01
            .client
            .call(&Message::new(NodeId::from("node-02"), MessageKind::Elected))
            .await
            .expect("Elected must be answered");

        assert_eq!(reply.kind, MessageKind::Ok);
        assert_eq!(reply.from_peer_id, NodeId::from("node-01"));

        assert_eq!(
            cluster.node("node-01").leader().await,
            Some(NodeId::from("node-02"))
        );
        assert_eq!(cluster.node("node-01").state().await, NodeState::Follower);
    }

    #[tokio::test]
    async fn test_reply_only_kind_is_rejected_as_request() {
        let cluster = start_cluster(&["node-01", "node-02"]).await;
        bootstrap_all(&cluster).await;

        let peer = cluster
            .node("node-01")
            .peers
            .get(&NodeId::from("node-02"))
            .expect("node-02 must be registered after bootstrap");

        for kind in [MessageKind::Pong, MessageKind::Alive, MessageKind::Ok] {
            let outcome = peer
                .client
                .call(&Message::new(NodeId::from("node-01"), kind))
                .await;

            assert!(outcome.is_err(), "{:?} must not be accepted as a request", kind);
        }
    }

    #[tokio::test]
    async fn test_unknown_kind_tag_is_rejected_at_the_wire() {
        let cluster = start_cluster(&["node-01", "node-02"]).await;

        // Bypass the typed client: a raw frame with a tag outside the closed
        // set must never reach handler logic.
        let response = reqwest::Client::new()
            .post(format!(
                "http://{}{}",
                cluster.addr("node-02"),
                crate::protocol::types::ENDPOINT_MESSAGE
            ))
            .json(&serde_json::json!({"from_peer_id": "node-01", "kind": 99}))
            .send()
            .await
            .expect("Transport must still answer");

        assert!(
            response.status().is_client_error(),
            "Unknown tag must be rejected, got {}",
            response.status()
        );
    }

    // ============================================================
    // ELECTION CONVERGENCE TESTS
    // ============================================================

    #[tokio::test]
    async fn test_lone_node_elects_itself() {
        let cluster = start_cluster(&["node-01"]).await;
        bootstrap_all(&cluster).await;

        let node = cluster.node("node-01");
        assert!(node.peers.is_empty());

        node.elect().await;

        assert_eq!(node.leader().await, Some(NodeId::from("node-01")));
        assert_eq!(node.state().await, NodeState::Leader);
    }

    #[tokio::test]
    async fn test_cluster_converges_on_highest_id() {
        let cluster = start_cluster(&["node-01", "node-02", "node-03"]).await;
        bootstrap_all(&cluster).await;

        // Every node runs its own round, lowest rank first: the lower nodes
        // find node-03 (or node-02) alive and stand down; node-03 finds no
        // higher peer and claims leadership.
        cluster.node("node-01").elect().await;
        cluster.node("node-02").elect().await;
        cluster.node("node-03").elect().await;

        for id in ["node-01", "node-02", "node-03"] {
            assert_eq!(
                cluster.node(id).leader().await,
                Some(NodeId::from("node-03")),
                "{} must follow node-03",
                id
            );
        }

        assert_eq!(cluster.node("node-03").state().await, NodeState::Leader);
        assert_eq!(cluster.node("node-01").state().await, NodeState::Follower);
        assert_eq!(cluster.node("node-02").state().await, NodeState::Follower);
    }

    #[tokio::test]
    async fn test_convergence_is_order_independent() {
        let cluster = start_cluster(&["node-01", "node-02", "node-03"]).await;
        bootstrap_all(&cluster).await;

        // Highest first: node-03 wins immediately, the later rounds find it
        // alive and stand down without disturbing the adopted leader.
        cluster.node("node-03").elect().await;
        cluster.node("node-02").elect().await;
        cluster.node("node-01").elect().await;

        for id in ["node-01", "node-02", "node-03"] {
            assert_eq!(
                cluster.node(id).leader().await,
                Some(NodeId::from("node-03")),
                "{} must follow node-03",
                id
            );
        }
    }

    // ============================================================
    // FAILOVER TESTS
    // ============================================================

    #[tokio::test]
    async fn test_election_treats_unreachable_higher_peer_as_not_alive() {
        let mut cluster = start_cluster(&["node-01", "node-02", "node-03"]).await;
        bootstrap_all(&cluster).await;

        cluster.node("node-01").elect().await;
        cluster.node("node-02").elect().await;
        cluster.node("node-03").elect().await;

        cluster.kill("node-03").await;

        // node-02 re-runs its round: the probe to node-03 fails, which only
        // counts it as not alive; node-02 then wins and announces itself.
        cluster.node("node-02").elect().await;

        assert_eq!(
            cluster.node("node-02").leader().await,
            Some(NodeId::from("node-02"))
        );
        assert_eq!(cluster.node("node-02").state().await, NodeState::Leader);
        assert_eq!(
            cluster.node("node-01").leader().await,
            Some(NodeId::from("node-02")),
            "node-01 must adopt the new leader from the Elected broadcast"
        );
    }

    #[tokio::test]
    async fn test_monitor_failover_end_to_end() {
        let mut cluster = start_cluster(&["node-01", "node-02", "node-03"]).await;

        // Monitors on the survivors, probing fast enough for a test.
        let monitor_01 = LeaderMonitor::with_probe_interval(
            cluster.node("node-01").clone(),
            Duration::from_millis(100),
        );
        monitor_01.subscribe();
        let monitor_02 = LeaderMonitor::with_probe_interval(
            cluster.node("node-02").clone(),
            Duration::from_millis(100),
        );
        monitor_02.subscribe();

        bootstrap_all(&cluster).await;

        cluster.node("node-01").elect().await;
        cluster.node("node-02").elect().await;
        cluster.node("node-03").elect().await;

        // Let the watch tasks complete at least one probe cycle.
        tokio::time::sleep(Duration::from_millis(300)).await;

        cluster.kill("node-03").await;

        let mut converged = false;
        for _ in 0..50 {
            let leader_01 = cluster.node("node-01").leader().await;
            let leader_02 = cluster.node("node-02").leader().await;

            if leader_01 == Some(NodeId::from("node-02"))
                && leader_02 == Some(NodeId::from("node-02"))
            {
                converged = true;
                break;
            }

            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        assert!(converged, "Survivors must converge on node-02 after failover");
        assert!(
            cluster
                .node("node-02")
                .peers
                .get(&NodeId::from("node-03"))
                .is_none(),
            "The dead leader must have been dropped from the initiator's registry"
        );
    }
}
