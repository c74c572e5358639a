use bully_cluster::config::ClusterTopology;
use bully_cluster::election::handlers;
use bully_cluster::election::service::Node;
use bully_cluster::monitor::service::LeaderMonitor;
use bully_cluster::protocol::types::NodeId;
use std::time::Duration;

/// Settle time before the first election, so members that start together
/// finish bootstrapping each other first.
const ELECTION_WARMUP: Duration = Duration::from_secs(5);
const STATS_INTERVAL: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut node_id: Option<String> = None;
    let mut topology_file: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--topology" => {
                if i + 1 >= args.len() {
                    eprintln!("--topology requires a file path");
                    std::process::exit(1);
                }
                topology_file = Some(args[i + 1].clone());
                i += 2;
            }
            other => {
                node_id = Some(other.to_string());
                i += 1;
            }
        }
    }

    let Some(node_id) = node_id else {
        eprintln!("Usage: {} <node-id> [--topology <file.json>]", args[0]);
        eprintln!("Example: {} node-01", args[0]);
        std::process::exit(1);
    };
    let node_id = NodeId(node_id);

    let topology = match topology_file {
        Some(path) => ClusterTopology::from_file(&path)?,
        None => ClusterTopology::standard(),
    };

    let Some(listen_addr) = topology.resolve(&node_id) else {
        anyhow::bail!("Node id {} is not in the cluster topology", node_id);
    };

    tracing::info!("Starting node {} on {}", node_id, listen_addr);

    let node = Node::new(node_id, topology);

    let monitor = LeaderMonitor::new(node.clone());
    monitor.subscribe();

    // The message server must be up before peers start probing us.
    let listener = tokio::net::TcpListener::bind(listen_addr.as_str()).await?;
    let app = handlers::router(node.clone());
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("Message server stopped: {}", e);
        }
    });

    node.bootstrap().await;

    let stats_node = node.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(STATS_INTERVAL);

        loop {
            interval.tick().await;
            tracing::info!(
                "Cluster stats: leader={:?} peers={:?}",
                stats_node.leader().await,
                stats_node.peers.to_ids()
            );
        }
    });

    tokio::time::sleep(ELECTION_WARMUP).await;
    node.elect().await;

    tracing::info!("Press Ctrl+C to shutdown");
    tokio::signal::ctrl_c().await?;

    Ok(())
}
