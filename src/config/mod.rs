//! Cluster Topology Configuration
//!
//! The fixed node-id-to-address table every cluster member shares. The table
//! is injected into the node as a resolver rather than read from a global,
//! so tests can substitute an in-memory layout with loopback addresses.
//!
//! Addresses are `host:port` strings; hostnames are resolved by the
//! transport at dial time, which keeps container-network names usable.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;

use crate::protocol::types::NodeId;

/// The static mapping from node id to network address.
///
/// Known identically by all nodes and immutable for the process lifetime;
/// there is no dynamic membership.
#[derive(Debug, Clone, Default)]
pub struct ClusterTopology {
    addr_by_id: HashMap<NodeId, String>,
}

impl ClusterTopology {
    pub fn new(addr_by_id: HashMap<NodeId, String>) -> Self {
        Self { addr_by_id }
    }

    /// The built-in four-node table used when no topology file is given.
    pub fn standard() -> Self {
        let addr_by_id = [
            ("node-01", "node-01:6001"),
            ("node-02", "node-02:6002"),
            ("node-03", "node-03:6003"),
            ("node-04", "node-04:6004"),
        ]
        .into_iter()
        .map(|(id, addr)| (NodeId::from(id), addr.to_string()))
        .collect();

        Self { addr_by_id }
    }

    /// Loads a topology from a JSON object of `id -> "host:port"`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read topology file {:?}", path.as_ref()))?;

        let table: HashMap<String, String> =
            serde_json::from_str(&raw).context("Topology file is not a JSON id -> address map")?;

        Ok(Self {
            addr_by_id: table
                .into_iter()
                .map(|(id, addr)| (NodeId(id), addr))
                .collect(),
        })
    }

    /// Address lookup; `None` for ids outside the cluster.
    pub fn resolve(&self, id: &NodeId) -> Option<String> {
        self.addr_by_id.get(id).cloned()
    }

    /// Every configured member except `local`, with addresses, ordered by id.
    pub fn peer_entries(&self, local: &NodeId) -> Vec<(NodeId, String)> {
        let mut entries: Vec<(NodeId, String)> = self
            .addr_by_id
            .iter()
            .filter(|(id, _)| *id != local)
            .map(|(id, addr)| (id.clone(), addr.clone()))
            .collect();

        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    pub fn len(&self) -> usize {
        self.addr_by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addr_by_id.is_empty()
    }
}
