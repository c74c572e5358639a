//! Election & Node Orchestration
//!
//! Implements the Bully decision procedure on top of the peer registry and
//! wire protocol. Every node runs the procedure for itself: the
//! globally-highest-ranked live node finds no higher-ranked peer alive and
//! declares itself leader; every lower-ranked node that probes it receives
//! `Alive` and stands down for the round.
//!
//! ## Core Mechanisms
//! - **Bootstrap**: dial every configured peer (retrying until the transport
//!   answers), probe with `Ping`, keep the ones that reply `Pong`.
//! - **Message handling**: the single remote operation each node exposes;
//!   answers many callers concurrently and may adopt a new leader.
//! - **Election**: sequential probing of higher-ranked peers; probe failure
//!   counts as not-alive and never aborts the round.
//!
//! Known consistency gap: there is no election epoch or term, so two nodes
//! can self-declare during overlapping failure windows. Each node simply
//! keeps the last `Elected` it processed; convergence relies on the
//! highest-ranked live node always winning its own round.

pub mod handlers;
pub mod service;

#[cfg(test)]
mod tests;
