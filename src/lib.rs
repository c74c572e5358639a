//! Bully Leader Election Cluster Library
//!
//! This library crate defines the core modules that make up a single cluster
//! node. It serves as the foundation for the binary executable (`main.rs`).
//!
//! ## Architecture Modules
//! The node is composed of six loosely coupled subsystems:
//!
//! - **`config`**: The static cluster topology. A fixed node-id-to-address
//!   table, injected into the node as a resolver so tests can substitute an
//!   in-memory layout.
//! - **`protocol`**: The wire contract. The closed set of message kinds, the
//!   request/reply `Message` structure, and the endpoint every node exposes.
//! - **`peers`**: The cluster link layer. A concurrency-safe registry of live
//!   peers plus the request/reply client used to reach them.
//! - **`events`**: The in-process publish/subscribe bus. Decouples "a leader
//!   was elected" from "start monitoring it".
//! - **`election`**: The node orchestrator. Runs bootstrap, answers inbound
//!   protocol messages, and drives the Bully decision procedure.
//! - **`monitor`**: The leader health monitor. Probes the elected leader
//!   periodically and triggers a new election when it becomes unreachable.

pub mod config;
pub mod election;
pub mod events;
pub mod monitor;
pub mod peers;
pub mod protocol;
