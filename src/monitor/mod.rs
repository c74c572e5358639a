//! Leader Health Monitor
//!
//! Subscribes to the leader-elected event and, when the elected leader is a
//! remote node, probes it periodically. An unreachable leader is removed
//! from the peer registry and a fresh election round is started.
//!
//! Exactly one watch task exists per current leader: every leader-elected
//! event aborts the previous task before spawning the next, so repeated
//! elections never leave overlapping monitor loops behind.

pub mod service;
