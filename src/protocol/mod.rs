//! Election Wire Protocol
//!
//! Defines the message structure exchanged between cluster nodes and the
//! single remote operation each node exposes (`POST` to
//! [`types::ENDPOINT_MESSAGE`], a `Message` in and a `Message` back).
//!
//! ## Request/reply semantics
//! - `Ping` is answered with `Pong` (pure liveness ack).
//! - `Election` is answered with `Alive` (the receiver asserts it is up).
//! - `Elected` is answered with `Ok` (the receiver adopts the sender as
//!   leader).
//! - `Pong`, `Alive` and `Ok` are reply-only and never valid as requests.

pub mod types;
