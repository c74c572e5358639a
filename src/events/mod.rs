//! In-Process Event Bus
//!
//! A process-local publish/subscribe mechanism that decouples "a leader was
//! elected" from "start monitoring it". Handlers run as independent tasks;
//! emission never blocks on them, promises no ordering, and propagates no
//! errors back to the emitter. Handlers are registered once during node
//! initialization and live for the process lifetime; there is no
//! unsubscribe.

pub mod bus;
