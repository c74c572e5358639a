use dashmap::DashMap;
use futures::future::BoxFuture;
use std::sync::Arc;

use crate::protocol::types::NodeId;

/// Topic published whenever a leader (local or remote) is adopted.
pub const TOPIC_LEADER_ELECTED: &str = "leader.elected";

/// A subscriber callback. Each invocation receives the topic and the
/// elected leader's id and runs on its own task.
pub type HandlerFn = Arc<dyn Fn(String, NodeId) -> BoxFuture<'static, ()> + Send + Sync>;

/// Process-local publish/subscribe.
///
/// Created once per node at construction. Delivery reaches exactly the
/// handlers registered at the time of `emit`.
#[derive(Default)]
pub struct EventBus {
    handlers_by_topic: DashMap<String, Vec<HandlerFn>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `topic`.
    pub fn subscribe(&self, topic: &str, handler: HandlerFn) {
        self.handlers_by_topic
            .entry(topic.to_string())
            .or_default()
            .push(handler);
    }

    /// Invokes every handler currently registered for `topic`, each on an
    /// independent task. Returns as soon as the tasks are spawned.
    pub fn emit(&self, topic: &str, payload: NodeId) {
        let handlers: Vec<HandlerFn> = match self.handlers_by_topic.get(topic) {
            Some(entry) => entry.value().clone(),
            None => return,
        };

        tracing::debug!("Emitting {} to {} handler(s)", topic, handlers.len());

        for handler in handlers {
            let topic = topic.to_string();
            let payload = payload.clone();
            tokio::spawn(handler(topic, payload));
        }
    }
}
