//! # In-Memory Event Bus
//!
//! Records every published message in order and fans each one out to live
//! subscribers over a `tokio::sync::broadcast` channel. Slow subscribers may
//! lag and miss messages; the recorded log never does.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;

use crate::ports::{BusError, BusMessage, EventBus};

const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// A process-local [`EventBus`].
#[derive(Debug, Clone)]
pub struct InMemoryEventBus {
    log: Arc<RwLock<Vec<BusMessage>>>,
    sender: broadcast::Sender<BusMessage>,
}

impl InMemoryEventBus {
    /// Create a bus with the default fan-out capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a bus whose subscribers can lag by up to `capacity` messages.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            log: Arc::new(RwLock::new(Vec::new())),
            sender,
        }
    }

    /// Subscribe to every message published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<BusMessage> {
        self.sender.subscribe()
    }

    /// Every message published so far, in order.
    pub fn messages(&self) -> Vec<BusMessage> {
        self.log.read().clone()
    }

    /// Messages published on `topic`, in order.
    pub fn messages_on(&self, topic: &str) -> Vec<BusMessage> {
        self.log
            .read()
            .iter()
            .filter(|m| m.topic == topic)
            .cloned()
            .collect()
    }

    /// Number of messages published on `topic`.
    pub fn count(&self, topic: &str) -> usize {
        self.log.read().iter().filter(|m| m.topic == topic).count()
    }

    /// Forget the recorded log. Subscribers are unaffected.
    pub fn clear(&self) {
        self.log.write().clear();
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus for InMemoryEventBus {
    fn publish(&self, topic: &str, payload: serde_json::Value) -> Result<(), BusError> {
        let message = BusMessage::new(topic, payload);
        self.log.write().push(message.clone());
        // No live subscribers is not a failure; the log still has the message.
        let _ = self.sender.send(message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn publish_records_in_order() {
        let bus = InMemoryEventBus::new();
        bus.publish("a", json!(1)).unwrap();
        bus.publish("b", json!(2)).unwrap();
        bus.publish("a", json!(3)).unwrap();

        let topics: Vec<String> = bus.messages().into_iter().map(|m| m.topic).collect();
        assert_eq!(topics, vec!["a", "b", "a"]);
        assert_eq!(bus.count("a"), 2);
        assert_eq!(bus.messages_on("a")[1].payload, json!(3));
    }

    #[test]
    fn publish_without_subscribers_succeeds() {
        let bus = InMemoryEventBus::new();
        assert!(bus.publish("a", json!(null)).is_ok());
    }

    #[tokio::test]
    async fn subscribers_receive_messages() {
        let bus = InMemoryEventBus::new();
        let mut rx = bus.subscribe();
        bus.publish("pet.created", json!({"petId": "1"})).unwrap();
        let msg = rx.recv().await.unwrap();
        assert_eq!(msg.topic, "pet.created");
        assert_eq!(msg.payload["petId"], "1");
    }

    #[test]
    fn clear_empties_log() {
        let bus = InMemoryEventBus::new();
        bus.publish("a", json!(1)).unwrap();
        bus.clear();
        assert!(bus.messages().is_empty());
    }
}
