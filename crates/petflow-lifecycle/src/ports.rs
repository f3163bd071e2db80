//! # Collaborator Capabilities
//!
//! The engine talks to storage and messaging only through these traits. Both
//! are always present: a deployment without a bus passes [`NoopEventBus`]
//! rather than leaving the capability out.
//!
//! Implementations must not block indefinitely. A call that cannot complete
//! returns promptly (`None` or `Err`).

use petflow_core::{Pet, PetId, PetStatus};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Point reads and status writes against the pet store.
pub trait EntityStore: Send + Sync {
    /// Read a pet by id.
    fn get(&self, id: &PetId) -> Option<Pet>;

    /// Overwrite a pet's status. Returns the updated pet, or `None` if the
    /// id is no longer present.
    fn update_status(&self, id: &PetId, status: PetStatus) -> Option<Pet>;
}

/// A message as it travels over the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusMessage {
    /// Topic name.
    pub topic: String,
    /// Opaque JSON payload.
    pub payload: serde_json::Value,
}

impl BusMessage {
    /// Build a message.
    pub fn new(topic: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            topic: topic.into(),
            payload,
        }
    }
}

/// Failure to hand a message to the bus.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    /// The bus refused or could not deliver the message.
    #[error("publish to {topic} failed: {reason}")]
    PublishFailed {
        /// Topic that was being published.
        topic: String,
        /// Why.
        reason: String,
    },
}

/// At-least-once publish of named topics.
pub trait EventBus: Send + Sync {
    /// Publish `payload` on `topic`.
    fn publish(&self, topic: &str, payload: serde_json::Value) -> Result<(), BusError>;
}

/// An [`EventBus`] that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventBus;

impl EventBus for NoopEventBus {
    fn publish(&self, topic: &str, _payload: serde_json::Value) -> Result<(), BusError> {
        tracing::trace!(topic, "no event bus configured; dropping message");
        Ok(())
    }
}
