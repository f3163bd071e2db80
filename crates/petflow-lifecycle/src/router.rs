//! # Inbound Trigger Router
//!
//! Turns messages from the bus into [`Trigger`]s for the engine.
//!
//! | topic                          | payload                                              | trigger event                 |
//! |--------------------------------|------------------------------------------------------|-------------------------------|
//! | `pet.created`                  | `{petId}`                                            | `pet.created`                 |
//! | `feeding.reminder.completed`   | `{petId}`                                            | `feeding.reminder.completed`  |
//! | `pet.status.update.requested`  | `{petId, event?, requestedStatus?, automatic?}`      | `event` or `status.update.requested` |
//!
//! `pet.created` has no rule and is rejected by the engine; it is routed so
//! the rejection is published and audited like any other.

use std::sync::Arc;

use petflow_core::PetId;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::engine::{TransitionEngine, TransitionOutcome};
use crate::error::LifecycleError;
use crate::events::LIFECYCLE_TOPIC_PREFIX;
use crate::ports::BusMessage;
use crate::table::{FEEDING_REMINDER_COMPLETED, PET_CREATED, STATUS_UPDATE_REQUESTED};
use crate::trigger::{RequestedStatus, Trigger};

/// Inbound topic announcing a newly registered pet.
pub const PET_CREATED_TOPIC: &str = "pet.created";

/// Inbound topic announcing a completed feeding setup.
pub const FEEDING_REMINDER_COMPLETED_TOPIC: &str = "feeding.reminder.completed";

/// Inbound topic carrying staff status requests.
pub const STATUS_UPDATE_REQUESTED_TOPIC: &str = "pet.status.update.requested";

/// Failure to turn a bus message into an evaluated trigger.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// No route exists for the topic.
    #[error("no lifecycle route for topic {0}")]
    UnknownTopic(String),

    /// The payload did not match the topic's shape.
    #[error("malformed payload on {topic}: {reason}")]
    MalformedPayload {
        /// Topic of the rejected message.
        topic: String,
        /// Deserialization error.
        reason: String,
    },

    /// The engine failed to evaluate the trigger.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PetRef {
    pet_id: PetId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusUpdateRequest {
    pet_id: PetId,
    #[serde(default)]
    event: Option<String>,
    #[serde(default)]
    requested_status: Option<RequestedStatus>,
    #[serde(default)]
    automatic: bool,
}

/// Routes inbound bus messages to a [`TransitionEngine`].
#[derive(Debug, Clone)]
pub struct TriggerRouter {
    engine: Arc<TransitionEngine>,
}

impl TriggerRouter {
    /// Route into `engine`.
    pub fn new(engine: Arc<TransitionEngine>) -> Self {
        Self { engine }
    }

    /// Map a message to a trigger without evaluating it.
    pub fn to_trigger(message: &BusMessage) -> Result<Trigger, DispatchError> {
        match message.topic.as_str() {
            PET_CREATED_TOPIC => {
                let PetRef { pet_id } = parse(message)?;
                Ok(Trigger::new(pet_id, PET_CREATED))
            }
            FEEDING_REMINDER_COMPLETED_TOPIC => {
                let PetRef { pet_id } = parse(message)?;
                Ok(Trigger::new(pet_id, FEEDING_REMINDER_COMPLETED))
            }
            STATUS_UPDATE_REQUESTED_TOPIC => {
                let request: StatusUpdateRequest = parse(message)?;
                let mut trigger = Trigger::new(
                    request.pet_id,
                    request
                        .event
                        .unwrap_or_else(|| STATUS_UPDATE_REQUESTED.to_string()),
                );
                trigger.requested_status = request.requested_status;
                trigger.automatic = request.automatic;
                Ok(trigger)
            }
            other => Err(DispatchError::UnknownTopic(other.to_string())),
        }
    }

    /// Map and evaluate one message.
    pub fn handle(&self, message: &BusMessage) -> Result<TransitionOutcome, DispatchError> {
        let trigger = Self::to_trigger(message)?;
        Ok(self.engine.evaluate(&trigger)?)
    }

    /// Consume `receiver` until the channel closes.
    ///
    /// Lifecycle topics published by the engine itself are skipped. Dispatch
    /// errors are logged and do not stop the loop.
    pub async fn run(self, mut receiver: broadcast::Receiver<BusMessage>) {
        loop {
            let message = match receiver.recv().await {
                Ok(message) => message,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "trigger router lagged; messages dropped");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };

            if message.topic.starts_with(LIFECYCLE_TOPIC_PREFIX) {
                continue;
            }

            match self.handle(&message) {
                Ok(outcome) => {
                    tracing::debug!(topic = %message.topic, ?outcome, "trigger routed");
                }
                Err(DispatchError::Lifecycle(err)) => {
                    tracing::error!(topic = %message.topic, error = %err, "lifecycle trigger failed");
                }
                Err(err) => {
                    tracing::warn!(topic = %message.topic, error = %err, "inbound message dropped");
                }
            }
        }
        tracing::info!("trigger router stopped: channel closed");
    }
}

fn parse<T: for<'de> Deserialize<'de>>(message: &BusMessage) -> Result<T, DispatchError> {
    serde_json::from_value(message.payload.clone()).map_err(|e| DispatchError::MalformedPayload {
        topic: message.topic.clone(),
        reason: e.to_string(),
    })
}
