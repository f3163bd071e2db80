//! # Triggers
//!
//! A trigger is a request to evaluate one transition for one pet. Triggers
//! are ephemeral: they are built from an inbound message or by the
//! scheduler, handed to the engine, and dropped.
//!
//! The requested status arrives as a plain string. Names outside
//! [`PetStatus`] are kept as [`RequestedStatus::Unknown`] so the engine can
//! reject them like any other unreachable target.

use petflow_core::{PetId, PetStatus};
use serde::{Deserialize, Serialize};

use crate::table::STATUS_UPDATE_REQUESTED;

/// A requested target status as the caller spelled it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RequestedStatus {
    /// One of the lifecycle statuses.
    Known(PetStatus),
    /// A name no status carries.
    Unknown(String),
}

impl RequestedStatus {
    /// The status, when the name is known.
    pub fn known(&self) -> Option<PetStatus> {
        match self {
            Self::Known(status) => Some(*status),
            Self::Unknown(_) => None,
        }
    }

    /// The name as received.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Known(status) => status.as_str(),
            Self::Unknown(raw) => raw,
        }
    }
}

impl From<PetStatus> for RequestedStatus {
    fn from(status: PetStatus) -> Self {
        Self::Known(status)
    }
}

impl From<String> for RequestedStatus {
    fn from(raw: String) -> Self {
        match raw.parse::<PetStatus>() {
            Ok(status) => Self::Known(status),
            Err(_) => Self::Unknown(raw),
        }
    }
}

impl From<RequestedStatus> for String {
    fn from(requested: RequestedStatus) -> Self {
        match requested {
            RequestedStatus::Known(status) => status.as_str().to_string(),
            RequestedStatus::Unknown(raw) => raw,
        }
    }
}

impl std::fmt::Display for RequestedStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An inbound request to evaluate a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trigger {
    /// The pet to transition.
    #[serde(rename = "entityId")]
    pub pet_id: PetId,
    /// Event name matched against the transition table.
    pub trigger_event: String,
    /// Explicit target status, if the caller named one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_status: Option<RequestedStatus>,
    /// `true` when the scheduler generated this trigger.
    #[serde(default)]
    pub automatic: bool,
    /// Automatic hops already taken in the chain this trigger belongs to.
    /// Zero for externally originated triggers.
    #[serde(default)]
    pub hops: u32,
}

impl Trigger {
    /// An external trigger with no explicit target.
    pub fn new(pet_id: PetId, trigger_event: impl Into<String>) -> Self {
        Self {
            pet_id,
            trigger_event: trigger_event.into(),
            requested_status: None,
            automatic: false,
            hops: 0,
        }
    }

    /// An external `status.update.requested` trigger for `requested`.
    pub fn status_update(pet_id: PetId, requested: PetStatus) -> Self {
        Self::new(pet_id, STATUS_UPDATE_REQUESTED).with_requested(requested)
    }

    /// A scheduler-generated `status.update.requested` trigger.
    pub fn automatic(pet_id: PetId, requested: PetStatus, hops: u32) -> Self {
        Self {
            automatic: true,
            hops,
            ..Self::status_update(pet_id, requested)
        }
    }

    /// Builder: set the requested status.
    pub fn with_requested(mut self, requested: impl Into<RequestedStatus>) -> Self {
        self.requested_status = Some(requested.into());
        self
    }

    /// The requested status, when one was named and is known.
    pub fn requested_known(&self) -> Option<PetStatus> {
        self.requested_status.as_ref().and_then(RequestedStatus::known)
    }
}
