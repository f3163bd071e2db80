//! # Outbound Lifecycle Events
//!
//! Payloads the engine publishes on the event bus. Field names are camelCase
//! on the wire so existing subscribers keep working.

use chrono::{DateTime, Utc};
use petflow_core::{PetId, PetStatus};
use serde::{Deserialize, Serialize};

use crate::trigger::RequestedStatus;

/// Topic for accepted transitions.
pub const TRANSITION_COMPLETED: &str = "lifecycle.transition.completed";

/// Topic for rejected transitions.
pub const TRANSITION_REJECTED: &str = "lifecycle.transition.rejected";

/// Topic for automatic chains stopped by the hop cap.
pub const PROGRESSION_HALTED: &str = "lifecycle.progression.halted";

/// Prefix shared by every topic this crate publishes.
pub const LIFECYCLE_TOPIC_PREFIX: &str = "lifecycle.";

/// Why a trigger was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectionReason {
    /// The caller named a target that no rule reaches from the current state.
    InvalidTarget {
        /// Current status.
        from: PetStatus,
        /// Requested status, as the caller named it.
        requested: RequestedStatus,
    },
    /// No rule handles this event from the current state.
    NoMatchingRule {
        /// Event name.
        trigger_event: String,
        /// Current status.
        from: PetStatus,
    },
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTarget { from, requested } => {
                write!(f, "Invalid transition: cannot change from {from} to {requested}")
            }
            Self::NoMatchingRule {
                trigger_event,
                from,
            } => write!(f, "No transition rule found for {trigger_event} from {from}"),
        }
    }
}

/// Payload of [`TRANSITION_COMPLETED`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionCompleted {
    /// The pet that moved.
    pub entity_id: PetId,
    /// Status before.
    pub old_status: PetStatus,
    /// Status after.
    pub new_status: PetStatus,
    /// Event that invoked the rule.
    pub trigger_event: String,
    /// Rule rationale.
    pub description: String,
    /// Whether the scheduler originated the trigger.
    pub automatic: bool,
    /// When the transition was applied.
    pub timestamp: DateTime<Utc>,
}

/// Payload of [`TRANSITION_REJECTED`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRejected {
    /// The pet the trigger addressed.
    pub entity_id: PetId,
    /// Status at evaluation time (unchanged).
    pub current_status: PetStatus,
    /// Requested status as received, if any.
    pub requested_status: Option<RequestedStatus>,
    /// Event name.
    pub trigger_event: String,
    /// Human-readable reason.
    pub reason: String,
    /// When the rejection was decided.
    pub timestamp: DateTime<Utc>,
}

/// Payload of [`PROGRESSION_HALTED`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressionHalted {
    /// The pet whose chain stopped.
    pub entity_id: PetId,
    /// Status the pet was left in.
    pub state: PetStatus,
    /// Automatic hops taken.
    pub hops: u32,
    /// Configured cap.
    pub max_hops: u32,
    /// Human-readable reason.
    pub reason: String,
    /// When the chain was halted.
    pub timestamp: DateTime<Utc>,
}
