//! # Lifecycle Errors
//!
//! Failures the engine reports to its caller. None of them is fatal: the
//! engine has already logged and audited the failure by the time the caller
//! sees it, and the caller (usually the bus loop) is free to drop it.
//!
//! Rejections are not errors. A trigger that no rule accepts is a normal
//! [`TransitionOutcome::Rejected`](crate::engine::TransitionOutcome::Rejected).

use petflow_core::{PetId, PetStatus};
use thiserror::Error;

/// Errors from evaluating a trigger.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// The trigger referenced a pet the store does not hold.
    #[error("pet {pet_id} not found for lifecycle transition")]
    EntityNotFound {
        /// The missing pet.
        pet_id: PetId,
    },

    /// The store no longer held the pet when the new status was written.
    #[error("failed to update pet {pet_id} status from {from} to {to}: pet vanished")]
    UpdateFailed {
        /// The pet whose write was lost.
        pet_id: PetId,
        /// Status read before the write.
        from: PetStatus,
        /// Status the write tried to set.
        to: PetStatus,
    },

    /// The automatic progression configuration misbehaved.
    #[error("lifecycle configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
}

/// Misconfiguration of the automatic progression map.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// A chain of automatic progressions exceeded the hop cap.
    #[error(
        "automatic progression for pet {pet_id} halted at {state} after {hops} hops (max {max_hops})"
    )]
    RunawayProgression {
        /// The pet whose chain was halted.
        pet_id: PetId,
        /// The state the pet was left in.
        state: PetStatus,
        /// Automatic hops already taken in this chain.
        hops: u32,
        /// Configured cap.
        max_hops: u32,
    },

    /// Following the progression map returns to a state already visited.
    #[error("automatic progression cycle: {}", format_path(.path))]
    ProgressionCycle {
        /// The cycle, starting and ending with the same state.
        path: Vec<PetStatus>,
    },

    /// A progression requests a transition the table does not allow.
    #[error("automatic progression {from} -> {to} has no matching transition rule")]
    ProgressionWithoutRule {
        /// Qualifying state.
        from: PetStatus,
        /// Requested target.
        to: PetStatus,
    },
}

fn format_path(path: &[PetStatus]) -> String {
    path.iter()
        .map(PetStatus::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Errors loading [`LifecycleConfig`](crate::config::LifecycleConfig).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable held a value that could not be used.
    #[error("invalid value \"{value}\" for {var}: {reason}")]
    InvalidValue {
        /// Variable name.
        var: String,
        /// Raw value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}
