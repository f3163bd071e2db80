//! # Error Hierarchy
//!
//! Structured error types for petflow, built with `thiserror`.
//! No `Box<dyn Error>`, no `.unwrap()` outside tests.

use thiserror::Error;

/// Top-level error type for petflow foundational operations.
#[derive(Error, Debug)]
pub enum PetflowError {
    /// Domain primitive validation failure.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Validation errors for domain primitives.
///
/// Each variant carries the rejected input where there is one, so operators
/// can see what arrived without digging through payloads.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Pet identifiers must be non-empty.
    #[error("invalid pet ID: must be non-empty")]
    EmptyPetId,

    /// Pet names must be non-empty after trimming.
    #[error("invalid pet name: must be non-empty")]
    EmptyPetName,

    /// Status string is not one of the lifecycle states.
    #[error("unknown pet status: \"{0}\"")]
    UnknownStatus(String),

    /// Species string is not recognised.
    #[error("unknown species: \"{0}\" (expected dog, cat, bird, or other)")]
    UnknownSpecies(String),
}
