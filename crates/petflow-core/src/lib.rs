#![deny(missing_docs)]

//! # petflow-core: Foundational Types for petflow
//!
//! This crate defines the types every other crate in the workspace depends on.
//! It has no internal crate dependencies, only `serde`, `serde_json`,
//! `thiserror`, `chrono`, and `uuid` from the external ecosystem.
//!
//! ## Design Principles
//!
//! 1. **Newtype identifiers.** A [`PetId`] is validated at construction and
//!    cannot be confused with an arbitrary string.
//!
//! 2. **Single [`PetStatus`] enum.** One definition of the lifecycle states,
//!    exhaustive `match` everywhere, snake_case on the wire.
//!
//! 3. **[`PetflowError`] hierarchy.** Structured errors with `thiserror`. No
//!    `Box<dyn Error>`, no `.unwrap()` outside tests.

pub mod error;
pub mod identity;
pub mod pet;
pub mod status;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{PetflowError, ValidationError};
pub use identity::PetId;
pub use pet::{NewPet, Pet, Species};
pub use status::PetStatus;
