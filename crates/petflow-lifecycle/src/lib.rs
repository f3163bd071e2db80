//! # petflow-lifecycle: Pet Lifecycle State Machine
//!
//! Moves pets through their shelter lifecycle in response to triggers from
//! the bus, from staff, and from its own scheduler.
//!
//! ## Architecture
//!
//! - **Table** (`table.rs`): the ordered `(state, event) → next state` rules.
//!
//! - **Engine** (`engine.rs`): evaluates one trigger under the pet's lock,
//!   writes the new status and publishes the outcome.
//!
//! - **Scheduler** (`scheduler.rs`) and **Progressions** (`progression.rs`):
//!   delayed automatic re-evaluation for `healthy`, `ill` and `recovered`,
//!   with a staleness check at fire time and a hop cap.
//!
//! - **Driver** (`driver.rs`) and **Router** (`router.rs`): the tokio tasks
//!   that fire due progressions and feed inbound bus messages to the engine.
//!
//! - **Ports** (`ports.rs`): the `EntityStore` and `EventBus` capabilities,
//!   with in-memory implementations in `store.rs` and `bus.rs`.
//!
//! - **Audit** (`audit.rs`): bounded trail of every trigger and decision.
//!
//! ## Crate Policy
//!
//! - Depends on `petflow-core` internally.
//! - Time is read only through [`Clock`], so tests fast-forward scheduled
//!   work with [`ManualClock`] and [`TransitionEngine::fire_due`].
//! - Rejections are outcomes, not errors. [`LifecycleError`] is reserved for
//!   missing pets, lost writes and configuration faults.

pub mod audit;
pub mod bus;
pub mod clock;
pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod events;
pub mod locks;
pub mod ports;
pub mod progression;
pub mod router;
pub mod scheduler;
pub mod store;
pub mod table;
pub mod trigger;

pub use audit::{AuditEntry, AuditEntryType, AuditTrail};
pub use bus::InMemoryEventBus;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::LifecycleConfig;
pub use driver::ProgressionDriver;
pub use engine::{TransitionEngine, TransitionEngineBuilder, TransitionOutcome};
pub use error::{ConfigError, ConfigurationError, LifecycleError};
pub use events::RejectionReason;
pub use ports::{BusError, BusMessage, EntityStore, EventBus, NoopEventBus};
pub use progression::{Progression, ProgressionMap};
pub use router::{DispatchError, TriggerRouter};
pub use scheduler::{AutoProgressionScheduler, FollowUp, PendingAutoProgression, ProgressionReport};
pub use store::InMemoryPetStore;
pub use table::{TransitionRule, TransitionTable};
pub use trigger::{RequestedStatus, Trigger};
