//! Shared fixtures for the lifecycle integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::Duration;
use petflow_core::{NewPet, PetId, PetStatus, Species};
use petflow_lifecycle::{
    EntityStore, InMemoryEventBus, InMemoryPetStore, LifecycleConfig, ManualClock,
    ProgressionMap, ProgressionReport, TransitionEngine,
};
use tracing_subscriber::EnvFilter;

/// Install a test-writer subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A wired engine over in-memory collaborators and a manual clock.
pub struct Harness {
    pub store: InMemoryPetStore,
    pub bus: InMemoryEventBus,
    pub clock: ManualClock,
    pub engine: Arc<TransitionEngine>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(ProgressionMap::standard(), LifecycleConfig::default())
    }

    pub fn with(progressions: ProgressionMap, config: LifecycleConfig) -> Self {
        init_tracing();
        let store = InMemoryPetStore::new();
        let bus = InMemoryEventBus::new();
        let clock = ManualClock::default();
        let engine = TransitionEngine::builder(Arc::new(store.clone()))
            .bus(Arc::new(bus.clone()))
            .clock(Arc::new(clock.clone()))
            .progressions(progressions)
            .config(config)
            .build();
        Self {
            store,
            bus,
            clock,
            engine: Arc::new(engine),
        }
    }

    /// Register a pet and force it into `status`.
    pub fn add_pet(&self, status: PetStatus) -> PetId {
        let pet = self
            .store
            .create(NewPet {
                name: "Biscuit".into(),
                species: Species::Dog,
                age_months: 18,
            })
            .unwrap();
        if status != PetStatus::New {
            self.store.update_status(&pet.id, status).unwrap();
        }
        pet.id
    }

    pub fn status(&self, id: &PetId) -> PetStatus {
        self.store.get(id).unwrap().status
    }

    /// Move the clock past the configured delay and fire what is due.
    pub fn advance_and_fire(&self) -> Vec<ProgressionReport> {
        let delay = self.engine.config().auto_progression_delay;
        self.clock
            .advance(Duration::milliseconds(delay.as_millis() as i64 + 1));
        self.engine.fire_due()
    }
}
