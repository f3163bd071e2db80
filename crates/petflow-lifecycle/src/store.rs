//! # In-Memory Pet Store
//!
//! Thread-safe, cloneable pet store implementing [`EntityStore`], plus the
//! registration and deletion operations that live outside the lifecycle core.
//!
//! All operations are synchronous (the RwLock is `parking_lot`, not
//! `tokio::sync`) because the lock is never held across `.await` points.
//! `parking_lot::RwLock` is non-poisonable; a panicking writer does not
//! permanently corrupt the store.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use petflow_core::{NewPet, Pet, PetId, PetStatus, ValidationError};

use crate::ports::EntityStore;

/// In-memory pet store keyed by [`PetId`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryPetStore {
    data: Arc<RwLock<HashMap<PetId, Pet>>>,
}

impl InMemoryPetStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pet in the `new` status under a freshly minted id.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyPetName`] for a blank name.
    pub fn create(&self, input: NewPet) -> Result<Pet, ValidationError> {
        self.create_with_id(PetId::generate(), input)
    }

    /// Register a pet under a caller-chosen id, replacing any existing record.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyPetName`] for a blank name.
    pub fn create_with_id(&self, id: PetId, input: NewPet) -> Result<Pet, ValidationError> {
        let pet = Pet::register(id, input.normalized()?, Utc::now());
        self.data.write().insert(pet.id.clone(), pet.clone());
        Ok(pet)
    }

    /// Insert or replace a full record.
    pub fn insert(&self, pet: Pet) -> Option<Pet> {
        self.data.write().insert(pet.id.clone(), pet)
    }

    /// All pets, most recently updated first.
    pub fn list(&self) -> Vec<Pet> {
        let mut pets: Vec<Pet> = self.data.read().values().cloned().collect();
        pets.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        pets
    }

    /// Mark a pet deleted and schedule it for purge after `retention`.
    ///
    /// A retention that overflows the calendar saturates, so the pet is
    /// never purged. Returns the updated record, or `None` if the pet does
    /// not exist.
    pub fn soft_delete(&self, id: &PetId, retention: Duration, now: DateTime<Utc>) -> Option<Pet> {
        let mut guard = self.data.write();
        let pet = guard.get_mut(id)?;
        pet.status = PetStatus::Deleted;
        pet.deleted_at = Some(now);
        let purge_at = now
            .checked_add_signed(retention)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        pet.purge_at = Some(purge_at);
        pet.updated_at = now;
        Some(pet.clone())
    }

    /// Remove every soft-deleted pet whose purge time has passed.
    ///
    /// Returns the purged records.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> Vec<Pet> {
        let mut guard = self.data.write();
        let expired: Vec<PetId> = guard
            .values()
            .filter(|pet| pet.is_purgeable(now))
            .map(|pet| pet.id.clone())
            .collect();
        let purged: Vec<Pet> = expired.iter().filter_map(|id| guard.remove(id)).collect();
        if !purged.is_empty() {
            tracing::info!(count = purged.len(), "purged soft-deleted pets");
        }
        purged
    }

    /// Remove a pet outright.
    pub fn remove(&self, id: &PetId) -> Option<Pet> {
        self.data.write().remove(id)
    }

    /// Number of stored pets.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EntityStore for InMemoryPetStore {
    fn get(&self, id: &PetId) -> Option<Pet> {
        self.data.read().get(id).cloned()
    }

    fn update_status(&self, id: &PetId, status: PetStatus) -> Option<Pet> {
        let mut guard = self.data.write();
        let pet = guard.get_mut(id)?;
        pet.status = status;
        pet.updated_at = Utc::now();
        Some(pet.clone())
    }
}
