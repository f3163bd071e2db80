//! # Per-Pet Mutual Exclusion
//!
//! Every read-decide-write sequence for a pet runs while holding that pet's
//! lock. The registry holds an entry only while a pet is locked, so it never
//! grows beyond the number of pets with work in flight.

use std::collections::HashSet;

use parking_lot::{Condvar, Mutex};
use petflow_core::PetId;

/// Registry of per-pet locks.
#[derive(Debug, Default)]
pub struct EntityLocks {
    held: Mutex<HashSet<PetId>>,
    released: Condvar,
}

impl EntityLocks {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until `id` is free, then hold it until the guard drops.
    pub fn acquire(&self, id: &PetId) -> EntityGuard<'_> {
        let mut held = self.held.lock();
        while held.contains(id) {
            self.released.wait(&mut held);
        }
        held.insert(id.clone());
        EntityGuard {
            registry: self,
            id: id.clone(),
        }
    }

    /// Number of pets currently locked.
    pub fn active(&self) -> usize {
        self.held.lock().len()
    }

    fn release(&self, id: &PetId) {
        self.held.lock().remove(id);
        self.released.notify_all();
    }
}

/// Exclusive access to one pet. Released on drop.
#[derive(Debug)]
pub struct EntityGuard<'a> {
    registry: &'a EntityLocks,
    id: PetId,
}

impl EntityGuard<'_> {
    /// The pet this guard covers.
    pub fn pet_id(&self) -> &PetId {
        &self.id
    }
}

impl Drop for EntityGuard<'_> {
    fn drop(&mut self) {
        self.registry.release(&self.id);
    }
}
