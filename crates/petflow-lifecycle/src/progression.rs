//! # Automatic Progressions
//!
//! Maps the states that advance on their own to the state they advance to.
//! When a transition lands a pet in one of these states the scheduler queues
//! a delayed `status.update.requested` for the mapped target.
//!
//! | from        | to                | description                                     |
//! |-------------|-------------------|-------------------------------------------------|
//! | `healthy`   | `available`       | Automatic progression - pet ready for adoption  |
//! | `ill`       | `under_treatment` | Automatic progression - treatment started       |
//! | `recovered` | `healthy`         | Automatic progression - recovery complete       |
//!
//! The standard map is acyclic, so chains end (`recovered → healthy →
//! available` is the longest). Custom maps are checked by
//! [`ProgressionMap::validate`], and the scheduler's hop cap stops a cyclic
//! map at runtime regardless.

use std::collections::BTreeMap;

use petflow_core::PetStatus;
use serde::Serialize;

use crate::error::ConfigurationError;
use crate::table::{TransitionTable, STATUS_UPDATE_REQUESTED};

/// Where a qualifying state advances to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Progression {
    /// The state requested by the automatic trigger.
    pub to: PetStatus,
    /// Rationale, for observability only.
    pub description: String,
}

/// Qualifying state → automatic next state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressionMap {
    entries: BTreeMap<PetStatus, Progression>,
}

impl ProgressionMap {
    /// An empty map: nothing progresses automatically.
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard pet lifecycle progressions.
    pub fn standard() -> Self {
        Self::new()
            .with(
                PetStatus::Healthy,
                PetStatus::Available,
                "Automatic progression - pet ready for adoption",
            )
            .with(
                PetStatus::Ill,
                PetStatus::UnderTreatment,
                "Automatic progression - treatment started",
            )
            .with(
                PetStatus::Recovered,
                PetStatus::Healthy,
                "Automatic progression - recovery complete",
            )
    }

    /// Builder: add or replace the progression out of `from`.
    pub fn with(mut self, from: PetStatus, to: PetStatus, description: impl Into<String>) -> Self {
        self.entries.insert(
            from,
            Progression {
                to,
                description: description.into(),
            },
        );
        self
    }

    /// The progression out of `state`, if it qualifies.
    pub fn get(&self, state: PetStatus) -> Option<&Progression> {
        self.entries.get(&state)
    }

    /// Number of qualifying states.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no state qualifies.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(from, progression)` pairs in status order.
    pub fn iter(&self) -> impl Iterator<Item = (PetStatus, &Progression)> {
        self.entries.iter().map(|(from, p)| (*from, p))
    }

    /// Follow the chain starting at `start`, returning the first cycle found.
    ///
    /// The returned path starts and ends with the same state.
    pub fn cycle_from(&self, start: PetStatus) -> Option<Vec<PetStatus>> {
        let mut path = vec![start];
        let mut current = start;
        while let Some(progression) = self.get(current) {
            current = progression.to;
            if let Some(pos) = path.iter().position(|s| *s == current) {
                let mut cycle = path.split_off(pos);
                cycle.push(current);
                return Some(cycle);
            }
            path.push(current);
        }
        None
    }

    /// Check the map against a transition table.
    ///
    /// # Errors
    ///
    /// - [`ConfigurationError::ProgressionWithoutRule`] if a progression asks
    ///   for a transition the table would reject.
    /// - [`ConfigurationError::ProgressionCycle`] if following progressions
    ///   can return to a state already visited.
    pub fn validate(&self, table: &TransitionTable) -> Result<(), ConfigurationError> {
        for (from, progression) in self.iter() {
            if !table.allows(from, progression.to, STATUS_UPDATE_REQUESTED) {
                return Err(ConfigurationError::ProgressionWithoutRule {
                    from,
                    to: progression.to,
                });
            }
        }
        for (from, _) in self.iter() {
            if let Some(path) = self.cycle_from(from) {
                return Err(ConfigurationError::ProgressionCycle { path });
            }
        }
        Ok(())
    }
}
