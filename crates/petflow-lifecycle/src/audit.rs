//! # Lifecycle Audit Trail
//!
//! Records every trigger the engine sees and every decision it makes, so an
//! operator can reconstruct why a pet is in its current state.
//!
//! The trail is append-only and bounded. When it exceeds its configured
//! maximum the oldest 10% of entries are trimmed; anything that must outlive
//! that window has to be shipped elsewhere first.

use chrono::{DateTime, Utc};
use petflow_core::PetId;
use serde::{Deserialize, Serialize};

/// The kind of audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEntryType {
    /// A trigger reached the engine.
    TriggerReceived,
    /// A transition was applied.
    TransitionApplied,
    /// A trigger was rejected.
    TransitionRejected,
    /// The pet was already at the rule's target.
    AlreadyAtTarget,
    /// The trigger named a pet the store does not hold.
    EntityMissing,
    /// The status write found no pet.
    UpdateFailed,
    /// An automatic progression was queued.
    ProgressionScheduled,
    /// A queued progression fired.
    ProgressionFired,
    /// A queued progression found the pet had moved on.
    ProgressionStale,
    /// The hop cap stopped an automatic chain.
    ProgressionHalted,
}

impl AuditEntryType {
    /// Return the string value for serialization.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TriggerReceived => "trigger_received",
            Self::TransitionApplied => "transition_applied",
            Self::TransitionRejected => "transition_rejected",
            Self::AlreadyAtTarget => "already_at_target",
            Self::EntityMissing => "entity_missing",
            Self::UpdateFailed => "update_failed",
            Self::ProgressionScheduled => "progression_scheduled",
            Self::ProgressionFired => "progression_fired",
            Self::ProgressionStale => "progression_stale",
            Self::ProgressionHalted => "progression_halted",
        }
    }
}

impl std::fmt::Display for AuditEntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// The kind of event.
    pub entry_type: AuditEntryType,
    /// When it happened.
    pub timestamp: DateTime<Utc>,
    /// The pet concerned.
    pub pet_id: PetId,
    /// Structured detail.
    pub metadata: Option<serde_json::Value>,
}

impl AuditEntry {
    /// Build an entry.
    pub fn new(
        entry_type: AuditEntryType,
        timestamp: DateTime<Utc>,
        pet_id: PetId,
        metadata: Option<serde_json::Value>,
    ) -> Self {
        Self {
            entry_type,
            timestamp,
            pet_id,
            metadata,
        }
    }
}

/// An append-only audit trail with a configurable capacity.
///
/// Appending takes `&mut self`; the engine shares it behind a mutex.
#[derive(Debug)]
pub struct AuditTrail {
    entries: Vec<AuditEntry>,
    max_entries: usize,
}

impl AuditTrail {
    /// Create a trail holding at most `max_entries` entries.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_entries: max_entries.max(1),
        }
    }

    /// Append an entry, trimming the oldest 10% on overflow.
    pub fn append(&mut self, entry: AuditEntry) {
        self.entries.push(entry);
        if self.entries.len() > self.max_entries {
            let trim_count = (self.max_entries / 10).max(1);
            self.entries.drain(..trim_count);
        }
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the trail is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries about one pet.
    pub fn entries_for_pet(&self, pet_id: &PetId) -> Vec<&AuditEntry> {
        self.entries.iter().filter(|e| &e.pet_id == pet_id).collect()
    }

    /// Entries of one kind.
    pub fn entries_by_type(&self, entry_type: AuditEntryType) -> Vec<&AuditEntry> {
        self.entries
            .iter()
            .filter(|e| e.entry_type == entry_type)
            .collect()
    }
}
