//! # Auto-Progression Scheduler
//!
//! Queues delayed re-evaluations for pets that land in a qualifying state
//! of the [`ProgressionMap`]. Scheduling only records a
//! [`PendingAutoProgression`] and returns; nothing runs until
//! [`TransitionEngine::fire_due`](crate::engine::TransitionEngine::fire_due)
//! drains the items whose `due_at` has passed.
//!
//! There is no cancellation on state change. Each item remembers the state
//! it was scheduled from, and firing re-reads the pet and drops the item if
//! the pet has moved on. [`AutoProgressionScheduler::cancel_for`] exists for
//! operators and for pets that are removed outright.
//!
//! ## Hop cap
//!
//! Every item carries the number of automatic hops its chain has taken.
//! Scheduling a hop beyond `max_hops` fails with
//! [`ConfigurationError::RunawayProgression`] instead of queueing, so a
//! cyclic map stops after a bounded number of transitions.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use petflow_core::{PetId, PetStatus};
use serde::Serialize;

use crate::error::{ConfigurationError, LifecycleError};
use crate::engine::TransitionOutcome;
use crate::progression::ProgressionMap;

/// A queued automatic re-evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingAutoProgression {
    /// The pet to re-evaluate.
    pub pet_id: PetId,
    /// Status the pet must still hold when the item fires.
    pub expected_state: PetStatus,
    /// Status the automatic trigger requests.
    pub next_state: PetStatus,
    /// Progression rationale.
    pub description: String,
    /// Position of this hop in its chain, starting at 1.
    pub hop: u32,
    /// When the item was queued.
    pub scheduled_at: DateTime<Utc>,
    /// Earliest time the item may fire.
    pub due_at: DateTime<Utc>,
}

/// What happened after a transition as far as automatic progression goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowUp {
    /// The new state does not progress automatically.
    None,
    /// A re-evaluation was queued.
    Scheduled(PendingAutoProgression),
    /// An identical item was already queued for this pet and state.
    AlreadyPending,
    /// The hop cap stopped the chain.
    Halted(ConfigurationError),
}

/// Result of firing one due item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressionReport {
    /// The pet was still in the expected state and the trigger was evaluated.
    Fired {
        /// The item that fired.
        pending: PendingAutoProgression,
        /// What the engine did with the automatic trigger.
        outcome: Result<TransitionOutcome, LifecycleError>,
    },
    /// The pet had moved on or disappeared; nothing was evaluated.
    Stale {
        /// The dropped item.
        pending: PendingAutoProgression,
        /// Status found at fire time, `None` if the pet is gone.
        actual: Option<PetStatus>,
    },
}

impl ProgressionReport {
    /// The item this report is about.
    pub fn pending(&self) -> &PendingAutoProgression {
        match self {
            Self::Fired { pending, .. } | Self::Stale { pending, .. } => pending,
        }
    }

    /// Whether the item was dropped as stale.
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale { .. })
    }
}

/// Owner of all queued automatic progressions.
#[derive(Debug)]
pub struct AutoProgressionScheduler {
    map: ProgressionMap,
    delay: Duration,
    max_hops: u32,
    queue: Mutex<Vec<PendingAutoProgression>>,
}

impl AutoProgressionScheduler {
    /// Create a scheduler for `map` with the given delay and hop cap.
    pub fn new(map: ProgressionMap, delay: std::time::Duration, max_hops: u32) -> Self {
        let millis = i64::try_from(delay.as_millis()).unwrap_or(i64::MAX);
        Self {
            map,
            delay: Duration::milliseconds(millis),
            max_hops,
            queue: Mutex::new(Vec::new()),
        }
    }

    /// The progression map in use.
    pub fn map(&self) -> &ProgressionMap {
        &self.map
    }

    /// The configured hop cap.
    pub fn max_hops(&self) -> u32 {
        self.max_hops
    }

    /// The configured delay.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Queue a re-evaluation if `current` progresses automatically.
    ///
    /// `hops` is the number of automatic hops already taken by the chain
    /// that brought the pet into `current` (zero for an external trigger).
    pub fn maybe_schedule(
        &self,
        pet_id: &PetId,
        current: PetStatus,
        hops: u32,
        now: DateTime<Utc>,
    ) -> Result<FollowUp, ConfigurationError> {
        let Some(progression) = self.map.get(current) else {
            return Ok(FollowUp::None);
        };

        let hop = hops.saturating_add(1);
        if hop > self.max_hops {
            return Err(ConfigurationError::RunawayProgression {
                pet_id: pet_id.clone(),
                state: current,
                hops,
                max_hops: self.max_hops,
            });
        }

        let mut queue = self.queue.lock();
        if queue
            .iter()
            .any(|p| &p.pet_id == pet_id && p.expected_state == current)
        {
            tracing::debug!(pet_id = %pet_id, state = %current, "auto-progression already pending");
            return Ok(FollowUp::AlreadyPending);
        }

        let pending = PendingAutoProgression {
            pet_id: pet_id.clone(),
            expected_state: current,
            next_state: progression.to,
            description: progression.description.clone(),
            hop,
            scheduled_at: now,
            due_at: now.checked_add_signed(self.delay).unwrap_or(DateTime::<Utc>::MAX_UTC),
        };
        queue.push(pending.clone());

        tracing::info!(
            pet_id = %pet_id,
            from = %current,
            to = %pending.next_state,
            hop,
            due_at = %pending.due_at,
            "auto-progression scheduled"
        );
        Ok(FollowUp::Scheduled(pending))
    }

    /// Remove and return every item due at or before `now`, earliest first.
    pub fn take_due(&self, now: DateTime<Utc>) -> Vec<PendingAutoProgression> {
        let mut queue = self.queue.lock();
        let (mut due, waiting): (Vec<_>, Vec<_>) =
            queue.drain(..).partition(|p| p.due_at <= now);
        *queue = waiting;
        due.sort_by_key(|p| p.due_at);
        due
    }

    /// Snapshot of everything still queued, in scheduling order.
    pub fn pending(&self) -> Vec<PendingAutoProgression> {
        self.queue.lock().clone()
    }

    /// Items queued for one pet.
    pub fn pending_for(&self, pet_id: &PetId) -> Vec<PendingAutoProgression> {
        self.queue
            .lock()
            .iter()
            .filter(|p| &p.pet_id == pet_id)
            .cloned()
            .collect()
    }

    /// Drop every item for `pet_id`. Returns how many were dropped.
    pub fn cancel_for(&self, pet_id: &PetId) -> usize {
        let mut queue = self.queue.lock();
        let before = queue.len();
        queue.retain(|p| &p.pet_id != pet_id);
        before - queue.len()
    }

    /// Earliest `due_at` in the queue.
    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.queue.lock().iter().map(|p| p.due_at).min()
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}
