//! # Transition Engine
//!
//! Evaluates triggers against the [`TransitionTable`] and applies the
//! resulting status change through the [`EntityStore`].
//!
//! ## Evaluation
//!
//! Under the pet's lock:
//!
//! 1. Read the pet. Missing: [`LifecycleError::EntityNotFound`].
//! 2. Look up the rule for (status, event, requested status). A requested
//!    name outside [`PetStatus`] matches no rule.
//! 3. No rule: publish `lifecycle.transition.rejected` and return
//!    [`TransitionOutcome::Rejected`]. The pet is untouched.
//! 4. Rule target equals current status, or the trigger requests the status
//!    the pet already holds and some rule for the event leads into it:
//!    [`TransitionOutcome::AlreadyAtTarget`]. No write and no event. So a
//!    `healthy` pet asked for `healthy` is a duplicate, not a rejection,
//!    because `in_quarantine -> healthy` exists. A status no rule enters,
//!    such as `new`, is still rejected when requested again.
//! 5. Write the new status. A write that finds no pet is
//!    [`LifecycleError::UpdateFailed`].
//! 6. Publish `lifecycle.transition.completed`, then hand the new state to
//!    the [`AutoProgressionScheduler`].
//!
//! Bus failures are logged and never undo a write. The engine does not retry.
//!
//! ## Firing scheduled progressions
//!
//! [`TransitionEngine::fire_due`] drains due items from the scheduler. Each
//! item takes the pet's lock, re-reads the pet, and is evaluated as an
//! ordinary `status.update.requested` trigger only if the pet still holds the
//! state the item was scheduled from.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use petflow_core::{Pet, PetId, PetStatus};
use serde::Serialize;

use crate::audit::{AuditEntry, AuditEntryType, AuditTrail};
use crate::clock::{Clock, SystemClock};
use crate::config::LifecycleConfig;
use crate::error::{ConfigError, ConfigurationError, LifecycleError};
use crate::events::{
    ProgressionHalted, RejectionReason, TransitionCompleted, TransitionRejected,
    PROGRESSION_HALTED, TRANSITION_COMPLETED, TRANSITION_REJECTED,
};
use crate::locks::EntityLocks;
use crate::ports::{EntityStore, EventBus, NoopEventBus};
use crate::progression::ProgressionMap;
use crate::scheduler::{
    AutoProgressionScheduler, FollowUp, PendingAutoProgression, ProgressionReport,
};
use crate::table::{TransitionRule, TransitionTable};
use crate::trigger::{RequestedStatus, Trigger};

/// Result of evaluating one trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The status changed.
    Applied {
        /// Status before.
        from: PetStatus,
        /// Status after.
        to: PetStatus,
        /// The rule that was applied.
        rule: &'static TransitionRule,
        /// What the scheduler did with the new state.
        follow_up: FollowUp,
    },
    /// The rule's target was already the current status.
    AlreadyAtTarget(PetStatus),
    /// No rule accepted the trigger.
    Rejected(RejectionReason),
}

impl TransitionOutcome {
    /// Whether a status change was written.
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    /// Whether the trigger was rejected.
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    /// The pet's status after evaluation, when the outcome determines it.
    pub fn resulting_status(&self) -> Option<PetStatus> {
        match self {
            Self::Applied { to, .. } => Some(*to),
            Self::AlreadyAtTarget(status) => Some(*status),
            Self::Rejected(_) => None,
        }
    }
}

/// Builder for [`TransitionEngine`].
pub struct TransitionEngineBuilder {
    store: Arc<dyn EntityStore>,
    bus: Arc<dyn EventBus>,
    clock: Arc<dyn Clock>,
    table: TransitionTable,
    progressions: ProgressionMap,
    config: LifecycleConfig,
}

impl TransitionEngineBuilder {
    /// Publish events on `bus` instead of dropping them.
    pub fn bus(mut self, bus: Arc<dyn EventBus>) -> Self {
        self.bus = bus;
        self
    }

    /// Read time from `clock`.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use a custom transition table.
    pub fn table(mut self, table: TransitionTable) -> Self {
        self.table = table;
        self
    }

    /// Use a custom progression map.
    pub fn progressions(mut self, progressions: ProgressionMap) -> Self {
        self.progressions = progressions;
        self
    }

    /// Use `config` for delay, hop cap and audit capacity.
    pub fn config(mut self, config: LifecycleConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the engine, rejecting a config that fails
    /// [`LifecycleConfig::validate`].
    pub fn try_build(self) -> Result<TransitionEngine, ConfigError> {
        self.config.validate()?;
        Ok(self.build())
    }

    /// Build the engine.
    ///
    /// A progression map that fails [`ProgressionMap::validate`] or a config
    /// that fails [`LifecycleConfig::validate`] is logged but accepted. Use
    /// [`TransitionEngineBuilder::try_build`] to refuse the config instead.
    pub fn build(self) -> TransitionEngine {
        if let Err(err) = self.progressions.validate(&self.table) {
            tracing::warn!(error = %err, "progression map failed validation");
        }
        if let Err(err) = self.config.validate() {
            tracing::warn!(error = %err, "lifecycle config failed validation");
        }
        let scheduler = AutoProgressionScheduler::new(
            self.progressions,
            self.config.auto_progression_delay,
            self.config.max_automatic_hops,
        );
        TransitionEngine {
            store: self.store,
            bus: self.bus,
            clock: self.clock,
            table: self.table,
            scheduler,
            locks: EntityLocks::new(),
            audit: Mutex::new(AuditTrail::new(self.config.audit_capacity)),
            config: self.config,
        }
    }
}

/// The lifecycle state machine.
pub struct TransitionEngine {
    store: Arc<dyn EntityStore>,
    bus: Arc<dyn EventBus>,
    clock: Arc<dyn Clock>,
    table: TransitionTable,
    scheduler: AutoProgressionScheduler,
    locks: EntityLocks,
    audit: Mutex<AuditTrail>,
    config: LifecycleConfig,
}

impl std::fmt::Debug for TransitionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionEngine")
            .field("table_rules", &self.table.rules().len())
            .field("pending", &self.scheduler.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TransitionEngine {
    /// Start building an engine over `store` with the standard table and
    /// progressions, no event bus and the system clock.
    pub fn builder(store: Arc<dyn EntityStore>) -> TransitionEngineBuilder {
        TransitionEngineBuilder {
            store,
            bus: Arc::new(NoopEventBus),
            clock: Arc::new(SystemClock),
            table: TransitionTable::standard(),
            progressions: ProgressionMap::standard(),
            config: LifecycleConfig::default(),
        }
    }

    /// An engine with all defaults publishing to `bus`.
    pub fn new(store: Arc<dyn EntityStore>, bus: Arc<dyn EventBus>) -> Self {
        Self::builder(store).bus(bus).build()
    }

    /// The transition table.
    pub fn table(&self) -> &TransitionTable {
        &self.table
    }

    /// The auto-progression scheduler.
    pub fn scheduler(&self) -> &AutoProgressionScheduler {
        &self.scheduler
    }

    /// The active configuration.
    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// Current time according to the engine's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Number of pets currently being evaluated.
    pub fn active_locks(&self) -> usize {
        self.locks.active()
    }

    /// Snapshot of the audit trail.
    pub fn audit_entries(&self) -> Vec<AuditEntry> {
        self.audit.lock().entries().to_vec()
    }

    /// Audit entries for one pet.
    pub fn audit_for(&self, pet_id: &PetId) -> Vec<AuditEntry> {
        self.audit
            .lock()
            .entries_for_pet(pet_id)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Evaluate `trigger` under the pet's lock.
    pub fn evaluate(&self, trigger: &Trigger) -> Result<TransitionOutcome, LifecycleError> {
        let _guard = self.locks.acquire(&trigger.pet_id);
        self.evaluate_locked(trigger)
    }

    /// Fire every scheduled progression that is due by the engine's clock.
    pub fn fire_due(&self) -> Vec<ProgressionReport> {
        let due = self.scheduler.take_due(self.clock.now());
        due.into_iter().map(|pending| self.fire_one(pending)).collect()
    }

    fn fire_one(&self, pending: PendingAutoProgression) -> ProgressionReport {
        let _guard = self.locks.acquire(&pending.pet_id);
        let actual = self.store.get(&pending.pet_id).map(|pet| pet.status);

        if actual != Some(pending.expected_state) {
            tracing::warn!(
                pet_id = %pending.pet_id,
                expected = %pending.expected_state,
                actual = ?actual.map(|s| s.as_str()),
                "stale auto-progression dropped"
            );
            self.record(
                AuditEntryType::ProgressionStale,
                &pending.pet_id,
                serde_json::json!({
                    "expected": pending.expected_state,
                    "actual": actual,
                    "next": pending.next_state,
                }),
            );
            return ProgressionReport::Stale { pending, actual };
        }

        self.record(
            AuditEntryType::ProgressionFired,
            &pending.pet_id,
            serde_json::json!({
                "from": pending.expected_state,
                "to": pending.next_state,
                "hop": pending.hop,
            }),
        );
        let trigger = Trigger::automatic(pending.pet_id.clone(), pending.next_state, pending.hop);
        let outcome = self.evaluate_locked(&trigger);
        ProgressionReport::Fired { pending, outcome }
    }

    fn evaluate_locked(&self, trigger: &Trigger) -> Result<TransitionOutcome, LifecycleError> {
        let pet_id = &trigger.pet_id;
        tracing::info!(
            pet_id = %pet_id,
            trigger_event = %trigger.trigger_event,
            requested = ?trigger.requested_status.as_ref().map(RequestedStatus::as_str),
            automatic = trigger.automatic,
            "processing lifecycle trigger"
        );
        self.record(
            AuditEntryType::TriggerReceived,
            pet_id,
            serde_json::json!({
                "triggerEvent": trigger.trigger_event,
                "requestedStatus": trigger.requested_status,
                "automatic": trigger.automatic,
                "hops": trigger.hops,
            }),
        );

        let Some(pet) = self.store.get(pet_id) else {
            tracing::error!(pet_id = %pet_id, "pet not found for lifecycle transition");
            self.record(AuditEntryType::EntityMissing, pet_id, serde_json::Value::Null);
            return Err(LifecycleError::EntityNotFound {
                pet_id: pet_id.clone(),
            });
        };

        let current = pet.status;
        let rule = match trigger.requested_status.as_ref() {
            Some(RequestedStatus::Unknown(_)) => None,
            requested => self.table.find_rule(
                current,
                &trigger.trigger_event,
                requested.and_then(RequestedStatus::known),
            ),
        };
        let Some(rule) = rule else {
            // A redelivered request for the status the pet already holds is a
            // duplicate, not an invalid transition.
            if trigger.requested_known() == Some(current)
                && self.table.rule_into(current, &trigger.trigger_event).is_some()
            {
                return Ok(self.already_at_target(pet_id, current));
            }
            return Ok(self.reject(trigger, current));
        };

        if rule.to == current {
            return Ok(self.already_at_target(pet_id, current));
        }

        self.apply(trigger, pet, rule)
    }

    fn already_at_target(&self, pet_id: &PetId, current: PetStatus) -> TransitionOutcome {
        tracing::info!(pet_id = %pet_id, status = %current, "pet already at target status");
        self.record(
            AuditEntryType::AlreadyAtTarget,
            pet_id,
            serde_json::json!({ "status": current }),
        );
        TransitionOutcome::AlreadyAtTarget(current)
    }

    fn reject(&self, trigger: &Trigger, current: PetStatus) -> TransitionOutcome {
        let reason = match &trigger.requested_status {
            Some(requested) => RejectionReason::InvalidTarget {
                from: current,
                requested: requested.clone(),
            },
            None => RejectionReason::NoMatchingRule {
                trigger_event: trigger.trigger_event.clone(),
                from: current,
            },
        };
        tracing::warn!(pet_id = %trigger.pet_id, reason = %reason, "lifecycle transition rejected");
        self.record(
            AuditEntryType::TransitionRejected,
            &trigger.pet_id,
            serde_json::json!({ "reason": &reason }),
        );
        self.publish(
            TRANSITION_REJECTED,
            &TransitionRejected {
                entity_id: trigger.pet_id.clone(),
                current_status: current,
                requested_status: trigger.requested_status.clone(),
                trigger_event: trigger.trigger_event.clone(),
                reason: reason.to_string(),
                timestamp: self.clock.now(),
            },
        );
        TransitionOutcome::Rejected(reason)
    }

    fn apply(
        &self,
        trigger: &Trigger,
        pet: Pet,
        rule: &'static TransitionRule,
    ) -> Result<TransitionOutcome, LifecycleError> {
        let pet_id = &trigger.pet_id;
        let from = pet.status;

        if self.store.update_status(pet_id, rule.to).is_none() {
            tracing::error!(pet_id = %pet_id, from = %from, to = %rule.to, "failed to update pet status");
            self.record(
                AuditEntryType::UpdateFailed,
                pet_id,
                serde_json::json!({ "from": from, "to": rule.to }),
            );
            return Err(LifecycleError::UpdateFailed {
                pet_id: pet_id.clone(),
                from,
                to: rule.to,
            });
        }

        tracing::info!(
            pet_id = %pet_id,
            from = %from,
            to = %rule.to,
            automatic = trigger.automatic,
            description = rule.description,
            "lifecycle transition applied"
        );
        self.record(
            AuditEntryType::TransitionApplied,
            pet_id,
            serde_json::json!({
                "from": from,
                "to": rule.to,
                "triggerEvent": trigger.trigger_event,
                "automatic": trigger.automatic,
            }),
        );

        let now = self.clock.now();
        self.publish(
            TRANSITION_COMPLETED,
            &TransitionCompleted {
                entity_id: pet_id.clone(),
                old_status: from,
                new_status: rule.to,
                trigger_event: trigger.trigger_event.clone(),
                description: rule.description.to_string(),
                automatic: trigger.automatic,
                timestamp: now,
            },
        );

        let follow_up = match self.scheduler.maybe_schedule(pet_id, rule.to, trigger.hops, now) {
            Ok(follow_up) => {
                if let FollowUp::Scheduled(pending) = &follow_up {
                    self.record(
                        AuditEntryType::ProgressionScheduled,
                        pet_id,
                        serde_json::json!({
                            "from": pending.expected_state,
                            "to": pending.next_state,
                            "hop": pending.hop,
                            "dueAt": pending.due_at,
                        }),
                    );
                }
                follow_up
            }
            Err(err) => {
                self.halt(pet_id, rule.to, &err, now);
                FollowUp::Halted(err)
            }
        };

        Ok(TransitionOutcome::Applied {
            from,
            to: rule.to,
            rule,
            follow_up,
        })
    }

    fn halt(&self, pet_id: &PetId, state: PetStatus, err: &ConfigurationError, now: DateTime<Utc>) {
        tracing::error!(pet_id = %pet_id, state = %state, error = %err, "automatic progression halted");
        let (hops, max_hops) = match err {
            ConfigurationError::RunawayProgression { hops, max_hops, .. } => (*hops, *max_hops),
            _ => (0, self.scheduler.max_hops()),
        };
        self.record(
            AuditEntryType::ProgressionHalted,
            pet_id,
            serde_json::json!({ "state": state, "hops": hops, "maxHops": max_hops }),
        );
        self.publish(
            PROGRESSION_HALTED,
            &ProgressionHalted {
                entity_id: pet_id.clone(),
                state,
                hops,
                max_hops,
                reason: err.to_string(),
                timestamp: now,
            },
        );
    }

    fn publish<T: Serialize>(&self, topic: &str, payload: &T) {
        let value = match serde_json::to_value(payload) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(topic, error = %err, "failed to serialize lifecycle event");
                return;
            }
        };
        if let Err(err) = self.bus.publish(topic, value) {
            tracing::warn!(topic, error = %err, "failed to publish lifecycle event");
        }
    }

    fn record(&self, entry_type: AuditEntryType, pet_id: &PetId, metadata: serde_json::Value) {
        let metadata = (!metadata.is_null()).then_some(metadata);
        let entry = AuditEntry::new(entry_type, self.clock.now(), pet_id.clone(), metadata);
        self.audit.lock().append(entry);
    }
}
