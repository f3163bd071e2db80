//! # Transition Table
//!
//! The static, ordered set of allowed `(state, trigger event) → next state`
//! rules.
//!
//! ```text
//! new --feeding.reminder.completed--> in_quarantine
//! in_quarantine --status.update.requested--> healthy
//! {healthy, in_quarantine, available} --status.update.requested--> ill
//! healthy --status.update.requested--> available
//! ill --status.update.requested--> under_treatment
//! under_treatment --status.update.requested--> recovered
//! recovered --status.update.requested--> healthy
//! available --status.update.requested--> pending
//! pending --status.update.requested--> adopted
//! pending --status.update.requested--> available
//! ```
//!
//! Table order is priority: when a trigger names no target status the first
//! matching rule wins, so `in_quarantine` + `status.update.requested` resolves
//! to `healthy`, never `ill`. Do not reorder.

use petflow_core::PetStatus;
use serde::Serialize;

/// Trigger event raised once a new pet's feeding schedule is set up.
pub const FEEDING_REMINDER_COMPLETED: &str = "feeding.reminder.completed";

/// Trigger event for a staff (or automatic) request to move to a named status.
pub const STATUS_UPDATE_REQUESTED: &str = "status.update.requested";

/// Trigger event raised when a pet is registered. No rule consumes it.
pub const PET_CREATED: &str = "pet.created";

/// One allowed transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionRule {
    /// Source states the rule applies to.
    pub from: &'static [PetStatus],
    /// Destination state.
    pub to: PetStatus,
    /// Event name that can invoke the rule.
    pub trigger_event: &'static str,
    /// Rationale, for observability only.
    pub description: &'static str,
}

impl TransitionRule {
    /// Whether this rule applies to `current` for `trigger_event`.
    pub fn applies_to(&self, current: PetStatus, trigger_event: &str) -> bool {
        self.trigger_event == trigger_event && self.from.contains(&current)
    }
}

/// The lifecycle rules, in priority order.
pub static TRANSITION_RULES: [TransitionRule; 10] = [
    TransitionRule {
        from: &[PetStatus::New],
        to: PetStatus::InQuarantine,
        trigger_event: FEEDING_REMINDER_COMPLETED,
        description: "Pet moved to quarantine after feeding setup",
    },
    TransitionRule {
        from: &[PetStatus::InQuarantine],
        to: PetStatus::Healthy,
        trigger_event: STATUS_UPDATE_REQUESTED,
        description: "Staff health check - pet cleared from quarantine",
    },
    TransitionRule {
        from: &[PetStatus::Healthy, PetStatus::InQuarantine, PetStatus::Available],
        to: PetStatus::Ill,
        trigger_event: STATUS_UPDATE_REQUESTED,
        description: "Staff assessment - pet identified as ill",
    },
    TransitionRule {
        from: &[PetStatus::Healthy],
        to: PetStatus::Available,
        trigger_event: STATUS_UPDATE_REQUESTED,
        description: "Staff decision - pet ready for adoption",
    },
    TransitionRule {
        from: &[PetStatus::Ill],
        to: PetStatus::UnderTreatment,
        trigger_event: STATUS_UPDATE_REQUESTED,
        description: "Staff decision - treatment started",
    },
    TransitionRule {
        from: &[PetStatus::UnderTreatment],
        to: PetStatus::Recovered,
        trigger_event: STATUS_UPDATE_REQUESTED,
        description: "Staff assessment - treatment completed",
    },
    TransitionRule {
        from: &[PetStatus::Recovered],
        to: PetStatus::Healthy,
        trigger_event: STATUS_UPDATE_REQUESTED,
        description: "Staff clearance - pet fully recovered",
    },
    TransitionRule {
        from: &[PetStatus::Available],
        to: PetStatus::Pending,
        trigger_event: STATUS_UPDATE_REQUESTED,
        description: "Adoption application received",
    },
    TransitionRule {
        from: &[PetStatus::Pending],
        to: PetStatus::Adopted,
        trigger_event: STATUS_UPDATE_REQUESTED,
        description: "Adoption completed",
    },
    TransitionRule {
        from: &[PetStatus::Pending],
        to: PetStatus::Available,
        trigger_event: STATUS_UPDATE_REQUESTED,
        description: "Adoption application rejected/cancelled",
    },
];

/// A read-only view over an ordered rule list.
///
/// The lifecycle uses [`TransitionTable::standard`]; tests and tooling can
/// build a table over any `'static` rule slice.
#[derive(Debug, Clone, Copy)]
pub struct TransitionTable {
    rules: &'static [TransitionRule],
}

impl TransitionTable {
    /// The standard pet lifecycle table.
    pub fn standard() -> Self {
        Self {
            rules: &TRANSITION_RULES,
        }
    }

    /// A table over an arbitrary rule list. Order is preserved as given.
    pub fn from_rules(rules: &'static [TransitionRule]) -> Self {
        Self { rules }
    }

    /// All rules in priority order.
    pub fn rules(&self) -> &'static [TransitionRule] {
        self.rules
    }

    /// Find the rule for a trigger.
    ///
    /// With `requested` set, returns the rule whose destination is the
    /// requested status; a missing rule covers both "no such transition" and
    /// "invalid target". Without it, returns the first applicable rule in
    /// table order.
    pub fn find_rule(
        &self,
        current: PetStatus,
        trigger_event: &str,
        requested: Option<PetStatus>,
    ) -> Option<&'static TransitionRule> {
        let rules: &'static [TransitionRule] = self.rules;
        let mut candidates = rules
            .iter()
            .filter(move |rule| rule.applies_to(current, trigger_event));
        match requested {
            Some(target) => candidates.find(|rule| rule.to == target),
            None => candidates.next(),
        }
    }

    /// Whether any rule leads from `from` to `to` for `trigger_event`.
    pub fn allows(&self, from: PetStatus, to: PetStatus, trigger_event: &str) -> bool {
        self.find_rule(from, trigger_event, Some(to)).is_some()
    }

    /// The first rule for `trigger_event` whose destination is `to`, from
    /// any state.
    pub fn rule_into(&self, to: PetStatus, trigger_event: &str) -> Option<&'static TransitionRule> {
        let rules: &'static [TransitionRule] = self.rules;
        rules
            .iter()
            .find(|rule| rule.to == to && rule.trigger_event == trigger_event)
    }
}

impl Default for TransitionTable {
    fn default() -> Self {
        Self::standard()
    }
}
