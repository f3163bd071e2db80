//! # Transition Table Properties
//!
//! Exhaustive checks over the whole table and every state, plus a property
//! test over random trigger sequences.

mod common;

use common::Harness;
use petflow_core::PetStatus;
use petflow_lifecycle::events::{TRANSITION_COMPLETED, TRANSITION_REJECTED};
use petflow_lifecycle::table::{FEEDING_REMINDER_COMPLETED, PET_CREATED, STATUS_UPDATE_REQUESTED};
use petflow_lifecycle::{
    EntityStore, LifecycleConfig, ProgressionMap, RequestedStatus, TransitionOutcome,
    TransitionTable, Trigger,
};
use proptest::prelude::*;

// =========================================================================
// Every rule, from every source state, lands on its target
// =========================================================================

#[test]
fn every_rule_lands_on_its_target_with_one_event() {
    let table = TransitionTable::standard();
    for rule in table.rules() {
        for &from in rule.from {
            let h = Harness::new();
            let id = h.add_pet(from);
            let trigger = if rule.trigger_event == STATUS_UPDATE_REQUESTED {
                Trigger::status_update(id.clone(), rule.to)
            } else {
                Trigger::new(id.clone(), rule.trigger_event).with_requested(rule.to)
            };

            let outcome = h.engine.evaluate(&trigger).unwrap();
            assert!(
                matches!(outcome, TransitionOutcome::Applied { to, .. } if to == rule.to),
                "{from} -> {} gave {outcome:?}",
                rule.to
            );
            assert_eq!(h.status(&id), rule.to);

            let completed = h.bus.messages_on(TRANSITION_COMPLETED);
            assert_eq!(completed.len(), 1, "{from} -> {}", rule.to);
            assert_eq!(completed[0].payload["oldStatus"], from.as_str());
            assert_eq!(completed[0].payload["newStatus"], rule.to.as_str());
            assert_eq!(completed[0].payload["triggerEvent"], rule.trigger_event);
            assert_eq!(completed[0].payload["description"], rule.description);
            assert_eq!(h.bus.count(TRANSITION_REJECTED), 0);
        }
    }
}

// =========================================================================
// Every unmatched (state, event, target) is rejected and changes nothing
// =========================================================================

#[test]
fn unmatched_requests_are_rejected_without_side_effects() {
    let table = TransitionTable::standard();
    let events = [STATUS_UPDATE_REQUESTED, FEEDING_REMINDER_COMPLETED, PET_CREATED];

    for state in PetStatus::ALL {
        for event in events {
            let mut targets: Vec<Option<PetStatus>> =
                PetStatus::ALL.iter().copied().map(Some).collect();
            targets.push(None);

            for requested in targets {
                if table.find_rule(state, event, requested).is_some() {
                    continue;
                }
                // Redelivered requests for the current status collapse instead.
                if requested == Some(state) && table.rule_into(state, event).is_some() {
                    continue;
                }

                let h = Harness::new();
                let id = h.add_pet(state);
                let before = h.store.get(&id).unwrap();

                let mut trigger = Trigger::new(id.clone(), event);
                trigger.requested_status = requested.map(RequestedStatus::from);
                let outcome = h.engine.evaluate(&trigger).unwrap();

                assert!(outcome.is_rejected(), "{state}/{event}/{requested:?}");
                assert_eq!(h.store.get(&id).unwrap(), before);
                assert_eq!(h.bus.count(TRANSITION_REJECTED), 1);
                assert_eq!(h.bus.count(TRANSITION_COMPLETED), 0);
                assert!(h.engine.scheduler().is_empty());

                let payload = &h.bus.messages_on(TRANSITION_REJECTED)[0].payload;
                assert_eq!(payload["currentStatus"], state.as_str());
                assert_eq!(payload["triggerEvent"], event);
            }
        }
    }
}

#[test]
fn resubmitting_an_applied_request_is_idempotent() {
    let table = TransitionTable::standard();
    for rule in table.rules() {
        if rule.trigger_event != STATUS_UPDATE_REQUESTED {
            continue;
        }
        let h = Harness::with(ProgressionMap::new(), LifecycleConfig::default());
        let id = h.add_pet(rule.from[0]);
        let trigger = Trigger::status_update(id.clone(), rule.to);

        assert!(h.engine.evaluate(&trigger).unwrap().is_applied());
        let after_first = h.store.get(&id).unwrap();
        let events = h.bus.messages().len();

        let again = h.engine.evaluate(&trigger).unwrap();
        assert_eq!(again, TransitionOutcome::AlreadyAtTarget(rule.to));
        assert_eq!(h.store.get(&id).unwrap(), after_first);
        assert_eq!(h.bus.messages().len(), events);
    }
}

// =========================================================================
// Random trigger sequences
// =========================================================================

#[derive(Debug, Clone)]
enum Step {
    Request(PetStatus),
    Feeding,
    Created,
    Fire,
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        6 => prop::sample::select(PetStatus::ALL.to_vec()).prop_map(Step::Request),
        1 => Just(Step::Feeding),
        1 => Just(Step::Created),
        2 => Just(Step::Fire),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_sequences_follow_the_table(
        start in prop::sample::select(PetStatus::ALL.to_vec()),
        steps in prop::collection::vec(step(), 1..40),
    ) {
        let h = Harness::new();
        let table = TransitionTable::standard();
        let id = h.add_pet(start);
        let mut applied = 0usize;
        let mut rejected = 0usize;

        for step in steps {
            let before = h.status(&id);
            match step {
                Step::Fire => {
                    for report in h.advance_and_fire() {
                        if let petflow_lifecycle::ProgressionReport::Fired { outcome, .. } = report {
                            match outcome.unwrap() {
                                TransitionOutcome::Applied { .. } => applied += 1,
                                TransitionOutcome::Rejected(_) => rejected += 1,
                                TransitionOutcome::AlreadyAtTarget(_) => {}
                            }
                        }
                    }
                }
                other => {
                    let trigger = match other {
                        Step::Request(target) => Trigger::status_update(id.clone(), target),
                        Step::Feeding => Trigger::new(id.clone(), FEEDING_REMINDER_COMPLETED),
                        _ => Trigger::new(id.clone(), PET_CREATED),
                    };
                    match h.engine.evaluate(&trigger).unwrap() {
                        TransitionOutcome::Applied { from, to, rule, .. } => {
                            applied += 1;
                            prop_assert_eq!(from, before);
                            prop_assert!(rule.from.contains(&from));
                            prop_assert!(table.allows(from, to, &trigger.trigger_event));
                            prop_assert_eq!(h.status(&id), to);
                        }
                        TransitionOutcome::AlreadyAtTarget(status) => {
                            prop_assert_eq!(status, before);
                            prop_assert_eq!(h.status(&id), before);
                        }
                        TransitionOutcome::Rejected(_) => {
                            rejected += 1;
                            prop_assert_eq!(h.status(&id), before);
                        }
                    }
                }
            }
        }

        prop_assert_eq!(h.bus.count(TRANSITION_COMPLETED), applied);
        prop_assert_eq!(h.bus.count(TRANSITION_REJECTED), rejected);
        prop_assert_eq!(h.engine.active_locks(), 0);
        // Never more than one item pending per qualifying state.
        prop_assert!(h.engine.scheduler().len() <= 3);
    }
}
