//! # Async Runtime Wiring
//!
//! The progression driver and the trigger router running on tokio against a
//! real clock with a short delay.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::init_tracing;
use petflow_core::{NewPet, PetId, PetStatus, Species};
use petflow_lifecycle::events::{TRANSITION_COMPLETED, TRANSITION_REJECTED};
use petflow_lifecycle::router::{
    FEEDING_REMINDER_COMPLETED_TOPIC, PET_CREATED_TOPIC, STATUS_UPDATE_REQUESTED_TOPIC,
};
use petflow_lifecycle::{
    EntityStore, EventBus, InMemoryEventBus, InMemoryPetStore, LifecycleConfig,
    ProgressionDriver, TransitionEngine, TriggerRouter,
};
use serde_json::json;

struct Runtime {
    store: InMemoryPetStore,
    bus: InMemoryEventBus,
    engine: Arc<TransitionEngine>,
}

fn runtime() -> Runtime {
    init_tracing();
    let store = InMemoryPetStore::new();
    let bus = InMemoryEventBus::new();
    let engine = TransitionEngine::builder(Arc::new(store.clone()))
        .bus(Arc::new(bus.clone()))
        .config(
            LifecycleConfig::default()
                .with_auto_progression_delay(Duration::from_millis(30))
                .with_driver_tick(Duration::from_millis(5)),
        )
        .build();
    Runtime {
        store,
        bus,
        engine: Arc::new(engine),
    }
}

fn register(store: &InMemoryPetStore) -> PetId {
    store
        .create(NewPet {
            name: "Pip".into(),
            species: Species::Bird,
            age_months: 7,
        })
        .unwrap()
        .id
}

async fn wait_for_status(store: &InMemoryPetStore, id: &PetId, status: PetStatus) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
    loop {
        if store.get(id).map(|p| p.status) == Some(status) {
            return;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "pet never reached {status}"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn bus_driven_intake_reaches_available() {
    let rt = runtime();
    let id = register(&rt.store);

    let router = TriggerRouter::new(Arc::clone(&rt.engine));
    let router_task = tokio::spawn(router.run(rt.bus.subscribe()));
    let driver = ProgressionDriver::spawn(Arc::clone(&rt.engine));

    rt.bus
        .publish(PET_CREATED_TOPIC, json!({"petId": id.as_str()}))
        .unwrap();
    rt.bus
        .publish(FEEDING_REMINDER_COMPLETED_TOPIC, json!({"petId": id.as_str()}))
        .unwrap();
    wait_for_status(&rt.store, &id, PetStatus::InQuarantine).await;

    rt.bus
        .publish(
            STATUS_UPDATE_REQUESTED_TOPIC,
            json!({"petId": id.as_str(), "requestedStatus": "healthy"}),
        )
        .unwrap();
    wait_for_status(&rt.store, &id, PetStatus::Available).await;

    driver.shutdown().await;
    router_task.abort();

    // pet.created has no rule and is rejected.
    assert_eq!(rt.bus.count(TRANSITION_REJECTED), 1);
    let completed = rt.bus.messages_on(TRANSITION_COMPLETED);
    let path: Vec<&str> = completed
        .iter()
        .filter_map(|m| m.payload["newStatus"].as_str())
        .collect();
    assert_eq!(path, vec!["in_quarantine", "healthy", "available"]);
    assert_eq!(completed[2].payload["automatic"], true);
}

#[tokio::test]
async fn router_skips_its_own_topics_and_survives_bad_input() {
    let rt = runtime();
    let id = register(&rt.store);

    let router = TriggerRouter::new(Arc::clone(&rt.engine));
    let router_task = tokio::spawn(router.run(rt.bus.subscribe()));

    rt.bus.publish("adoption.applied", json!({})).unwrap();
    rt.bus
        .publish(STATUS_UPDATE_REQUESTED_TOPIC, json!({"requestedStatus": 7}))
        .unwrap();
    rt.bus
        .publish(TRANSITION_COMPLETED, json!({"entityId": id.as_str()}))
        .unwrap();
    rt.bus
        .publish(FEEDING_REMINDER_COMPLETED_TOPIC, json!({"petId": id.as_str()}))
        .unwrap();

    wait_for_status(&rt.store, &id, PetStatus::InQuarantine).await;
    router_task.abort();
    assert_eq!(rt.bus.count(TRANSITION_REJECTED), 0);
}

#[tokio::test]
async fn router_exits_when_the_bus_closes() {
    let rt = runtime();
    let router = TriggerRouter::new(Arc::clone(&rt.engine));
    let (sender, receiver) = tokio::sync::broadcast::channel(4);
    let task = tokio::spawn(router.run(receiver));
    drop(sender);
    tokio::time::timeout(Duration::from_secs(1), task)
        .await
        .expect("router should stop")
        .unwrap();
}

#[tokio::test]
async fn driver_leaves_future_work_queued_on_shutdown() {
    init_tracing();
    let store = InMemoryPetStore::new();
    let engine = Arc::new(
        TransitionEngine::builder(Arc::new(store.clone()))
            .config(
                LifecycleConfig::default()
                    .with_auto_progression_delay(Duration::from_secs(60))
                    .with_driver_tick(Duration::from_millis(5)),
            )
            .build(),
    );
    let id = register(&store);
    store.update_status(&id, PetStatus::Available).unwrap();
    engine
        .evaluate(&petflow_lifecycle::Trigger::status_update(
            id.clone(),
            PetStatus::Ill,
        ))
        .unwrap();

    let driver = ProgressionDriver::spawn(Arc::clone(&engine));
    tokio::time::sleep(Duration::from_millis(30)).await;
    driver.shutdown().await;

    assert_eq!(store.get(&id).unwrap().status, PetStatus::Ill);
    assert_eq!(engine.scheduler().pending_for(&id).len(), 1);
}
