// Copyright (c) 2026 ThinkOrbit Contributors
// SPDX-License-Identifier: AGPL-3.0

use chrono::{Duration, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use thinkorbit_core::application::event_factory::EventFactory;
use thinkorbit_core::application::services::OrbitServices;
use thinkorbit_core::domain::events::{
    EventContext, EventRecord, OnEvent, ReplayLevel, ReplayRange, SemanticTier,
};
use thinkorbit_core::domain::intent::Intent;
use thinkorbit_core::domain::repository::EventRepository;
use thinkorbit_core::domain::task::CreateTask;
use thinkorbit_core::infrastructure::event_bus::{EventBus, StandardEventBus};
use thinkorbit_core::infrastructure::repositories::InMemoryEventRepository;

fn bus(page_size: usize) -> (Arc<StandardEventBus>, Arc<InMemoryEventRepository>) {
    let repository = Arc::new(InMemoryEventRepository::new());
    let bus = Arc::new(StandardEventBus::with_page_size(repository.clone(), page_size));
    (bus, repository)
}

#[tokio::test]
async fn intent_creates_task_and_persists_event() {
    let (bus, repository) = bus(1000);
    let services = OrbitServices::new(bus.clone()).unwrap();

    let routed = services
        .intents
        .execute_intent(Intent::traced(CreateTask::new("calibrate sensors"), "trace-42"))
        .await
        .unwrap();

    assert!(routed);
    assert_eq!(services.tasks.tasks().len(), 1);
    assert_eq!(repository.count().await.unwrap(), 1);

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let listener = move |_: &EventContext, e: &EventRecord| sink.lock().push(e.clone());
    bus.replay(&ReplayRange::all(ReplayLevel::FullReplay), &listener)
        .await
        .unwrap();

    let events = events.lock();
    assert_eq!(events[0].event_type, "created_task");
    assert_eq!(events[0].trace_id.as_deref(), Some("trace-42"));
    assert_eq!(events[0].payload_str("taskName"), Some("calibrate sensors"));
}

#[tokio::test]
async fn replay_respects_time_and_id_bounds() {
    let (bus, _) = bus(3);
    let factory = EventFactory::new("sensor");

    let old = factory
        .create_event("reading", SemanticTier::Ambient)
        .with_occurred_at(Utc::now() - Duration::hours(2));
    bus.publish(old).await.unwrap();

    let mut recent_ids = Vec::new();
    for _ in 0..7 {
        let saved = bus
            .publish(factory.create_event("reading", SemanticTier::Ambient))
            .await
            .unwrap();
        recent_ids.push(saved.id.unwrap());
    }

    let noop = |_: &EventContext, _: &EventRecord| {};
    let since_minute = ReplayRange::since(Utc::now() - Duration::minutes(1), ReplayLevel::SemanticReplay);
    assert_eq!(bus.replay(&since_minute, &noop).await.unwrap(), 7);

    let from_id = ReplayRange::new(Some(recent_ids[4]), None, ReplayLevel::DryRun);
    assert_eq!(bus.replay(&from_id, &noop).await.unwrap(), 3);

    let everything = ReplayRange::all(ReplayLevel::FullReplay);
    assert_eq!(bus.replay(&everything, &noop).await.unwrap(), 8);
}

#[tokio::test]
async fn subscribers_filter_by_source_and_tier() {
    let (bus, _) = bus(1000);
    let hits = Arc::new(Mutex::new(Vec::new()));
    let sink = hits.clone();

    bus.subscribe(
        Arc::new(
            OnEvent::new("reading")
                .from_source("sensor")
                .in_tiers([SemanticTier::Peripheral]),
        ),
        Arc::new(move |_: &EventContext, e: &EventRecord| sink.lock().push(e.id)),
    )
    .unwrap();

    let sensor = EventFactory::new("sensor");
    let other = EventFactory::new("other");

    let wanted = bus
        .publish(sensor.create_event("reading", SemanticTier::Peripheral))
        .await
        .unwrap();
    bus.publish(sensor.create_event("reading", SemanticTier::Internal)).await.unwrap();
    bus.publish(other.create_event("reading", SemanticTier::Peripheral)).await.unwrap();

    assert_eq!(*hits.lock(), vec![wanted.id]);
}
