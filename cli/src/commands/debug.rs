// Copyright (c) 2026 ThinkOrbit Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Diagnostics that run against an in-process event bus backed by the
//! configured event store.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::Subcommand;
use colored::Colorize;
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::Arc;

use thinkorbit_core::application::event_factory::EventFactory;
use thinkorbit_core::domain::events::{
    EventContext, EventListener, EventRecord, OnEvent, ReplayLevel, ReplayRange, SemanticTier,
};
use thinkorbit_core::domain::orbit_config::OrbitConfigManifest;
use thinkorbit_core::infrastructure::event_bus::{EventBus, StandardEventBus};

use crate::daemon::server::open_repository;

pub const TEST_EVENT: &str = "TEST_EVENT";
const TEST_SOURCE: &str = "DebugCommand";

#[derive(Subcommand)]
pub enum DebugCommand {
    /// Subscribe to a test event, publish it, then replay the last minute
    Events,
}

pub async fn handle_command(command: DebugCommand, config_path: Option<PathBuf>) -> Result<()> {
    match command {
        DebugCommand::Events => events(config_path).await,
    }
}

async fn events(config_path: Option<PathBuf>) -> Result<()> {
    let config = OrbitConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;
    let repository = open_repository(&config).await?;
    let bus = StandardEventBus::with_page_size(repository, config.spec.event_bus.replay_page_size);

    let replayed = exercise_event_bus(&bus, Arc::new(print_event)).await?;
    println!("{}", format!("✓ Replayed {} event(s)", replayed).green());

    bus.close();
    Ok(())
}

/// Subscribe `listener`, publish a test event and replay the last minute to
/// the same listener. Returns the number of events replayed.
async fn exercise_event_bus(bus: &dyn EventBus, listener: Arc<dyn EventListener>) -> Result<u64> {
    bus.subscribe(Arc::new(OnEvent::new(TEST_EVENT)), listener.clone())
        .context("Failed to subscribe")?;

    let factory = EventFactory::new(TEST_SOURCE);
    let mut payload = Map::new();
    payload.insert("message".to_string(), Value::from("Hello, ThinkOrbit!"));
    let published = bus
        .publish(factory.create_event_with_payload(TEST_EVENT, SemanticTier::Internal, payload))
        .await
        .context("Failed to publish test event")?;
    println!(
        "Published {} (id {})",
        TEST_EVENT.bold(),
        published.id.map(|id| id.to_string()).unwrap_or_default()
    );

    let range = ReplayRange::since(Utc::now() - Duration::seconds(60), ReplayLevel::SemanticReplay);
    let replayed = bus.replay(&range, listener.as_ref()).await.context("Replay failed")?;
    Ok(replayed)
}

fn print_event(context: &EventContext, event: &EventRecord) {
    let mode = match context.replay_level {
        Some(level) => format!("replay {}", level),
        None => "live".to_string(),
    };
    println!(
        "  [{}] {} from {} at {}: {}",
        mode,
        event.event_type,
        event.source,
        event.occurred_at.to_rfc3339(),
        event.payload_str("message").unwrap_or("")
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use thinkorbit_core::infrastructure::repositories::InMemoryEventRepository;

    #[tokio::test]
    async fn test_exercise_delivers_live_then_replay() {
        let bus = StandardEventBus::new(Arc::new(InMemoryEventRepository::new()));
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = calls.clone();
        let listener = move |context: &EventContext, event: &EventRecord| {
            sink.lock().unwrap().push((context.replay_level, event.payload_str("message").map(String::from)));
        };

        assert_eq!(exercise_event_bus(&bus, Arc::new(listener)).await.unwrap(), 1);
        assert_eq!(bus.subscriber_count(), 1);

        let calls = calls.lock().unwrap();
        let hello = Some("Hello, ThinkOrbit!".to_string());
        assert_eq!(
            *calls,
            vec![(None, hello.clone()), (Some(ReplayLevel::SemanticReplay), hello)]
        );
    }
}
