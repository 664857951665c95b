// Copyright (c) 2026 ThinkOrbit Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Event records, delivery context and subscription contracts.
//!
//! Every event published on the bus is an [`EventRecord`]. Records are
//! persisted before delivery, so the copy a listener sees always carries the
//! repository-assigned [`EventId`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId(pub i64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How close an event sits to the core of the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticTier {
    Internal,
    Peripheral,
    Ambient,
}

impl SemanticTier {
    pub fn tier(&self) -> &'static str {
        match self {
            SemanticTier::Internal => "internal",
            SemanticTier::Peripheral => "peripheral",
            SemanticTier::Ambient => "ambient",
        }
    }

    /// Column representation (enum name, upper case).
    pub fn as_db_str(&self) -> &'static str {
        match self {
            SemanticTier::Internal => "INTERNAL",
            SemanticTier::Peripheral => "PERIPHERAL",
            SemanticTier::Ambient => "AMBIENT",
        }
    }
}

impl fmt::Display for SemanticTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tier())
    }
}

impl FromStr for SemanticTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "internal" => Ok(SemanticTier::Internal),
            "peripheral" => Ok(SemanticTier::Peripheral),
            "ambient" => Ok(SemanticTier::Ambient),
            other => Err(format!("Unknown semantic tier: {}", other)),
        }
    }
}

/// Replay depth requested by whoever triggers a replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayLevel {
    /// Re-apply every side effect.
    FullReplay,
    /// Rebuild derived state only.
    SemanticReplay,
    /// Observe without mutating anything.
    DryRun,
}

impl fmt::Display for ReplayLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReplayLevel::FullReplay => "FULL_REPLAY",
            ReplayLevel::SemanticReplay => "SEMANTIC_REPLAY",
            ReplayLevel::DryRun => "DRY_RUN",
        };
        f.write_str(s)
    }
}

/// A single published event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: Option<EventId>,
    pub occurred_at: DateTime<Utc>,
    pub event_type: String,
    pub source: String,
    pub semantic_tier: SemanticTier,
    pub trace_id: Option<String>,
    pub cause_id: Option<String>,
    #[serde(default)]
    pub payload: Map<String, Value>,
}

impl EventRecord {
    /// New unsaved event stamped with the current time and `Internal` tier.
    pub fn new(event_type: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: None,
            occurred_at: Utc::now(),
            event_type: event_type.into(),
            source: source.into(),
            semantic_tier: SemanticTier::Internal,
            trace_id: None,
            cause_id: None,
            payload: Map::new(),
        }
    }

    pub fn with_tier(mut self, tier: SemanticTier) -> Self {
        self.semantic_tier = tier;
        self
    }

    pub fn with_occurred_at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = occurred_at;
        self
    }

    pub fn with_trace_id(mut self, trace_id: Option<String>) -> Self {
        self.trace_id = trace_id;
        self
    }

    pub fn with_cause_id(mut self, cause_id: Option<String>) -> Self {
        self.cause_id = cause_id;
        self
    }

    pub fn with_payload(mut self, payload: Map<String, Value>) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_payload_entry(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    pub fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(|v| v.as_str())
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

/// Delivery metadata handed to listeners alongside each event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventContext {
    pub replay: bool,
    pub dry_run: bool,
    pub replay_level: Option<ReplayLevel>,
}

impl EventContext {
    pub fn live() -> Self {
        Self::default()
    }

    pub fn replay(level: ReplayLevel) -> Self {
        Self {
            replay: true,
            dry_run: level == ReplayLevel::DryRun,
            replay_level: Some(level),
        }
    }

    pub fn is_replay(&self) -> bool {
        self.replay
    }
}

/// Lower bounds (inclusive) for a replay. Absent bounds do not filter.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayRange {
    pub from_event_id: Option<EventId>,
    pub from_time: Option<DateTime<Utc>>,
    pub level: ReplayLevel,
}

impl ReplayRange {
    pub fn new(
        from_event_id: Option<EventId>,
        from_time: Option<DateTime<Utc>>,
        level: ReplayLevel,
    ) -> Self {
        Self {
            from_event_id,
            from_time,
            level,
        }
    }

    /// Replay the entire history.
    pub fn all(level: ReplayLevel) -> Self {
        Self::new(None, None, level)
    }

    pub fn since(from_time: DateTime<Utc>, level: ReplayLevel) -> Self {
        Self::new(None, Some(from_time), level)
    }
}

pub trait EventFilter: Send + Sync {
    fn matches(&self, event: &EventRecord) -> bool;
}

impl<F> EventFilter for F
where
    F: Fn(&EventRecord) -> bool + Send + Sync,
{
    fn matches(&self, event: &EventRecord) -> bool {
        self(event)
    }
}

/// Declarative subscription: exact type, optional source, optional tier set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnEvent {
    pub event_type: String,
    pub source: Option<String>,
    pub tiers: HashSet<SemanticTier>,
}

impl OnEvent {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            source: None,
            tiers: HashSet::new(),
        }
    }

    pub fn from_source(mut self, source: impl Into<String>) -> Self {
        let source = source.into();
        self.source = if source.is_empty() { None } else { Some(source) };
        self
    }

    pub fn in_tiers(mut self, tiers: impl IntoIterator<Item = SemanticTier>) -> Self {
        self.tiers.extend(tiers);
        self
    }
}

impl EventFilter for OnEvent {
    fn matches(&self, event: &EventRecord) -> bool {
        if self.event_type != event.event_type {
            return false;
        }

        if let Some(source) = &self.source {
            if source != &event.source {
                return false;
            }
        }

        self.tiers.is_empty() || self.tiers.contains(&event.semantic_tier)
    }
}

#[async_trait]
pub trait EventListener: Send + Sync {
    async fn on_event(&self, context: &EventContext, event: &EventRecord);
}

#[async_trait]
impl<F> EventListener for F
where
    F: Fn(&EventContext, &EventRecord) + Send + Sync,
{
    async fn on_event(&self, context: &EventContext, event: &EventRecord) {
        self(context, event)
    }
}
