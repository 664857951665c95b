// Copyright (c) 2026 ThinkOrbit Contributors
// SPDX-License-Identifier: AGPL-3.0

use crate::domain::events::{EventRecord, SemanticTier};
use chrono::Utc;
use serde_json::{Map, Value};

/// Builds events stamped with a fixed source and optional trace/cause ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFactory {
    source: String,
    trace_id: Option<String>,
    cause_id: Option<String>,
}

impl EventFactory {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            trace_id: None,
            cause_id: None,
        }
    }

    /// New factory with the same source and the given trace id. Any cause
    /// id of `self` is not carried over.
    pub fn with_trace_id(&self, trace_id: impl Into<String>) -> Self {
        Self {
            source: self.source.clone(),
            trace_id: Some(trace_id.into()),
            cause_id: None,
        }
    }

    pub fn with_trace_id_and_cause_id(&self, trace_id: impl Into<String>, cause_id: impl Into<String>) -> Self {
        Self {
            source: self.source.clone(),
            trace_id: Some(trace_id.into()),
            cause_id: Some(cause_id.into()),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    pub fn cause_id(&self) -> Option<&str> {
        self.cause_id.as_deref()
    }

    pub fn create_event(&self, event_type: impl Into<String>, tier: SemanticTier) -> EventRecord {
        EventRecord::new(event_type, self.source.clone())
            .with_occurred_at(Utc::now())
            .with_tier(tier)
            .with_trace_id(self.trace_id.clone())
            .with_cause_id(self.cause_id.clone())
    }

    pub fn create_event_caused_by(
        &self,
        event_type: impl Into<String>,
        tier: SemanticTier,
        cause_id: impl Into<String>,
    ) -> EventRecord {
        self.create_event(event_type, tier)
            .with_cause_id(Some(cause_id.into()))
    }

    pub fn create_event_with_payload(
        &self,
        event_type: impl Into<String>,
        tier: SemanticTier,
        payload: Map<String, Value>,
    ) -> EventRecord {
        self.create_event(event_type, tier).with_payload(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_factory_stamps_source_and_ids() {
        let factory = EventFactory::new("TaskService").with_trace_id_and_cause_id("trace-1", "cause-1");
        let event = factory.create_event("created_task", SemanticTier::Peripheral);

        assert_eq!(event.source, "TaskService");
        assert_eq!(event.semantic_tier, SemanticTier::Peripheral);
        assert_eq!(event.trace_id.as_deref(), Some("trace-1"));
        assert_eq!(event.cause_id.as_deref(), Some("cause-1"));
        assert!(event.id.is_none());
    }

    #[test]
    fn test_with_trace_id_drops_previous_cause() {
        let base = EventFactory::new("sensor").with_trace_id_and_cause_id("t1", "c1");
        let derived = base.with_trace_id("t2");

        assert_eq!(derived.source(), "sensor");
        assert_eq!(derived.trace_id(), Some("t2"));
        assert!(derived.cause_id().is_none());
        // `base` is unchanged
        assert_eq!(base.trace_id(), Some("t1"));
    }

    #[test]
    fn test_caused_by_and_payload() {
        let factory = EventFactory::new("sensor").with_trace_id("t1");
        let caused = factory.create_event_caused_by("reply", SemanticTier::Internal, "42");
        assert_eq!(caused.cause_id.as_deref(), Some("42"));
        assert_eq!(caused.trace_id.as_deref(), Some("t1"));

        let payload = json!({"message": "hi"}).as_object().cloned().unwrap_or_default();
        let event = factory.create_event_with_payload("note", SemanticTier::Ambient, payload);
        assert_eq!(event.payload_str("message"), Some("hi"));
    }
}
