// Copyright (c) 2026 ThinkOrbit Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Typed intents: a request for something to happen, routed to exactly one
//! handler by payload type.

use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Intent<T> {
    pub payload: T,
    pub trace_id: Option<String>,
}

impl<T> Intent<T> {
    pub fn new(payload: T) -> Self {
        Self {
            payload,
            trace_id: None,
        }
    }

    pub fn traced(payload: T, trace_id: impl Into<String>) -> Self {
        Self {
            payload,
            trace_id: Some(trace_id.into()),
        }
    }
}

#[async_trait]
pub trait IntentHandler<T: Send + 'static>: Send + Sync {
    async fn handle(&self, intent: Intent<T>) -> anyhow::Result<()>;
}
