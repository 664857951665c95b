// Copyright (c) 2026 ThinkOrbit Contributors
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Repository Interfaces
//!
//! Persistence contract for the event history. The interface lives in the
//! domain layer and is implemented in `crate::infrastructure::repositories`.
//!
//! | Trait | Record | Implementations |
//! |-------|--------|----------------|
//! | `EventRepository` | `EventRecord` | `InMemoryEventRepository`, `PostgresEventRepository` |
//!
//! ## Storage Backend Abstraction
//!
//! The implementation is selected at startup from `spec.database` in
//! `thinkorbit-config.yaml`: in-memory when no URL is configured, PostgreSQL
//! otherwise.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crate::domain::events::{EventId, EventRecord, ReplayRange};

/// Storage backend enum for pluggable persistence
#[derive(Debug, Clone)]
pub enum StorageBackend {
    InMemory,
    PostgreSQL(PostgresConfig),
}

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub connection_string: String,
    pub max_connections: u32,
}

/// Lower bounds for an event history scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventQuery {
    pub from_event_id: Option<EventId>,
    pub from_time: Option<DateTime<Utc>>,
}

impl EventQuery {
    pub fn matches(&self, event: &EventRecord) -> bool {
        if let Some(from_id) = self.from_event_id {
            match event.id {
                Some(id) if id >= from_id => {}
                _ => return false,
            }
        }
        if let Some(from_time) = self.from_time {
            if event.occurred_at < from_time {
                return false;
            }
        }
        true
    }
}

impl From<&ReplayRange> for EventQuery {
    fn from(range: &ReplayRange) -> Self {
        Self {
            from_event_id: range.from_event_id,
            from_time: range.from_time,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub size: usize,
}

impl PageRequest {
    pub fn of(page: usize, size: usize) -> Self {
        Self { page, size }
    }

    pub fn offset(&self) -> usize {
        self.page.saturating_mul(self.size)
    }

    /// Rows to fetch: the page plus one to detect a following page.
    pub fn fetch_limit(&self) -> usize {
        self.size.saturating_add(1)
    }

    pub fn next(&self) -> Self {
        Self {
            page: self.page.saturating_add(1),
            size: self.size,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EventPage {
    pub events: Vec<EventRecord>,
    pub has_next: bool,
}

/// Repository interface for the event history
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Persist a new event and return it with its assigned id
    async fn save(&self, event: &EventRecord) -> Result<EventRecord, RepositoryError>;

    /// Find one page of events matching the query, ordered by id ascending
    async fn find_page(&self, query: &EventQuery, page: PageRequest) -> Result<EventPage, RepositoryError>;

    /// Find a single event by id
    async fn find_by_id(&self, id: EventId) -> Result<Option<EventRecord>, RepositoryError>;

    /// Total number of stored events
    async fn count(&self) -> Result<u64, RepositoryError>;
}

/// Repository errors
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound("Row not found".to_string()),
            _ => RepositoryError::Database(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::ReplayLevel;
    use chrono::Duration;

    #[test]
    fn test_query_bounds_are_inclusive() {
        let now = Utc::now();
        let mut event = EventRecord::new("x", "test").with_occurred_at(now);
        event.id = Some(EventId(5));

        let query = EventQuery {
            from_event_id: Some(EventId(5)),
            from_time: Some(now),
        };
        assert!(query.matches(&event));

        let later = EventQuery {
            from_event_id: Some(EventId(6)),
            from_time: None,
        };
        assert!(!later.matches(&event));

        let future = EventQuery {
            from_event_id: None,
            from_time: Some(now + Duration::seconds(1)),
        };
        assert!(!future.matches(&event));
    }

    #[test]
    fn test_query_from_range() {
        let range = ReplayRange::new(Some(EventId(3)), None, ReplayLevel::FullReplay);
        let query = EventQuery::from(&range);
        assert_eq!(query.from_event_id, Some(EventId(3)));
        assert!(query.from_time.is_none());
    }

    #[test]
    fn test_page_request_offsets() {
        let page = PageRequest::of(0, 1000);
        assert_eq!(page.offset(), 0);
        assert_eq!(page.next().offset(), 1000);
        assert_eq!(page.fetch_limit(), 1001);

        let huge = PageRequest::of(usize::MAX, usize::MAX);
        assert_eq!(huge.offset(), usize::MAX);
        assert_eq!(huge.fetch_limit(), usize::MAX);
        assert_eq!(huge.next().page, usize::MAX);
    }
}
