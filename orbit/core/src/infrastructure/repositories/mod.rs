// Copyright (c) 2026 ThinkOrbit Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Repository Implementations
//!
//! Infrastructure implementations of the event history contract defined in
//! `crate::domain::repository`.
//!
//! - **PostgresEventRepository** - durable history in the `events` table
//! - **InMemoryEventRepository** - process-local history for development and tests

pub mod postgres_event;

pub use postgres_event::PostgresEventRepository;

use std::sync::{Arc, RwLock};
use async_trait::async_trait;
use crate::domain::events::{EventId, EventRecord};
use crate::domain::repository::{EventPage, EventQuery, EventRepository, PageRequest, RepositoryError};

#[derive(Default)]
struct InMemoryEventLog {
    next_id: i64,
    events: Vec<EventRecord>,
}

#[derive(Clone, Default)]
pub struct InMemoryEventRepository {
    log: Arc<RwLock<InMemoryEventLog>>,
}

impl InMemoryEventRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn save(&self, event: &EventRecord) -> Result<EventRecord, RepositoryError> {
        let mut log = self.log.write().map_err(|_| RepositoryError::Unknown("Lock poisoned".to_string()))?;
        log.next_id += 1;
        let mut saved = event.clone();
        saved.id = Some(EventId(log.next_id));
        log.events.push(saved.clone());
        Ok(saved)
    }

    async fn find_page(&self, query: &EventQuery, page: PageRequest) -> Result<EventPage, RepositoryError> {
        let log = self.log.read().map_err(|_| RepositoryError::Unknown("Lock poisoned".to_string()))?;
        // ids are assigned in insertion order, so the log is already sorted
        let mut events: Vec<EventRecord> = log
            .events
            .iter()
            .filter(|e| query.matches(e))
            .skip(page.offset())
            .take(page.fetch_limit())
            .cloned()
            .collect();
        let has_next = events.len() > page.size;
        events.truncate(page.size);
        Ok(EventPage { events, has_next })
    }

    async fn find_by_id(&self, id: EventId) -> Result<Option<EventRecord>, RepositoryError> {
        let log = self.log.read().map_err(|_| RepositoryError::Unknown("Lock poisoned".to_string()))?;
        Ok(log.events.iter().find(|e| e.id == Some(id)).cloned())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let log = self.log.read().map_err(|_| RepositoryError::Unknown("Lock poisoned".to_string()))?;
        Ok(log.events.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_save_assigns_increasing_ids() {
        let repo = InMemoryEventRepository::new();
        let first = repo.save(&EventRecord::new("a", "test")).await.unwrap();
        let second = repo.save(&EventRecord::new("b", "test")).await.unwrap();

        assert_eq!(first.id, Some(EventId(1)));
        assert_eq!(second.id, Some(EventId(2)));
        assert_eq!(repo.count().await.unwrap(), 2);
        assert_eq!(repo.find_by_id(EventId(2)).await.unwrap().unwrap().event_type, "b");
        assert!(repo.find_by_id(EventId(9)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_paging_sets_has_next() {
        let repo = InMemoryEventRepository::new();
        for i in 0..5 {
            repo.save(&EventRecord::new(format!("e{}", i), "test")).await.unwrap();
        }

        let query = EventQuery::default();
        let first = repo.find_page(&query, PageRequest::of(0, 2)).await.unwrap();
        assert_eq!(first.events.len(), 2);
        assert!(first.has_next);

        let last = repo.find_page(&query, PageRequest::of(2, 2)).await.unwrap();
        assert_eq!(last.events.len(), 1);
        assert_eq!(last.events[0].event_type, "e4");
        assert!(!last.has_next);
    }

    #[tokio::test]
    async fn test_huge_page_values_do_not_overflow() {
        let repo = InMemoryEventRepository::new();
        repo.save(&EventRecord::new("only", "test")).await.unwrap();
        let query = EventQuery::default();

        let all = repo.find_page(&query, PageRequest::of(0, usize::MAX)).await.unwrap();
        assert_eq!(all.events.len(), 1);
        assert!(!all.has_next);

        let beyond = repo.find_page(&query, PageRequest::of(usize::MAX, usize::MAX)).await.unwrap();
        assert!(beyond.events.is_empty());
        assert!(!beyond.has_next);
    }

    #[tokio::test]
    async fn test_query_filters_by_id_and_time() {
        let repo = InMemoryEventRepository::new();
        let old = Utc::now() - Duration::hours(1);
        repo.save(&EventRecord::new("old", "test").with_occurred_at(old)).await.unwrap();
        repo.save(&EventRecord::new("new", "test")).await.unwrap();
        repo.save(&EventRecord::new("newer", "test")).await.unwrap();

        let recent = EventQuery {
            from_event_id: None,
            from_time: Some(Utc::now() - Duration::minutes(1)),
        };
        let page = repo.find_page(&recent, PageRequest::of(0, 10)).await.unwrap();
        assert_eq!(page.events.len(), 2);

        let from_three = EventQuery {
            from_event_id: Some(EventId(3)),
            from_time: None,
        };
        let page = repo.find_page(&from_three, PageRequest::of(0, 10)).await.unwrap();
        assert_eq!(page.events.len(), 1);
        assert_eq!(page.events[0].event_type, "newer");
    }
}
