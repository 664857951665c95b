// Copyright (c) 2026 ThinkOrbit Contributors
// SPDX-License-Identifier: AGPL-3.0

// Event Bus Implementation - Persistent Pub/Sub with Replay
//
// Every published event is written to the event repository first, then
// dispatched to the matching subscriptions in registration order.
// Stored history can be replayed to a single listener with a replay context,
// paging through the repository so large histories never load at once.

use crate::domain::events::{EventContext, EventFilter, EventListener, EventRecord, ReplayRange};
use crate::domain::repository::{EventQuery, EventRepository, PageRequest, RepositoryError};
use crate::infrastructure::metrics;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const DEFAULT_REPLAY_PAGE_SIZE: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

#[async_trait]
pub trait EventBus: Send + Sync {
    /// Persist and dispatch an event. Returns the persisted copy.
    async fn publish(&self, event: EventRecord) -> Result<EventRecord, EventBusError>;

    fn subscribe(
        &self,
        filter: Arc<dyn EventFilter>,
        listener: Arc<dyn EventListener>,
    ) -> Result<SubscriptionId, EventBusError>;

    fn unsubscribe(&self, id: SubscriptionId) -> bool;

    /// Deliver stored history inside `range` to `listener`. Returns the
    /// number of delivered events.
    async fn replay(&self, range: &ReplayRange, listener: &dyn EventListener) -> Result<u64, EventBusError>;

    fn close(&self);
}

struct Subscription {
    id: SubscriptionId,
    filter: Arc<dyn EventFilter>,
    listener: Arc<dyn EventListener>,
}

/// Event bus backed by an [`EventRepository`]
pub struct StandardEventBus {
    repository: Arc<dyn EventRepository>,
    subscriptions: RwLock<Vec<Subscription>>,
    next_subscription: AtomicU64,
    closed: AtomicBool,
    replay_page_size: usize,
}

impl StandardEventBus {
    pub fn new(repository: Arc<dyn EventRepository>) -> Self {
        Self::with_page_size(repository, DEFAULT_REPLAY_PAGE_SIZE)
    }

    pub fn with_page_size(repository: Arc<dyn EventRepository>, replay_page_size: usize) -> Self {
        Self {
            repository,
            subscriptions: RwLock::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
            closed: AtomicBool::new(false),
            replay_page_size: replay_page_size.max(1),
        }
    }

    /// Get the number of active subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.subscriptions.read().len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn repository(&self) -> &Arc<dyn EventRepository> {
        &self.repository
    }

    fn ensure_open(&self) -> Result<(), EventBusError> {
        if self.is_closed() {
            Err(EventBusError::Closed)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl EventBus for StandardEventBus {
    async fn publish(&self, event: EventRecord) -> Result<EventRecord, EventBusError> {
        self.ensure_open()?;

        let saved = self.repository.save(&event).await?;
        debug!(
            event_id = ?saved.id,
            event_type = %saved.event_type,
            source = %saved.source,
            "Publishing event"
        );
        metrics::record_event_published(&saved.event_type);

        // Snapshot so listeners may subscribe or unsubscribe while we dispatch
        let listeners: Vec<Arc<dyn EventListener>> = self
            .subscriptions
            .read()
            .iter()
            .filter(|s| s.filter.matches(&saved))
            .map(|s| s.listener.clone())
            .collect();

        if listeners.is_empty() {
            debug!("No subscribers listening to event {}", saved.event_type);
        }

        let context = EventContext::live();
        for listener in listeners {
            listener.on_event(&context, &saved).await;
        }

        Ok(saved)
    }

    fn subscribe(
        &self,
        filter: Arc<dyn EventFilter>,
        listener: Arc<dyn EventListener>,
    ) -> Result<SubscriptionId, EventBusError> {
        self.ensure_open()?;

        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::SeqCst));
        self.subscriptions.write().push(Subscription { id, filter, listener });
        info!(subscription = id.0, "Subscribed listener to event bus");
        Ok(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscriptions = self.subscriptions.write();
        let before = subscriptions.len();
        subscriptions.retain(|s| s.id != id);
        subscriptions.len() != before
    }

    async fn replay(&self, range: &ReplayRange, listener: &dyn EventListener) -> Result<u64, EventBusError> {
        self.ensure_open()?;

        let context = EventContext::replay(range.level);
        let query = EventQuery::from(range);
        let mut page = PageRequest::of(0, self.replay_page_size);
        let mut delivered = 0u64;

        info!(
            level = %range.level,
            from_event_id = ?range.from_event_id,
            from_time = ?range.from_time,
            "Starting event replay"
        );

        loop {
            let result = self.repository.find_page(&query, page).await?;
            for event in &result.events {
                listener.on_event(&context, event).await;
                delivered += 1;
            }
            if !result.has_next {
                break;
            }
            page = page.next();
        }

        metrics::record_events_replayed(delivered);
        info!(delivered, "Event replay finished");
        Ok(delivered)
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let dropped = {
            let mut subscriptions = self.subscriptions.write();
            let n = subscriptions.len();
            subscriptions.clear();
            n
        };
        if dropped > 0 {
            warn!("Event bus closed with {} active subscriptions", dropped);
        } else {
            info!("Event bus closed");
        }
    }
}

/// Event bus errors
#[derive(Debug, thiserror::Error)]
pub enum EventBusError {
    #[error("Event bus is closed")]
    Closed,

    #[error("Event repository error: {0}")]
    Repository(#[from] RepositoryError),
}
